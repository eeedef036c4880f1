//! Telegram update handling.
//!
//! [`dispatch`] routes each incoming update to exactly one of the
//! submodules: [`commands`] for chat messages, [`inline`] for inline
//! queries, and [`callback`] for button taps. [`messages`] holds every
//! user-facing text in one place.

pub mod callback;
pub mod commands;
pub mod dispatch;
pub mod inline;
pub mod messages;
