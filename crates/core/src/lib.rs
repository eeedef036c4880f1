//! Domain logic shared across the tunecast crates.
//!
//! This crate has no dependencies on the other workspace members so the
//! database layer, the upstream API clients, and the server can all build
//! on it.

pub mod crypto;
pub mod login_state;
pub mod playback;
pub mod rate_limit;
pub mod types;
pub mod webhook;
