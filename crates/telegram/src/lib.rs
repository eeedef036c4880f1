//! Telegram Bot API client, update types, and inline result builders.

pub mod client;
pub mod error;
pub mod inline;
pub mod types;

pub use client::BotApi;
pub use error::TelegramError;
