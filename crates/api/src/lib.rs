//! Tunecast HTTP server.
//!
//! Serves the Telegram webhook and the Spotify OAuth callback, and owns
//! every service behind them: the credential vault, the token refresher,
//! the linking flow, and the per-user rate limiter.

pub mod auth;
pub mod background;
pub mod bot;
pub mod config;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod state;
