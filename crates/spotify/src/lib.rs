//! Spotify Web API clients.
//!
//! Two halves with separate base URLs: [`auth::AccountsApi`] talks to the
//! accounts service (authorization URL, code exchange, token refresh) and
//! [`player::PlayerApi`] talks to the player endpoints (currently playing,
//! add to queue).

pub mod auth;
pub mod error;
pub mod models;
pub mod player;

pub use auth::AccountsApi;
pub use error::SpotifyError;
pub use player::PlayerApi;
