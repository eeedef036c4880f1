//! Route registration.

pub mod health;

use axum::routing::{get, post};
use axum::Router;

use crate::config::AppConfig;
use crate::handlers;
use crate::state::AppState;

/// Build the public route tree.
///
/// ```text
/// GET  /health                    service and database health
/// POST {TELEGRAM_WEBHOOK_PATH}    update delivery (secret-guarded)
/// GET  {SPOTIFY_CALLBACK_PATH}    OAuth redirect target
/// ```
///
/// The webhook and callback paths come from configuration because they
/// are registered externally, with Telegram and Spotify respectively.
pub fn router(config: &AppConfig) -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .route(
            &config.telegram.webhook_path,
            post(handlers::webhook::receive_update),
        )
        .route(
            &config.spotify.callback_path,
            get(handlers::oauth::spotify_callback),
        )
}
