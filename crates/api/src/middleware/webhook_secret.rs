//! Shared-secret guard for the Telegram webhook route.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::StatusCode;
use tunecast_core::webhook::verify_secret;

use crate::state::AppState;

/// Header Telegram echoes the registered secret back in.
pub const SECRET_HEADER: &str = "x-telegram-bot-api-secret-token";

/// Extractor proving the request carried the registered webhook secret.
///
/// Rejections are a bare 401 with an empty body: the response must not
/// reveal whether the header was missing, malformed, or merely wrong.
pub struct WebhookSecret;

impl FromRequestParts<AppState> for WebhookSecret {
    type Rejection = StatusCode;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let provided = parts
            .headers
            .get(SECRET_HEADER)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default();

        if !verify_secret(provided, &state.config.telegram.webhook_secret) {
            tracing::warn!("Webhook delivery rejected: bad or missing secret token");
            return Err(StatusCode::UNAUTHORIZED);
        }

        Ok(WebhookSecret)
    }
}
