//! Telegram webhook endpoint.

use axum::extract::State;
use axum::Json;
use serde_json::json;
use tunecast_telegram::types::Update;

use crate::bot::dispatch;
use crate::middleware::webhook_secret::WebhookSecret;
use crate::state::AppState;

/// POST {TELEGRAM_WEBHOOK_PATH} - receive one update from Telegram.
///
/// Once the secret checks out the response is always 200: Telegram
/// redelivers on any other status, and redelivering an update whose
/// handling failed midway would repeat side effects (messages sent,
/// tracks queued). Failures are logged and the update is dropped.
pub async fn receive_update(
    State(state): State<AppState>,
    _secret: WebhookSecret,
    Json(update): Json<Update>,
) -> Json<serde_json::Value> {
    let update_id = update.update_id;
    if let Err(e) = dispatch::dispatch_update(&state, update).await {
        tracing::error!(update_id, error = %e, "Update handling failed");
    }
    Json(json!({ "ok": true }))
}
