//! Spotify OAuth callback endpoint.

use axum::extract::{Query, State};
use axum::response::Redirect;
use serde::Deserialize;

use crate::bot::messages;
use crate::state::AppState;

/// Query parameters Spotify appends to the redirect. `code` and `state`
/// arrive on success; `error` replaces `code` when the user denied
/// consent.
#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// GET {SPOTIFY_CALLBACK_PATH} - complete the account-linking flow.
///
/// The response is always a redirect back into Telegram, whatever
/// happened: the browser tab is a detour the user wants closed, and the
/// outcome is reported in the bot chat instead. Failures never echo
/// request parameters back to the browser.
pub async fn spotify_callback(
    State(state): State<AppState>,
    Query(params): Query<CallbackParams>,
) -> Redirect {
    let back_to_bot = Redirect::to(&format!("https://t.me/{}", state.bot_username));

    if let Some(error) = params.error {
        tracing::warn!(%error, "Authorization denied or failed at Spotify");
        return back_to_bot;
    }

    let (Some(code), Some(login_state)) = (params.code, params.state) else {
        tracing::warn!("Callback missing code or state parameter");
        return back_to_bot;
    };

    match state.linking.complete(&login_state, &code).await {
        Ok(user_id) => {
            // A failed welcome message does not undo a successful link.
            let text = messages::welcome_message(&state.bot_username);
            if let Err(e) = state.bot.send_message(user_id, &text, None).await {
                tracing::error!(user_id, error = %e, "Failed to send welcome message");
            }
        }
        Err(e) => {
            tracing::warn!(error = %e, "Account linking failed");
        }
    }

    back_to_bot
}
