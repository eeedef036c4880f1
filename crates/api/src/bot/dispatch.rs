//! Entry point routing one Telegram update to its handler.

use tunecast_telegram::types::Update;
use tunecast_telegram::TelegramError;

use crate::bot::{callback, commands, inline};
use crate::state::AppState;

/// Route an update to exactly one branch.
///
/// Errors surfacing here are Telegram delivery failures; domain failures
/// (upstream errors, missing credentials) have already been answered to
/// the user inside the branch handlers.
pub async fn dispatch_update(state: &AppState, update: Update) -> Result<(), TelegramError> {
    if let Some(message) = update.message {
        commands::handle_message(state, message).await
    } else if let Some(query) = update.inline_query {
        inline::handle_inline_query(state, query).await
    } else if let Some(query) = update.callback_query {
        callback::handle_callback_query(state, query).await
    } else {
        // setWebhook restricts the update kinds Telegram sends, but an
        // already-queued delivery can still carry an older kind.
        tracing::debug!(update_id = update.update_id, "Ignoring unsupported update kind");
        Ok(())
    }
}
