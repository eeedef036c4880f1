//! Callback-query handling for the "Add to queue" button.

use tunecast_core::rate_limit::{LimitKind, RateDecision};
use tunecast_core::types::UserId;
use tunecast_spotify::SpotifyError;
use tunecast_telegram::inline::QUEUE_CALLBACK_PREFIX;
use tunecast_telegram::types::CallbackQuery;
use tunecast_telegram::TelegramError;

use crate::auth::refresher::RefreshError;
use crate::bot::messages;
use crate::state::AppState;

/// Why a queue add did not go through, mapped to the alert shown to the
/// tapping user (who need not be the user who shared the track).
enum QueueFailure {
    NeedsLogin,
    SessionExpired,
    /// Player rejected the add; carries the short user-facing text.
    Rejected(&'static str),
    Other,
}

pub async fn handle_callback_query(
    state: &AppState,
    query: CallbackQuery,
) -> Result<(), TelegramError> {
    if let RateDecision::Limited { retry_after } =
        state.rate_limiter.check(query.from.id, LimitKind::CallbackQuery)
    {
        let text = messages::rate_limited_callback(retry_after);
        return state.bot.answer_callback_query(&query.id, &text, true).await;
    }

    let track_id = match query.data.as_deref().and_then(parse_queue_data) {
        Some(track_id) => track_id,
        None => {
            tracing::debug!("Ignoring callback query with unrecognized data");
            // Answer anyway so the client stops showing a spinner.
            return state.bot.answer_callback_query(&query.id, "", false).await;
        }
    };

    match queue_track(state, query.from.id, track_id).await {
        Ok(()) => {
            state
                .bot
                .answer_callback_query(&query.id, messages::QUEUE_ADDED, false)
                .await
        }
        Err(QueueFailure::NeedsLogin) => {
            state
                .bot
                .answer_callback_query(&query.id, messages::QUEUE_NEEDS_LOGIN, true)
                .await
        }
        Err(QueueFailure::SessionExpired) => {
            state
                .bot
                .answer_callback_query(&query.id, messages::QUEUE_SESSION_EXPIRED, true)
                .await
        }
        Err(QueueFailure::Rejected(text)) => {
            state.bot.answer_callback_query(&query.id, text, true).await
        }
        Err(QueueFailure::Other) => {
            state
                .bot
                .answer_callback_query(&query.id, messages::GENERIC_ERROR, true)
                .await
        }
    }
}

fn parse_queue_data(data: &str) -> Option<&str> {
    data.strip_prefix(QUEUE_CALLBACK_PREFIX)
        .filter(|track_id| !track_id.is_empty())
}

/// Add the track to the tapping user's queue, refreshing once on a 401.
async fn queue_track(
    state: &AppState,
    user_id: UserId,
    track_id: &str,
) -> Result<(), QueueFailure> {
    let token = state
        .refresher
        .ensure_valid(user_id)
        .await
        .map_err(|e| refresh_failure(user_id, e))?;

    match state.player.add_to_queue(&token, track_id).await {
        Ok(()) => Ok(()),
        Err(SpotifyError::Unauthorized) => {
            let token = state
                .refresher
                .force_refresh(user_id, &token)
                .await
                .map_err(|e| refresh_failure(user_id, e))?;
            match state.player.add_to_queue(&token, track_id).await {
                Ok(()) => Ok(()),
                Err(SpotifyError::Unauthorized) => Err(QueueFailure::SessionExpired),
                Err(e) => Err(player_failure(user_id, e)),
            }
        }
        Err(e) => Err(player_failure(user_id, e)),
    }
}

fn refresh_failure(user_id: UserId, error: RefreshError) -> QueueFailure {
    match error {
        RefreshError::NotLinked => QueueFailure::NeedsLogin,
        RefreshError::ReauthRequired => QueueFailure::SessionExpired,
        RefreshError::Upstream(e) => {
            tracing::warn!(user_id, error = %e, "Token refresh unavailable");
            QueueFailure::Other
        }
        RefreshError::Vault(e) => {
            tracing::error!(user_id, error = %e, "Vault failure during queue add");
            QueueFailure::Other
        }
    }
}

fn player_failure(user_id: UserId, error: SpotifyError) -> QueueFailure {
    match error {
        SpotifyError::Api { message, .. } => {
            tracing::warn!(user_id, upstream_message = %message, "Queue add rejected");
            QueueFailure::Rejected(messages::queue_error_message(&message))
        }
        e => {
            tracing::warn!(user_id, error = %e, "Queue add failed");
            QueueFailure::Other
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::parse_queue_data;

    #[test]
    fn queue_data_parses_the_track_id() {
        assert_eq!(
            parse_queue_data("queue;4uLU6hMCjMI75M1A2tKUQC"),
            Some("4uLU6hMCjMI75M1A2tKUQC")
        );
    }

    #[test]
    fn unrecognized_data_is_rejected() {
        assert_eq!(parse_queue_data("queue;"), None);
        assert_eq!(parse_queue_data("share;abc"), None);
        assert_eq!(parse_queue_data(""), None);
    }
}
