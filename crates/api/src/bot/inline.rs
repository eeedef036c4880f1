//! Inline query fulfillment: fetch the live track and answer in time.

use std::time::Duration;

use tunecast_core::playback::NowPlaying;
use tunecast_core::rate_limit::{LimitKind, RateDecision};
use tunecast_core::types::UserId;
use tunecast_spotify::SpotifyError;
use tunecast_telegram::inline::{
    login_button, not_playing_article, now_playing_article, unavailable_article,
};
use tunecast_telegram::types::{InlineQuery, InlineQueryResultArticle, InlineQueryResultsButton};
use tunecast_telegram::TelegramError;

use crate::auth::refresher::RefreshError;
use crate::bot::messages;
use crate::state::AppState;

/// Telegram abandons an inline query after roughly ten seconds. The fetch
/// chain gets a bit less so the answer call itself still fits inside the
/// window.
const FETCH_DEADLINE: Duration = Duration::from_secs(8);

/// Why the live track could not be fetched.
enum FetchFailure {
    /// No usable credential; the user must (re)link.
    NeedsLogin,
    /// Upstream or storage trouble worth retrying later.
    Unavailable,
}

pub async fn handle_inline_query(state: &AppState, query: InlineQuery) -> Result<(), TelegramError> {
    if let RateDecision::Limited { retry_after } =
        state.rate_limiter.check(query.from.id, LimitKind::InlineQuery)
    {
        let button = messages::rate_limited_inline_button(retry_after);
        return answer(state, &query.id, &[], Some(&button)).await;
    }

    let outcome =
        tokio::time::timeout(FETCH_DEADLINE, fetch_now_playing(state, query.from.id)).await;

    match outcome {
        Ok(Ok(Some(now))) => answer(state, &query.id, &[now_playing_article(&now)], None).await,
        Ok(Ok(None)) => answer(state, &query.id, &[not_playing_article()], None).await,
        Ok(Err(FetchFailure::NeedsLogin)) => {
            answer(state, &query.id, &[], Some(&login_button())).await
        }
        Ok(Err(FetchFailure::Unavailable)) => {
            answer(state, &query.id, &[unavailable_article()], None).await
        }
        Err(_) => {
            tracing::warn!(user_id = query.from.id, "Inline fetch missed the deadline");
            answer(state, &query.id, &[unavailable_article()], None).await
        }
    }
}

/// Resolve a valid token and read the player. A token rejected despite a
/// fresh stored expiry gets one forced refresh and one retry.
async fn fetch_now_playing(
    state: &AppState,
    user_id: UserId,
) -> Result<Option<NowPlaying>, FetchFailure> {
    let token = state
        .refresher
        .ensure_valid(user_id)
        .await
        .map_err(|e| refresh_failure(user_id, e))?;

    match state.player.currently_playing(&token).await {
        Ok(now) => Ok(now),
        Err(SpotifyError::Unauthorized) => {
            let token = state
                .refresher
                .force_refresh(user_id, &token)
                .await
                .map_err(|e| refresh_failure(user_id, e))?;
            match state.player.currently_playing(&token).await {
                Ok(now) => Ok(now),
                Err(SpotifyError::Unauthorized) => {
                    tracing::warn!(user_id, "Access token rejected even after forced refresh");
                    Err(FetchFailure::NeedsLogin)
                }
                Err(e) => Err(player_failure(user_id, e)),
            }
        }
        Err(e) => Err(player_failure(user_id, e)),
    }
}

fn refresh_failure(user_id: UserId, error: RefreshError) -> FetchFailure {
    match error {
        RefreshError::NotLinked => FetchFailure::NeedsLogin,
        RefreshError::ReauthRequired => FetchFailure::NeedsLogin,
        RefreshError::Upstream(e) => {
            tracing::warn!(user_id, error = %e, "Token refresh unavailable");
            FetchFailure::Unavailable
        }
        RefreshError::Vault(e) => {
            tracing::error!(user_id, error = %e, "Vault failure during inline query");
            FetchFailure::Unavailable
        }
    }
}

fn player_failure(user_id: UserId, error: SpotifyError) -> FetchFailure {
    tracing::warn!(user_id, error = %error, "Currently-playing fetch failed");
    FetchFailure::Unavailable
}

/// Answer the query, tolerating expiry: a query Telegram has already
/// abandoned is not worth surfacing as an error.
async fn answer(
    state: &AppState,
    query_id: &str,
    results: &[InlineQueryResultArticle],
    button: Option<&InlineQueryResultsButton>,
) -> Result<(), TelegramError> {
    match state.bot.answer_inline_query(query_id, results, button).await {
        Err(TelegramError::Api { ref description, .. })
            if description.contains("query is too old") =>
        {
            tracing::debug!(query_id, "Inline query expired before the answer was sent");
            Ok(())
        }
        other => other,
    }
}
