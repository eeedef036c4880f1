//! Chat command handlers: /start, /help, and /logout.

use tunecast_core::rate_limit::{LimitKind, RateDecision};
use tunecast_telegram::types::{InlineKeyboardButton, InlineKeyboardMarkup, Message};
use tunecast_telegram::TelegramError;

use crate::bot::messages;
use crate::state::AppState;

pub async fn handle_message(state: &AppState, message: Message) -> Result<(), TelegramError> {
    let Some(user) = message.from.as_ref() else {
        tracing::debug!(message_id = message.message_id, "Message without a sender");
        return Ok(());
    };
    let user_id = user.id;
    let chat_id = message.chat.id;

    // Non-text messages (stickers, photos) and plain chatter are ignored.
    let Some(command) = message.text.as_deref().and_then(parse_command) else {
        return Ok(());
    };

    if let RateDecision::Limited { retry_after } =
        state.rate_limiter.check(user_id, LimitKind::Command)
    {
        let text = messages::rate_limited_command(retry_after);
        return state.bot.send_message(chat_id, &text, None).await;
    }

    match command {
        "start" => {
            send_with_login_button(state, chat_id, user_id, messages::START_MESSAGE.to_string())
                .await
        }
        "help" => {
            let text = messages::help_message(&state.bot_username);
            send_with_login_button(state, chat_id, user_id, text).await
        }
        "logout" => logout(state, chat_id, user_id).await,
        other => {
            tracing::debug!(command = other, "Ignoring unknown command");
            Ok(())
        }
    }
}

/// Extract the command name from text like `/start@SomeBot args`, if the
/// text is a command at all.
fn parse_command(text: &str) -> Option<&str> {
    let first = text.split_whitespace().next()?;
    let command = first.strip_prefix('/')?;
    command.split('@').next()
}

/// Send a message with a freshly minted login button beneath it.
async fn send_with_login_button(
    state: &AppState,
    chat_id: i64,
    user_id: i64,
    text: String,
) -> Result<(), TelegramError> {
    let authorize_url = state.linking.begin(user_id).await;
    let markup = InlineKeyboardMarkup {
        inline_keyboard: vec![vec![InlineKeyboardButton::url(
            "Login with Spotify",
            &authorize_url,
        )]],
    };
    state.bot.send_message(chat_id, &text, Some(&markup)).await
}

async fn logout(state: &AppState, chat_id: i64, user_id: i64) -> Result<(), TelegramError> {
    match state.vault.delete(user_id).await {
        Ok(true) => {
            tracing::info!(user_id, "Spotify account unlinked");
            state
                .bot
                .send_message(chat_id, messages::LOGOUT_DONE, None)
                .await
        }
        Ok(false) => {
            state
                .bot
                .send_message(chat_id, messages::LOGOUT_NOT_LINKED, None)
                .await
        }
        Err(e) => {
            tracing::error!(user_id, error = %e, "Logout failed");
            state
                .bot
                .send_message(chat_id, messages::GENERIC_ERROR, None)
                .await
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
