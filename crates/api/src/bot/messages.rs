//! Every user-facing text the bot sends.

use std::time::Duration;

use tunecast_telegram::types::InlineQueryResultsButton;

pub const START_MESSAGE: &str =
    "Welcome! Tap the button below to log in with your Spotify account.";

pub const LOGOUT_DONE: &str = "✅ Successfully logged out! Your Spotify account has been \
                               disconnected.\n\nUse /start to log in again.";

pub const LOGOUT_NOT_LINKED: &str = "You are not currently logged in with Spotify.\n\nUse /start \
                                     to log in with your Spotify account.";

pub const QUEUE_ADDED: &str = "Added to your queue!";
pub const QUEUE_NEEDS_LOGIN: &str = "Please log in with Spotify first!";
pub const QUEUE_SESSION_EXPIRED: &str = "Your Spotify session expired. Please log in again.";
pub const GENERIC_ERROR: &str = "An error occurred. Please try again.";

/// How to trigger the inline card, shown after login and in /help.
pub fn inline_mode_instructions(bot_username: &str) -> String {
    format!(
        "Use inline mode to share your currently playing Spotify track! \
         Just type @{bot_username} (followed by a space) in any chat."
    )
}

/// Sent to the user's private chat once the OAuth callback lands.
pub fn welcome_message(bot_username: &str) -> String {
    format!(
        "✅ Successfully logged in with Spotify!\n\n{}",
        inline_mode_instructions(bot_username)
    )
}

/// The /help text. HTML formatted.
pub fn help_message(bot_username: &str) -> String {
    format!(
        "<b>How to use {bot_username}:</b>\n\
         \n\
         1️⃣ <b>Login with Spotify</b>\n\
         Use the button below to connect your Spotify account.\n\
         \n\
         2️⃣ <b>Share what you're playing</b>\n\
         Type @{bot_username} (followed by a space) in any chat to share your currently playing \
         track!\n\
         \n\
         3️⃣ <b>Add tracks to queue</b>\n\
         Others can add the shared track to their queue by tapping the 'Add to queue' button.\n\
         \n\
         <b>Commands:</b>\n\
         /help - Show this help message\n\
         /logout - Disconnect your Spotify account"
    )
}

/// Map a player-API error message to the short text shown in the callback
/// alert. Matching is substring-based on the lowercased upstream message
/// because the player wraps the same conditions in varying phrasings.
pub fn queue_error_message(upstream_message: &str) -> &'static str {
    let lowered = upstream_message.to_lowercase();
    if lowered.contains("no active device") {
        "No active device found"
    } else if lowered.contains("restricted device") || lowered.contains("not supported") {
        "Your device is not supported"
    } else if lowered.contains("premium") {
        "This requires Spotify Premium"
    } else {
        "An error occurred"
    }
}

pub fn rate_limited_command(retry_after: Duration) -> String {
    format!(
        "⏱️ You're sending commands too quickly. Please wait {} seconds and try again.",
        retry_seconds(retry_after)
    )
}

pub fn rate_limited_callback(retry_after: Duration) -> String {
    format!(
        "⏱️ Please slow down. Try again in {} seconds.",
        retry_seconds(retry_after)
    )
}

/// Results button shown instead of a card when inline queries are rate
/// limited.
pub fn rate_limited_inline_button(retry_after: Duration) -> InlineQueryResultsButton {
    InlineQueryResultsButton {
        text: format!("⏱️ Too many requests, wait {}s", retry_seconds(retry_after)),
        start_parameter: Some("rate_limit".to_string()),
    }
}

/// Seconds to tell the user to wait: the remaining window rounded up, so
/// the advice is never an undershoot.
fn retry_seconds(retry_after: Duration) -> u64 {
    retry_after.as_secs() + 1
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
