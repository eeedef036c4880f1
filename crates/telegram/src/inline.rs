//! Builders for inline query result cards.

use tunecast_core::playback::NowPlaying;
use uuid::Uuid;

use crate::types::{
    InlineKeyboardButton, InlineKeyboardMarkup, InlineQueryResultArticle,
    InlineQueryResultsButton, InputTextMessageContent,
};

/// Callback data prefix for "Add to queue" buttons; the track id follows.
pub const QUEUE_CALLBACK_PREFIX: &str = "queue;";

/// Escape text for inclusion in HTML message bodies and attributes.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// Card for the track the user is listening to right now.
pub fn now_playing_article(now: &NowPlaying) -> InlineQueryResultArticle {
    let message_text = format!(
        "🎵 <a href=\"{}\">{}</a> by {}",
        escape_html(&now.track_url),
        escape_html(&now.title),
        escape_html(&now.artist),
    );

    InlineQueryResultArticle {
        result_type: "article".to_string(),
        id: Uuid::new_v4().to_string(),
        title: format!("{} - {}", now.artist, now.title),
        input_message_content: InputTextMessageContent {
            message_text,
            parse_mode: Some("HTML".to_string()),
        },
        reply_markup: Some(InlineKeyboardMarkup {
            inline_keyboard: vec![vec![
                InlineKeyboardButton::url("Open in Spotify", &now.track_url),
                InlineKeyboardButton::callback(
                    "Add to queue",
                    &format!("{QUEUE_CALLBACK_PREFIX}{}", now.track_id),
                ),
            ]],
        }),
        url: Some(now.track_url.clone()),
        description: now.album.clone(),
        thumbnail_url: now.thumbnail_url.clone(),
    }
}

/// Card shown when the user has no active playback.
pub fn not_playing_article() -> InlineQueryResultArticle {
    InlineQueryResultArticle {
        result_type: "article".to_string(),
        id: Uuid::new_v4().to_string(),
        title: "Nothing is playing".to_string(),
        input_message_content: InputTextMessageContent {
            message_text: "🎵 Nothing is playing right now.".to_string(),
            parse_mode: None,
        },
        reply_markup: None,
        url: None,
        description: Some("Play something on Spotify and try again.".to_string()),
        thumbnail_url: None,
    }
}

/// Card shown when Spotify could not be reached in time.
pub fn unavailable_article() -> InlineQueryResultArticle {
    InlineQueryResultArticle {
        result_type: "article".to_string(),
        id: Uuid::new_v4().to_string(),
        title: "Can't fetch your track right now".to_string(),
        input_message_content: InputTextMessageContent {
            message_text: "Couldn't reach Spotify right now. Please try again."
                .to_string(),
            parse_mode: None,
        },
        reply_markup: None,
        url: None,
        description: Some("Please try again in a moment.".to_string()),
        thumbnail_url: None,
    }
}

/// Button shown above inline results when the user must (re)link Spotify.
/// Tapping it opens a private chat with `/start login`.
pub fn login_button() -> InlineQueryResultsButton {
    InlineQueryResultsButton {
        text: "Login with Spotify".to_string(),
        start_parameter: Some("login".to_string()),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
