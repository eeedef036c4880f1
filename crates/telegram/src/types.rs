//! Bot API wire types.
//!
//! Inbound types cover only the update kinds this bot subscribes to
//! (messages, inline queries, callback queries); everything else in an
//! update is ignored by serde. Outbound types serialize exactly the JSON
//! the Bot API expects, with absent optionals omitted.

use serde::{Deserialize, Serialize};
use tunecast_core::types::UserId;

// ---------------------------------------------------------------------------
// Inbound updates
// ---------------------------------------------------------------------------

/// An update delivered to the webhook. Exactly one of the payload fields
/// is set per update.
#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Message>,
    #[serde(default)]
    pub inline_query: Option<InlineQuery>,
    #[serde(default)]
    pub callback_query: Option<CallbackQuery>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: UserId,
    #[serde(default)]
    pub is_bot: bool,
    pub first_name: String,
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    #[serde(default)]
    pub from: Option<User>,
    pub chat: Chat,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InlineQuery {
    pub id: String,
    pub from: User,
    pub query: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    pub from: User,
    #[serde(default)]
    pub data: Option<String>,
}

/// The bot's own identity, from `getMe`.
#[derive(Debug, Clone, Deserialize)]
pub struct BotUser {
    pub id: UserId,
    pub first_name: String,
    #[serde(default)]
    pub username: Option<String>,
}

// ---------------------------------------------------------------------------
// Outbound payloads
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct InlineKeyboardMarkup {
    pub inline_keyboard: Vec<Vec<InlineKeyboardButton>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct InlineKeyboardButton {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callback_data: Option<String>,
}

impl InlineKeyboardButton {
    /// A button that opens a URL.
    pub fn url(text: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            url: Some(url.into()),
            callback_data: None,
        }
    }

    /// A button that sends a callback query back to the bot.
    pub fn callback(text: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            url: None,
            callback_data: Some(data.into()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct InputTextMessageContent {
    pub message_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse_mode: Option<String>,
}

/// An `article` inline result: a tappable card that sends a text message.
#[derive(Debug, Clone, Serialize)]
pub struct InlineQueryResultArticle {
    #[serde(rename = "type")]
    pub result_type: String,
    /// Unique within the answer; fresh per response.
    pub id: String,
    pub title: String,
    pub input_message_content: InputTextMessageContent,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<InlineKeyboardMarkup>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
}

/// The button shown above inline results, used to route unlinked users to
/// the bot's private chat.
#[derive(Debug, Clone, Serialize)]
pub struct InlineQueryResultsButton {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_parameter: Option<String>,
}

/// One entry of the bot's command menu.
#[derive(Debug, Clone, Serialize)]
pub struct BotCommand {
    pub command: String,
    pub description: String,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Update {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn message_update_decodes_with_extra_fields_ignored() {
        let update = parse(
            r#"{
                "update_id": 10000,
                "message": {
                    "message_id": 1365,
                    "from": {
                        "id": 1111,
                        "is_bot": false,
                        "first_name": "Nick",
                        "username": "nick",
                        "language_code": "en"
                    },
                    "chat": {"id": 1111, "first_name": "Nick", "type": "private"},
                    "date": 1441645532,
                    "text": "/start",
                    "entities": [{"offset": 0, "length": 6, "type": "bot_command"}]
                }
            }"#,
        );

        assert_eq!(update.update_id, 10000);
        let message = update.message.expect("message update");
        assert_eq!(message.chat.id, 1111);
        assert_eq!(message.text.as_deref(), Some("/start"));
        let from = message.from.expect("sender");
        assert_eq!(from.id, 1111);
        assert!(!from.is_bot);
        assert!(update.inline_query.is_none());
        assert!(update.callback_query.is_none());
    }

    #[test]
    fn channel_style_message_without_sender_decodes() {
        let update = parse(
            r#"{
                "update_id": 10001,
                "message": {
                    "message_id": 2,
                    "chat": {"id": -100200300, "type": "channel"},
                    "date": 1441645600
                }
            }"#,
        );

        let message = update.message.expect("message update");
        assert!(message.from.is_none());
        assert!(message.text.is_none());
    }

    #[test]
    fn inline_query_update_decodes() {
        let update = parse(
            r#"{
                "update_id": 10002,
                "inline_query": {
                    "id": "134567890097",
                    "from": {"id": 22, "is_bot": false, "first_name": "A"},
                    "query": "",
                    "offset": ""
                }
            }"#,
        );

        let query = update.inline_query.expect("inline query update");
        assert_eq!(query.id, "134567890097");
        assert_eq!(query.from.id, 22);
        assert_eq!(query.query, "");
    }

    #[test]
    fn callback_query_update_decodes() {
        let update = parse(
            r#"{
                "update_id": 10003,
                "callback_query": {
                    "id": "4382bfdwdsb323b2d9",
                    "from": {"id": 33, "is_bot": false, "first_name": "B"},
                    "chat_instance": "-63194redacted",
                    "data": "queue;4uLU6hMCjMI75M1A2tKUQC"
                }
            }"#,
        );

        let query = update.callback_query.expect("callback query update");
        assert_eq!(query.data.as_deref(), Some("queue;4uLU6hMCjMI75M1A2tKUQC"));
    }

    #[test]
    fn unsubscribed_update_kind_decodes_with_no_payload() {
        let update = parse(
            r#"{
                "update_id": 10004,
                "my_chat_member": {"chat": {"id": 5, "type": "private"}}
            }"#,
        );

        assert!(update.message.is_none());
        assert!(update.inline_query.is_none());
        assert!(update.callback_query.is_none());
    }
}
