//! HTTP client for the Telegram Bot API.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::json;

use crate::error::TelegramError;
use crate::types::{
    BotCommand, BotUser, InlineKeyboardMarkup, InlineQueryResultArticle,
    InlineQueryResultsButton,
};

/// Base URL of the Bot API.
const API_BASE_URL: &str = "https://api.telegram.org";

/// HTTP request timeout for a single Bot API call.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Envelope wrapping every Bot API response.
#[derive(Debug, serde::Deserialize)]
#[serde(bound(deserialize = "T: serde::de::Deserialize<'de>"))]
struct ApiEnvelope<T> {
    ok: bool,
    #[serde(default)]
    result: Option<T>,
    #[serde(default)]
    error_code: Option<i64>,
    #[serde(default)]
    description: Option<String>,
}

/// Bot API client bound to one bot token.
///
/// The token becomes part of every request URL and must never be logged;
/// keep instances out of `Debug` output.
pub struct BotApi {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl BotApi {
    pub fn new(bot_token: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to build reqwest HTTP client");
        Self::with_client(client, bot_token)
    }

    /// Create a client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, bot_token: &str) -> Self {
        Self {
            client,
            base_url: API_BASE_URL.to_string(),
            token: bot_token.to_string(),
        }
    }

    /// Point the client at a different Bot API endpoint (tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Fetch the bot's own identity (used for the `t.me` deep link).
    pub async fn get_me(&self) -> Result<BotUser, TelegramError> {
        self.call("getMe", &json!({})).await
    }

    /// Send an HTML-formatted message to a chat.
    pub async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        reply_markup: Option<&InlineKeyboardMarkup>,
    ) -> Result<(), TelegramError> {
        let mut payload = json!({
            "chat_id": chat_id,
            "text": text,
            "parse_mode": "HTML",
        });
        if let Some(markup) = reply_markup {
            payload["reply_markup"] = serde_json::to_value(markup)
                .expect("inline keyboard markup serializes");
        }
        self.call::<serde_json::Value>("sendMessage", &payload).await?;
        Ok(())
    }

    /// Answer an inline query.
    ///
    /// `cache_time` is zero and results are personal: playback state is
    /// per-user and must never be replayed to anyone else.
    pub async fn answer_inline_query(
        &self,
        inline_query_id: &str,
        results: &[InlineQueryResultArticle],
        button: Option<&InlineQueryResultsButton>,
    ) -> Result<(), TelegramError> {
        let mut payload = json!({
            "inline_query_id": inline_query_id,
            "results": results,
            "cache_time": 0,
            "is_personal": true,
        });
        if let Some(button) = button {
            payload["button"] =
                serde_json::to_value(button).expect("results button serializes");
        }
        self.call::<bool>("answerInlineQuery", &payload).await?;
        Ok(())
    }

    /// Answer a callback query with a toast (or a modal alert).
    pub async fn answer_callback_query(
        &self,
        callback_query_id: &str,
        text: &str,
        show_alert: bool,
    ) -> Result<(), TelegramError> {
        let payload = json!({
            "callback_query_id": callback_query_id,
            "text": text,
            "show_alert": show_alert,
        });
        self.call::<bool>("answerCallbackQuery", &payload).await?;
        Ok(())
    }

    /// Register the webhook endpoint, its shared secret, and the update
    /// kinds this bot handles.
    pub async fn set_webhook(
        &self,
        url: &str,
        secret_token: &str,
        allowed_updates: &[&str],
    ) -> Result<(), TelegramError> {
        let payload = json!({
            "url": url,
            "secret_token": secret_token,
            "allowed_updates": allowed_updates,
        });
        self.call::<bool>("setWebhook", &payload).await?;
        Ok(())
    }

    /// Remove the webhook registration.
    pub async fn delete_webhook(&self) -> Result<(), TelegramError> {
        self.call::<bool>("deleteWebhook", &json!({})).await?;
        Ok(())
    }

    /// Publish the bot's command menu.
    pub async fn set_my_commands(&self, commands: &[BotCommand]) -> Result<(), TelegramError> {
        let payload = json!({ "commands": commands });
        self.call::<bool>("setMyCommands", &payload).await?;
        Ok(())
    }

    /// Clear the bot's command menu.
    pub async fn delete_my_commands(&self) -> Result<(), TelegramError> {
        self.call::<bool>("deleteMyCommands", &json!({})).await?;
        Ok(())
    }

    /// Execute one Bot API method and unwrap the response envelope.
    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        payload: &serde_json::Value,
    ) -> Result<T, TelegramError> {
        let response = self
            .client
            .post(format!("{}/bot{}/{}", self.base_url, self.token, method))
            .json(payload)
            .send()
            .await?;

        let envelope: ApiEnvelope<T> = response.json().await?;
        if !envelope.ok {
            let code = envelope.error_code.unwrap_or_default();
            tracing::warn!(method, code, "Bot API call failed");
            return Err(TelegramError::Api {
                code,
                description: envelope.description.unwrap_or_default(),
            });
        }
        envelope.result.ok_or(TelegramError::Api {
            code: 0,
            description: "envelope was ok but carried no result".to_string(),
        })
    }
}
