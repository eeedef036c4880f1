//! Error type for Bot API calls.

#[derive(Debug, thiserror::Error)]
pub enum TelegramError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout), or the
    /// response was not a Bot API envelope.
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The Bot API answered `"ok": false`.
    #[error("Bot API error ({code}): {description}")]
    Api {
        /// Telegram error code (usually mirrors an HTTP status).
        code: i64,
        /// Human-readable description from the envelope.
        description: String,
    },
}
