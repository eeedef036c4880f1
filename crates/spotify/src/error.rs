//! Error types for the Spotify API clients.

/// Errors from the accounts service and player endpoints.
///
/// The refresh-token variants are split because callers react differently:
/// an invalid or revoked refresh token means the stored credential is dead
/// and the user must relink, while anything else is worth retrying.
#[derive(Debug, thiserror::Error)]
pub enum SpotifyError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout), or the
    /// response body could not be decoded.
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The bearer token was rejected (expired or invalidated upstream).
    #[error("access token rejected")]
    Unauthorized,

    /// The accounts service refused the stored refresh token.
    #[error("refresh token invalid")]
    RefreshTokenInvalid,

    /// The user revoked this app's access.
    #[error("refresh token revoked")]
    RefreshTokenRevoked,

    /// An accounts-service grant failed for another reason.
    #[error("token grant failed (HTTP {status})")]
    AuthFailed {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// The player API returned an error response.
    #[error("Spotify API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Message extracted from the error body.
        message: String,
    },
}
