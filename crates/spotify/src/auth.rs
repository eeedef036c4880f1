//! Accounts-service client: authorization URL, code exchange, and token
//! refresh.

use std::time::Duration;

use reqwest::Url;

use crate::error::SpotifyError;
use crate::models::{AccountsErrorBody, RefreshResponse, TokenResponse};

/// Base URL of the Spotify accounts service.
const ACCOUNTS_BASE_URL: &str = "https://accounts.spotify.com";

/// OAuth scopes requested at link time: read playback state for the inline
/// card, modify playback state for the queue button.
pub const OAUTH_SCOPES: &str =
    "user-read-playback-state user-read-currently-playing user-modify-playback-state";

/// HTTP request timeout for a single accounts call. Kept short because a
/// refresh can run inside the inline answer window.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(4);

/// Accounts-endpoint error strings that mark a refresh token as dead.
const ERR_INVALID_REFRESH_TOKEN: &str = "Invalid refresh token";
const ERR_REFRESH_TOKEN_REVOKED: &str = "Refresh token revoked";

/// HTTP client for the Spotify accounts service.
pub struct AccountsApi {
    client: reqwest::Client,
    base_url: String,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
}

impl AccountsApi {
    /// Create a new accounts client.
    ///
    /// * `redirect_uri` - The absolute callback URL registered with Spotify;
    ///   must match the one sent during code exchange exactly.
    pub fn new(client_id: String, client_secret: String, redirect_uri: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to build reqwest HTTP client");
        Self::with_client(client, client_id, client_secret, redirect_uri)
    }

    /// Create a client reusing an existing [`reqwest::Client`]
    /// (shares the connection pool with the player client).
    pub fn with_client(
        client: reqwest::Client,
        client_id: String,
        client_secret: String,
        redirect_uri: String,
    ) -> Self {
        Self {
            client,
            base_url: ACCOUNTS_BASE_URL.to_string(),
            client_id,
            client_secret,
            redirect_uri,
        }
    }

    /// Point the client at a different accounts endpoint (tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Build the user-facing consent URL carrying a login state token.
    pub fn authorize_url(&self, state: &str) -> String {
        Url::parse_with_params(
            &format!("{}/authorize", self.base_url),
            &[
                ("response_type", "code"),
                ("client_id", self.client_id.as_str()),
                ("scope", OAUTH_SCOPES),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("state", state),
            ],
        )
        .expect("authorize URL parameters are always encodable")
        .to_string()
    }

    /// Exchange an authorization code for a token pair.
    pub async fn exchange_code(&self, code: &str) -> Result<TokenResponse, SpotifyError> {
        let response = self
            .client
            .post(format!("{}/api/token", self.base_url))
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", self.redirect_uri.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = status.as_u16(), "Authorization code exchange failed");
            return Err(SpotifyError::AuthFailed {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json::<TokenResponse>().await?)
    }

    /// Exchange a refresh token for a fresh access token.
    ///
    /// Distinguishes a dead refresh token (invalid or revoked, the user
    /// must relink) from transient failures the caller may retry.
    pub async fn refresh(&self, refresh_token: &str) -> Result<RefreshResponse, SpotifyError> {
        let response = self
            .client
            .post(format!("{}/api/token", self.base_url))
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_refresh_failure(status.as_u16(), &body));
        }

        Ok(response.json::<RefreshResponse>().await?)
    }
}

/// Map a failed refresh response to the matching error variant.
///
/// The accounts service reports a dead refresh token as HTTP 400 with an
/// `error_description` of either "Invalid refresh token" or
/// "Refresh token revoked".
fn classify_refresh_failure(status: u16, body: &str) -> SpotifyError {
    if status == 400 {
        let description = serde_json::from_str::<AccountsErrorBody>(body)
            .ok()
            .and_then(|b| b.error_description);
        match description.as_deref() {
            Some(ERR_INVALID_REFRESH_TOKEN) => return SpotifyError::RefreshTokenInvalid,
            Some(ERR_REFRESH_TOKEN_REVOKED) => return SpotifyError::RefreshTokenRevoked,
            _ => {}
        }
    }
    SpotifyError::AuthFailed {
        status,
        body: body.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn api() -> AccountsApi {
        AccountsApi::new(
            "client-id".into(),
            "client-secret".into(),
            "https://example.com/spotify/callback".into(),
        )
    }

    // -- Authorize URL ------------------------------------------------------

    #[test]
    fn authorize_url_carries_all_parameters() {
        let url = api().authorize_url("state-token-123");

        assert!(url.starts_with("https://accounts.spotify.com/authorize?"));
        assert!(url.contains("response_type=code"));
        assert!(url.contains("client_id=client-id"));
        assert!(url.contains("state=state-token-123"));
        assert!(url.contains("user-read-currently-playing"));
    }

    #[test]
    fn authorize_url_encodes_the_redirect_uri() {
        let url = api().authorize_url("s");
        assert!(url.contains("redirect_uri=https%3A%2F%2Fexample.com%2Fspotify%2Fcallback"));
    }

    // -- Refresh failure classification -------------------------------------

    #[test]
    fn invalid_refresh_token_is_distinguished() {
        let body = r#"{"error":"invalid_grant","error_description":"Invalid refresh token"}"#;
        assert_matches!(
            classify_refresh_failure(400, body),
            SpotifyError::RefreshTokenInvalid
        );
    }

    #[test]
    fn revoked_refresh_token_is_distinguished() {
        let body = r#"{"error":"invalid_grant","error_description":"Refresh token revoked"}"#;
        assert_matches!(
            classify_refresh_failure(400, body),
            SpotifyError::RefreshTokenRevoked
        );
    }

    #[test]
    fn other_400_bodies_stay_generic() {
        let body = r#"{"error":"invalid_request","error_description":"Missing grant type"}"#;
        assert_matches!(
            classify_refresh_failure(400, body),
            SpotifyError::AuthFailed { status: 400, .. }
        );
    }

    #[test]
    fn non_400_failures_stay_generic() {
        assert_matches!(
            classify_refresh_failure(503, "upstream down"),
            SpotifyError::AuthFailed { status: 503, .. }
        );
        // A 503 with a dead-token description must not count as dead.
        let body = r#"{"error_description":"Invalid refresh token"}"#;
        assert_matches!(
            classify_refresh_failure(503, body),
            SpotifyError::AuthFailed { status: 503, .. }
        );
    }
}
