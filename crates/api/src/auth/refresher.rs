//! Keeps access tokens valid, with at most one refresh in flight per
//! user.
//!
//! Telegram fans one tap out into several updates, so a user whose token
//! just expired can trigger concurrent refresh attempts. Spotify rotates
//! refresh tokens on use, which makes a duplicate exchange worse than
//! wasted work: the loser persists a dead token and the user is forced to
//! relink. A per-user async lock collapses the stampede into a single
//! exchange whose result every waiter shares.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use tunecast_core::types::UserId;
use tunecast_spotify::models::RefreshResponse;
use tunecast_spotify::{AccountsApi, SpotifyError};

use crate::auth::vault::{Credential, CredentialVault, VaultError};

/// A token expiring within this margin is treated as already stale, so it
/// cannot run out mid-request.
const EXPIRY_MARGIN_SECS: i64 = 60;

/// Bounded retry for transient exchange failures.
const MAX_ATTEMPTS: u32 = 3;
const RETRY_BASE_DELAY: Duration = Duration::from_millis(200);

#[derive(Debug, thiserror::Error)]
pub enum RefreshError {
    /// The user has no stored credential.
    #[error("user has not linked a Spotify account")]
    NotLinked,

    /// The stored grant is no longer usable (refresh token rejected, or
    /// the row failed decryption); the user must relink.
    #[error("stored credentials are no longer usable")]
    ReauthRequired,

    /// The token endpoint kept failing after retries.
    #[error("token refresh failed upstream: {0}")]
    Upstream(#[source] SpotifyError),

    /// Storage failure unrelated to token validity.
    #[error(transparent)]
    Vault(VaultError),
}

/// The refresh-token exchange, behind a trait so tests can count calls
/// and script rotation or revocation.
#[async_trait::async_trait]
pub trait RefreshExchange: Send + Sync {
    async fn refresh(&self, refresh_token: &str) -> Result<RefreshResponse, SpotifyError>;
}

#[async_trait::async_trait]
impl RefreshExchange for AccountsApi {
    async fn refresh(&self, refresh_token: &str) -> Result<RefreshResponse, SpotifyError> {
        AccountsApi::refresh(self, refresh_token).await
    }
}

pub struct TokenRefresher {
    vault: Arc<CredentialVault>,
    exchange: Arc<dyn RefreshExchange>,
    /// One async mutex per user who currently has (or recently had) a
    /// refresh in flight. Swept periodically so the map does not grow
    /// with every user ever seen.
    locks: Mutex<HashMap<UserId, Arc<tokio::sync::Mutex<()>>>>,
}

impl TokenRefresher {
    pub fn new(vault: Arc<CredentialVault>, exchange: Arc<dyn RefreshExchange>) -> Self {
        Self {
            vault,
            exchange,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Return an access token valid for at least the safety margin.
    ///
    /// A fresh token is returned without taking the lock. A stale one is
    /// refreshed under the user's lock; callers that queued behind an
    /// in-flight refresh find the stored token fresh on re-read and
    /// return it without a second exchange.
    pub async fn ensure_valid(&self, user_id: UserId) -> Result<String, RefreshError> {
        let credential = self.load_required(user_id).await?;
        if is_fresh(&credential) {
            return Ok(credential.access_token);
        }

        let lock = self.user_lock(user_id);
        let _guard = lock.lock().await;

        let credential = self.load_required(user_id).await?;
        if is_fresh(&credential) {
            return Ok(credential.access_token);
        }

        self.refresh_locked(user_id, &credential).await
    }

    /// Refresh even though the stored expiry claims the token is fresh.
    ///
    /// Used after the player rejects a token with 401 (revoked server
    /// side, or clock drift). `stale_token` is the rejected value: when a
    /// concurrent flight already replaced it, the replacement is returned
    /// without another exchange.
    pub async fn force_refresh(
        &self,
        user_id: UserId,
        stale_token: &str,
    ) -> Result<String, RefreshError> {
        let lock = self.user_lock(user_id);
        let _guard = lock.lock().await;

        let credential = self.load_required(user_id).await?;
        if credential.access_token != stale_token {
            return Ok(credential.access_token);
        }

        self.refresh_locked(user_id, &credential).await
    }

    /// Drop per-user locks nobody holds or waits on. Returns how many
    /// were removed.
    pub fn sweep_locks(&self) -> usize {
        let mut locks = self.locks.lock().expect("refresher lock table poisoned");
        let before = locks.len();
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        before - locks.len()
    }

    async fn load_required(&self, user_id: UserId) -> Result<Credential, RefreshError> {
        self.vault
            .load(user_id)
            .await
            .map_err(|e| match e {
                VaultError::Corrupt => RefreshError::ReauthRequired,
                other => RefreshError::Vault(other),
            })?
            .ok_or(RefreshError::NotLinked)
    }

    /// Run the exchange and persist its outcome. Caller holds the user's
    /// lock.
    async fn refresh_locked(
        &self,
        user_id: UserId,
        credential: &Credential,
    ) -> Result<String, RefreshError> {
        let response = match self.exchange_with_retry(&credential.refresh_token).await {
            Ok(response) => response,
            Err(e @ (SpotifyError::RefreshTokenInvalid | SpotifyError::RefreshTokenRevoked)) => {
                tracing::warn!(user_id, error = %e, "Refresh token rejected; unlinking user");
                if let Err(delete_err) = self.vault.delete(user_id).await {
                    tracing::error!(user_id, error = %delete_err, "Failed to remove dead credential");
                }
                return Err(RefreshError::ReauthRequired);
            }
            Err(e) => return Err(RefreshError::Upstream(e)),
        };

        let expires_at = Utc::now() + chrono::Duration::seconds(response.expires_in);
        let updated = self
            .vault
            .update_tokens(
                user_id,
                &response.access_token,
                response.refresh_token.as_deref(),
                expires_at,
            )
            .await
            .map_err(RefreshError::Vault)?;
        if !updated {
            // The user logged out while the exchange ran; the new token is
            // still good for this one call.
            tracing::debug!(user_id, "Credential row gone before refresh result landed");
        }

        tracing::debug!(
            user_id,
            rotated = response.refresh_token.is_some(),
            "Access token refreshed"
        );
        Ok(response.access_token)
    }

    /// Retry transient failures with doubling delay; dead-token answers
    /// are terminal on the spot.
    async fn exchange_with_retry(
        &self,
        refresh_token: &str,
    ) -> Result<RefreshResponse, SpotifyError> {
        let mut delay = RETRY_BASE_DELAY;
        let mut attempt = 1;
        loop {
            match self.exchange.refresh(refresh_token).await {
                Ok(response) => return Ok(response),
                Err(e @ (SpotifyError::RefreshTokenInvalid | SpotifyError::RefreshTokenRevoked)) => {
                    return Err(e)
                }
                Err(e) if attempt < MAX_ATTEMPTS => {
                    tracing::warn!(attempt, error = %e, "Token refresh attempt failed; retrying");
                    tokio::time::sleep(delay).await;
                    delay *= 2;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn user_lock(&self, user_id: UserId) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.locks.lock().expect("refresher lock table poisoned");
        Arc::clone(locks.entry(user_id).or_default())
    }
}

/// Fresh means the expiry sits beyond the safety margin.
fn is_fresh(credential: &Credential) -> bool {
    credential.expires_at - Utc::now() > chrono::Duration::seconds(EXPIRY_MARGIN_SECS)
}
