//! Single-use login states for the account linking flow.
//!
//! When a user asks to link their Spotify account, we mint an unguessable
//! state token, remember who it belongs to, and embed it in the authorize
//! URL. The OAuth callback hands the token back and consumes it: a token
//! works exactly once and only within its validity window, so a replayed
//! or forged callback cannot attach an account to someone else.

use std::collections::HashMap;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::Utc;
use rand::Rng;
use tokio::sync::RwLock;

use crate::types::{Timestamp, UserId};

/// How long a minted state token stays valid.
pub const LOGIN_STATE_TTL_SECS: i64 = 600;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum LoginStateError {
    /// The token is unknown or was already consumed.
    #[error("unknown or already used login state")]
    Invalid,

    /// The token exists but its validity window has passed.
    #[error("login state expired")]
    Expired,
}

/// A login awaiting completion via the OAuth callback.
#[derive(Debug, Clone)]
struct PendingLogin {
    user_id: UserId,
    created_at: Timestamp,
}

/// In-memory store of pending logins, keyed by state token.
///
/// State lives in process memory only. Login states are short-lived; a
/// restart means the user taps the login button again.
#[derive(Default)]
pub struct LoginStateStore {
    pending: RwLock<HashMap<String, PendingLogin>>,
}

impl LoginStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint a state token for `user_id` and register it as pending.
    pub async fn begin(&self, user_id: UserId) -> String {
        let token = mint_state_token();
        let entry = PendingLogin {
            user_id,
            created_at: Utc::now(),
        };
        self.pending.write().await.insert(token.clone(), entry);
        token
    }

    /// Consume a state token, returning the user it was minted for.
    ///
    /// The entry is removed before any check, so a second call with the
    /// same token always fails with [`LoginStateError::Invalid`].
    pub async fn consume(&self, state: &str) -> Result<UserId, LoginStateError> {
        let entry = self
            .pending
            .write()
            .await
            .remove(state)
            .ok_or(LoginStateError::Invalid)?;

        if is_expired(entry.created_at, Utc::now()) {
            return Err(LoginStateError::Expired);
        }
        Ok(entry.user_id)
    }

    /// Drop all entries past their validity window. Returns how many were
    /// removed.
    pub async fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let mut pending = self.pending.write().await;
        let before = pending.len();
        pending.retain(|_, entry| !is_expired(entry.created_at, now));
        before - pending.len()
    }

    /// Number of logins currently awaiting completion.
    pub async fn pending_count(&self) -> usize {
        self.pending.read().await.len()
    }
}

fn is_expired(created_at: Timestamp, now: Timestamp) -> bool {
    now - created_at > chrono::Duration::seconds(LOGIN_STATE_TTL_SECS)
}

/// Generate an unguessable state token (32 random bytes, URL-safe base64).
pub fn mint_state_token() -> String {
    let mut bytes = [0u8; 32];
    rand::rng().fill(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn minted_tokens_are_unique_and_url_safe() {
        let a = mint_state_token();
        let b = mint_state_token();
        assert_ne!(a, b);
        assert_eq!(a.len(), 43);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[tokio::test]
    async fn consume_returns_the_owning_user() {
        let store = LoginStateStore::new();
        let state = store.begin(42).await;
        assert_eq!(store.consume(&state).await, Ok(42));
    }

    #[tokio::test]
    async fn second_consume_is_invalid() {
        let store = LoginStateStore::new();
        let state = store.begin(42).await;

        assert!(store.consume(&state).await.is_ok());
        assert_matches!(store.consume(&state).await, Err(LoginStateError::Invalid));
    }

    #[tokio::test]
    async fn unknown_state_is_invalid() {
        let store = LoginStateStore::new();
        assert_matches!(store.consume("nope").await, Err(LoginStateError::Invalid));
    }

    #[tokio::test]
    async fn stale_state_is_expired_and_removed() {
        let store = LoginStateStore::new();
        let stale = PendingLogin {
            user_id: 42,
            created_at: Utc::now() - chrono::Duration::seconds(LOGIN_STATE_TTL_SECS + 1),
        };
        store.pending.write().await.insert("old".into(), stale);

        assert_matches!(store.consume("old").await, Err(LoginStateError::Expired));
        // The expired entry was consumed too; retrying is Invalid, not Expired.
        assert_matches!(store.consume("old").await, Err(LoginStateError::Invalid));
    }

    #[tokio::test]
    async fn purge_removes_only_expired_entries() {
        let store = LoginStateStore::new();
        let fresh = store.begin(1).await;
        let stale = PendingLogin {
            user_id: 2,
            created_at: Utc::now() - chrono::Duration::seconds(LOGIN_STATE_TTL_SECS + 1),
        };
        store.pending.write().await.insert("old".into(), stale);

        assert_eq!(store.purge_expired().await, 1);
        assert_eq!(store.pending_count().await, 1);
        assert_eq!(store.consume(&fresh).await, Ok(1));
    }
}
