//! The OAuth account-linking flow, from login button to stored tokens.

use std::sync::Arc;

use chrono::Utc;
use tunecast_core::login_state::{LoginStateError, LoginStateStore};
use tunecast_core::types::UserId;
use tunecast_spotify::{AccountsApi, SpotifyError};

use crate::auth::vault::{CredentialVault, VaultError};

#[derive(Debug, thiserror::Error)]
pub enum LinkingError {
    /// The state token was unknown, already used, or expired.
    #[error(transparent)]
    State(#[from] LoginStateError),

    /// The authorization code could not be exchanged.
    #[error("authorization code exchange failed: {0}")]
    Exchange(#[source] SpotifyError),

    #[error(transparent)]
    Vault(#[from] VaultError),
}

/// Ties the pieces of the authorization flow together: mint a state token
/// bound to a Telegram user, hand out the consent URL, and on callback
/// turn the code into a stored credential.
pub struct LinkingFlow {
    accounts: Arc<AccountsApi>,
    login_states: Arc<LoginStateStore>,
    vault: Arc<CredentialVault>,
}

impl LinkingFlow {
    pub fn new(
        accounts: Arc<AccountsApi>,
        login_states: Arc<LoginStateStore>,
        vault: Arc<CredentialVault>,
    ) -> Self {
        Self {
            accounts,
            login_states,
            vault,
        }
    }

    /// Start a login attempt for a user and return the consent URL to put
    /// behind the login button.
    pub async fn begin(&self, user_id: UserId) -> String {
        let state = self.login_states.begin(user_id).await;
        self.accounts.authorize_url(&state)
    }

    /// Complete the flow from the OAuth redirect.
    ///
    /// The state token is consumed before the code exchange, so a replayed
    /// callback fails on the state check and never reaches the accounts
    /// service.
    pub async fn complete(&self, state: &str, code: &str) -> Result<UserId, LinkingError> {
        let user_id = self.login_states.consume(state).await?;

        let tokens = self
            .accounts
            .exchange_code(code)
            .await
            .map_err(LinkingError::Exchange)?;

        let expires_at = Utc::now() + chrono::Duration::seconds(tokens.expires_in);
        self.vault
            .store(
                user_id,
                &tokens.access_token,
                &tokens.refresh_token,
                expires_at,
                &tokens.scope,
            )
            .await?;

        tracing::info!(user_id, "Spotify account linked");
        Ok(user_id)
    }
}
