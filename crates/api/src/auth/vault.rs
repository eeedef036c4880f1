//! Encrypted storage for linked Spotify credentials.
//!
//! The vault is the only component holding the [`TokenCipher`]; every
//! token that reaches the database passes through it, so plaintext never
//! appears in a query, a log line, or a serialized row.

use tunecast_core::crypto::TokenCipher;
use tunecast_core::types::{Timestamp, UserId};
use tunecast_db::repositories::CredentialRepo;
use tunecast_db::DbPool;

#[derive(Debug, thiserror::Error)]
pub enum VaultError {
    /// Stored ciphertext failed authentication: the key changed or the row
    /// was tampered with. Callers treat the credential as unusable and ask
    /// the user to relink.
    #[error("stored credential could not be decrypted")]
    Corrupt,

    /// Sealing failed before anything was written.
    #[error("token encryption failed")]
    Encrypt,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// A decrypted credential. Lives only as long as one outbound call needs
/// it; never logged, never serialized.
#[derive(Debug)]
pub struct Credential {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: Timestamp,
    pub scope: String,
}

/// Seals tokens before they hit the database and opens them on the way
/// out.
pub struct CredentialVault {
    pool: DbPool,
    cipher: TokenCipher,
}

impl CredentialVault {
    pub fn new(pool: DbPool, cipher: TokenCipher) -> Self {
        Self { pool, cipher }
    }

    /// Seal and upsert a full token pair for a user.
    pub async fn store(
        &self,
        user_id: UserId,
        access_token: &str,
        refresh_token: &str,
        expires_at: Timestamp,
        scope: &str,
    ) -> Result<(), VaultError> {
        let sealed_access = self
            .cipher
            .encrypt_str(access_token)
            .map_err(|_| VaultError::Encrypt)?;
        let sealed_refresh = self
            .cipher
            .encrypt_str(refresh_token)
            .map_err(|_| VaultError::Encrypt)?;

        CredentialRepo::upsert(
            &self.pool,
            user_id,
            &sealed_access,
            &sealed_refresh,
            expires_at,
            scope,
        )
        .await?;
        Ok(())
    }

    /// Load and open the credential for a user.
    ///
    /// `Ok(None)` means the user has never linked (or has logged out);
    /// [`VaultError::Corrupt`] means a row exists but cannot be opened.
    pub async fn load(&self, user_id: UserId) -> Result<Option<Credential>, VaultError> {
        let Some(row) = CredentialRepo::find_by_user_id(&self.pool, user_id).await? else {
            return Ok(None);
        };

        let access_token = self.open(user_id, &row.encrypted_access_token)?;
        let refresh_token = self.open(user_id, &row.encrypted_refresh_token)?;

        Ok(Some(Credential {
            access_token,
            refresh_token,
            expires_at: row.expires_at,
            scope: row.scope,
        }))
    }

    /// Persist the outcome of a token refresh. The stored refresh token is
    /// replaced only when the provider rotated it. Returns `false` when
    /// the user has no credential row (unlinked mid-refresh).
    pub async fn update_tokens(
        &self,
        user_id: UserId,
        access_token: &str,
        rotated_refresh_token: Option<&str>,
        expires_at: Timestamp,
    ) -> Result<bool, VaultError> {
        let sealed_access = self
            .cipher
            .encrypt_str(access_token)
            .map_err(|_| VaultError::Encrypt)?;
        let sealed_refresh = match rotated_refresh_token {
            Some(token) => Some(
                self.cipher
                    .encrypt_str(token)
                    .map_err(|_| VaultError::Encrypt)?,
            ),
            None => None,
        };

        Ok(CredentialRepo::update_tokens(
            &self.pool,
            user_id,
            &sealed_access,
            sealed_refresh.as_deref(),
            expires_at,
        )
        .await?)
    }

    /// Remove a user's credential. Returns `true` when a row existed.
    pub async fn delete(&self, user_id: UserId) -> Result<bool, VaultError> {
        Ok(CredentialRepo::delete(&self.pool, user_id).await?)
    }

    fn open(&self, user_id: UserId, sealed: &[u8]) -> Result<String, VaultError> {
        self.cipher.decrypt_str(sealed).map_err(|_| {
            // Needs operator attention: either CREDENTIAL_KEY changed or
            // the row was modified outside the application.
            tracing::error!(user_id, "Stored credential failed decryption");
            VaultError::Corrupt
        })
    }
}
