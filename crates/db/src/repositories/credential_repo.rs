//! Repository for the `user_credentials` table.

use sqlx::PgPool;
use tunecast_core::types::{Timestamp, UserId};

use crate::models::user_credential::UserCredential;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "user_id, encrypted_access_token, encrypted_refresh_token, \
    expires_at, scope, created_at, updated_at";

/// CRUD operations for linked-account credentials.
pub struct CredentialRepo;

impl CredentialRepo {
    /// Upsert a credential: insert, or replace the existing row for the user.
    ///
    /// Linking again after a previous link (or after a corrupt row) simply
    /// overwrites everything for that user.
    pub async fn upsert(
        pool: &PgPool,
        user_id: UserId,
        encrypted_access_token: &[u8],
        encrypted_refresh_token: &[u8],
        expires_at: Timestamp,
        scope: &str,
    ) -> Result<UserCredential, sqlx::Error> {
        let query = format!(
            "INSERT INTO user_credentials \
                (user_id, encrypted_access_token, encrypted_refresh_token, expires_at, scope)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT (user_id) DO UPDATE SET
                encrypted_access_token = EXCLUDED.encrypted_access_token,
                encrypted_refresh_token = EXCLUDED.encrypted_refresh_token,
                expires_at = EXCLUDED.expires_at,
                scope = EXCLUDED.scope,
                updated_at = NOW()
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, UserCredential>(&query)
            .bind(user_id)
            .bind(encrypted_access_token)
            .bind(encrypted_refresh_token)
            .bind(expires_at)
            .bind(scope)
            .fetch_one(pool)
            .await
    }

    /// Find the credential for a user.
    pub async fn find_by_user_id(
        pool: &PgPool,
        user_id: UserId,
    ) -> Result<Option<UserCredential>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM user_credentials WHERE user_id = $1");
        sqlx::query_as::<_, UserCredential>(&query)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Store the outcome of a token refresh.
    ///
    /// A `None` refresh token keeps the stored one (the provider did not
    /// rotate it). Returns `false` if the user has no credential row.
    pub async fn update_tokens(
        pool: &PgPool,
        user_id: UserId,
        encrypted_access_token: &[u8],
        encrypted_refresh_token: Option<&[u8]>,
        expires_at: Timestamp,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE user_credentials SET
                encrypted_access_token = $2,
                encrypted_refresh_token = COALESCE($3, encrypted_refresh_token),
                expires_at = $4,
                updated_at = NOW()
             WHERE user_id = $1",
        )
        .bind(user_id)
        .bind(encrypted_access_token)
        .bind(encrypted_refresh_token)
        .bind(expires_at)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete the credential for a user. Returns `true` if a row was deleted.
    pub async fn delete(pool: &PgPool, user_id: UserId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM user_credentials WHERE user_id = $1")
            .bind(user_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
