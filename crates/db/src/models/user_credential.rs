//! Linked-account credential entity model.

use serde::Serialize;
use sqlx::FromRow;
use tunecast_core::types::{Timestamp, UserId};

/// A row from the `user_credentials` table.
///
/// Token columns hold AES-256-GCM sealed bytes; only the credential vault
/// can open them. Both are skipped during serialization to prevent
/// exposure through logs or API responses.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct UserCredential {
    /// Telegram user id. Primary key, so at most one credential per user.
    pub user_id: UserId,
    #[serde(skip_serializing)]
    pub encrypted_access_token: Vec<u8>,
    #[serde(skip_serializing)]
    pub encrypted_refresh_token: Vec<u8>,
    /// When the sealed access token stops being accepted upstream.
    pub expires_at: Timestamp,
    /// Space-separated OAuth scopes granted at link time.
    pub scope: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
