//! Integration tests for the credential repository.

use chrono::{Duration, Utc};
use sqlx::PgPool;
use tunecast_db::repositories::CredentialRepo;

const SCOPE: &str = "user-read-playback-state user-read-currently-playing";

// ---------------------------------------------------------------------------
// Test: upsert inserts a row and find returns the same bytes
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn upsert_then_find_round_trips(pool: PgPool) {
    let expires_at = Utc::now() + Duration::hours(1);
    let stored = CredentialRepo::upsert(&pool, 100, b"sealed-a", b"sealed-r", expires_at, SCOPE)
        .await
        .unwrap();

    assert_eq!(stored.user_id, 100);
    assert_eq!(stored.encrypted_access_token, b"sealed-a");
    assert_eq!(stored.scope, SCOPE);

    let found = CredentialRepo::find_by_user_id(&pool, 100)
        .await
        .unwrap()
        .expect("row must exist");
    assert_eq!(found.encrypted_access_token, b"sealed-a");
    assert_eq!(found.encrypted_refresh_token, b"sealed-r");
}

// ---------------------------------------------------------------------------
// Test: upserting again replaces the row instead of adding one
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn upsert_is_one_row_per_user(pool: PgPool) {
    let expires_at = Utc::now() + Duration::hours(1);
    CredentialRepo::upsert(&pool, 100, b"first-a", b"first-r", expires_at, SCOPE)
        .await
        .unwrap();
    CredentialRepo::upsert(&pool, 100, b"second-a", b"second-r", expires_at, SCOPE)
        .await
        .unwrap();

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM user_credentials")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 1);

    let found = CredentialRepo::find_by_user_id(&pool, 100)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.encrypted_access_token, b"second-a");
}

// ---------------------------------------------------------------------------
// Test: update_tokens keeps the refresh token unless a new one is given
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn update_tokens_keeps_refresh_unless_rotated(pool: PgPool) {
    let expires_at = Utc::now() + Duration::hours(1);
    CredentialRepo::upsert(&pool, 100, b"old-a", b"old-r", expires_at, SCOPE)
        .await
        .unwrap();

    // No rotation: refresh token must survive.
    let updated =
        CredentialRepo::update_tokens(&pool, 100, b"new-a", None, expires_at).await.unwrap();
    assert!(updated);
    let row = CredentialRepo::find_by_user_id(&pool, 100).await.unwrap().unwrap();
    assert_eq!(row.encrypted_access_token, b"new-a");
    assert_eq!(row.encrypted_refresh_token, b"old-r");

    // Rotation: both change.
    CredentialRepo::update_tokens(&pool, 100, b"newer-a", Some(b"new-r".as_slice()), expires_at)
        .await
        .unwrap();
    let row = CredentialRepo::find_by_user_id(&pool, 100).await.unwrap().unwrap();
    assert_eq!(row.encrypted_refresh_token, b"new-r");
}

// ---------------------------------------------------------------------------
// Test: update_tokens on a missing user reports false
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn update_tokens_without_row_is_false(pool: PgPool) {
    let updated = CredentialRepo::update_tokens(&pool, 999, b"a", None, Utc::now())
        .await
        .unwrap();
    assert!(!updated);
}

// ---------------------------------------------------------------------------
// Test: delete reports whether a row existed
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn delete_reports_row_presence(pool: PgPool) {
    let expires_at = Utc::now() + Duration::hours(1);
    CredentialRepo::upsert(&pool, 100, b"a", b"r", expires_at, SCOPE).await.unwrap();

    assert!(CredentialRepo::delete(&pool, 100).await.unwrap());
    assert!(!CredentialRepo::delete(&pool, 100).await.unwrap());
    assert!(CredentialRepo::find_by_user_id(&pool, 100).await.unwrap().is_none());
}
