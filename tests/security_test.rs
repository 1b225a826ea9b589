use hotelier::auth::bearer::{hash_token, ApiTokenCache, Role};
use hotelier::auth::tokens;
use hotelier::config::DatabaseConfig;
use hotelier::error::AppError;

/// Helper to create a temp DB pool with all migrations applied.
async fn setup_pool() -> (deadpool_sqlite::Pool, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let config = DatabaseConfig {
        path: dir.path().join("security.db"),
        pool_size: 4,
    };
    let pool = hotelier::storage::sqlite::create_pool(&config).unwrap();
    hotelier::storage::sqlite::init_pool(&pool).await.unwrap();
    (pool, dir)
}

async fn count(pool: &deadpool_sqlite::Pool, sql: &'static str, value: String) -> i64 {
    let conn = pool.get().await.unwrap();
    conn.interact(move |conn| {
        conn.query_row(sql, rusqlite::params![value], |row| row.get::<_, i64>(0))
            .unwrap()
    })
    .await
    .unwrap()
}

// ═══════════════════════════════════════════════════════════════
// Token storage
// ═══════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_api_token_is_hashed_in_db() {
    let (pool, _dir) = setup_pool().await;

    let issued = tokens::create_token(&pool, "front desk", Role::Staff, None)
        .await
        .expect("create_token should succeed");

    // The plaintext token should NOT appear in the DB
    let plaintext = count(
        &pool,
        "SELECT COUNT(*) FROM api_tokens WHERE token_hash = ?1",
        issued.token.clone(),
    )
    .await;
    assert_eq!(plaintext, 0, "plaintext token must not be stored");

    let hashed = count(
        &pool,
        "SELECT COUNT(*) FROM api_tokens WHERE token_hash = ?1",
        hash_token(&issued.token),
    )
    .await;
    assert_eq!(hashed, 1, "hashed token should be stored");
}

#[tokio::test]
async fn test_valid_token_resolves_with_role() {
    let (pool, _dir) = setup_pool().await;
    let issued = tokens::create_token(&pool, "manager", Role::Admin, Some(7))
        .await
        .unwrap();

    let cache = ApiTokenCache::new(pool.clone());
    let auth = cache
        .resolve(&issued.token)
        .await
        .unwrap()
        .expect("token should resolve");
    assert_eq!(auth.token_id, issued.id);
    assert_eq!(auth.name, "manager");
    assert_eq!(auth.role, Role::Admin);
    assert!(auth.expires_at.is_some());
}

// ═══════════════════════════════════════════════════════════════
// Revocation and expiry
// ═══════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_revoked_token_rejected() {
    let (pool, _dir) = setup_pool().await;
    let issued = tokens::create_token(&pool, "temp", Role::Staff, None)
        .await
        .unwrap();

    assert!(tokens::revoke_token(&pool, &issued.id).await.unwrap());
    // Second revoke finds no active token
    assert!(!tokens::revoke_token(&pool, &issued.id).await.unwrap());

    let cache = ApiTokenCache::new(pool.clone());
    assert!(cache.resolve(&issued.token).await.unwrap().is_none());
}

#[tokio::test]
async fn test_revoke_unknown_token_returns_false() {
    let (pool, _dir) = setup_pool().await;
    assert!(!tokens::revoke_token(&pool, "no-such-id").await.unwrap());
}

#[tokio::test]
async fn test_expired_token_rejected() {
    let (pool, _dir) = setup_pool().await;
    let issued = tokens::create_token(&pool, "old", Role::Staff, Some(1))
        .await
        .unwrap();

    // Push expiry into the past
    let conn = pool.get().await.unwrap();
    let id = issued.id.clone();
    conn.interact(move |conn| {
        conn.execute(
            "UPDATE api_tokens SET expires_at = ?1 WHERE id = ?2",
            rusqlite::params![chrono::Utc::now().timestamp() - 60, id],
        )
        .unwrap();
    })
    .await
    .unwrap();

    let cache = ApiTokenCache::new(pool.clone());
    assert!(cache.resolve(&issued.token).await.unwrap().is_none());
}

#[tokio::test]
async fn test_unknown_token_rejected() {
    let (pool, _dir) = setup_pool().await;
    let cache = ApiTokenCache::new(pool);
    assert!(cache.resolve("htl_tk_forged").await.unwrap().is_none());
}

#[tokio::test]
async fn test_role_constraint_enforced_by_schema() {
    let (pool, _dir) = setup_pool().await;
    let conn = pool.get().await.unwrap();
    let result = conn
        .interact(|conn| {
            conn.execute(
                "INSERT INTO api_tokens (id, name, role, token_hash, created_at)
                 VALUES ('x', 'x', 'owner', 'deadbeef', 0)",
                [],
            )
        })
        .await
        .unwrap();
    assert!(result.is_err(), "unknown role must be rejected");
}

#[tokio::test]
async fn test_store_failure_is_not_reported_as_bad_token() {
    let (pool, _dir) = setup_pool().await;
    let issued = tokens::create_token(&pool, "night shift", Role::Staff, None)
        .await
        .unwrap();

    let conn = pool.get().await.unwrap();
    conn.interact(|conn| conn.execute_batch("DROP TABLE api_tokens"))
        .await
        .unwrap()
        .unwrap();
    drop(conn);

    let cache = ApiTokenCache::new(pool);
    let err = cache.resolve(&issued.token).await.unwrap_err();
    assert!(
        matches!(err, AppError::Database(_)),
        "store outage must surface as a server error, got {err:?}"
    );
}
