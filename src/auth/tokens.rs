use deadpool_sqlite::Pool;
use rusqlite::params;

use super::bearer::{hash_token, Role};
use crate::error::AppResult;

const TOKEN_PREFIX: &str = "htl_tk_";

/// A freshly issued token. The plaintext is only available here.
#[derive(Debug)]
pub struct IssuedToken {
    pub id: String,
    pub token: String,
    pub role: Role,
    pub expires_at: Option<i64>,
}

/// Generate a new plaintext API token with the `htl_tk_` prefix.
pub fn generate_token() -> String {
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine;
    use rand::RngCore;

    let mut bytes = [0u8; 32]; // 256-bit entropy
    rand::thread_rng().fill_bytes(&mut bytes);
    format!("{TOKEN_PREFIX}{}", URL_SAFE_NO_PAD.encode(bytes))
}

/// Store a new token (hashed) and return its plaintext once.
pub async fn create_token(
    pool: &Pool,
    name: &str,
    role: Role,
    expires_in_days: Option<u64>,
) -> AppResult<IssuedToken> {
    let id = uuid::Uuid::new_v4().to_string();
    let token = generate_token();
    let now = chrono::Utc::now().timestamp();
    let expires_at = expires_in_days.map(|days| now + (days as i64) * 86_400);

    let conn = pool.get().await?;
    let token_hash = hash_token(&token);
    let (row_id, row_name, row_role) = (id.clone(), name.to_string(), role.as_str());
    conn.interact(move |conn| {
        conn.execute(
            "INSERT INTO api_tokens (id, name, role, token_hash, created_at, expires_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![row_id, row_name, row_role, token_hash, now, expires_at],
        )
    })
    .await??;

    tracing::info!(token_id = %id, role = %role, "api token issued");
    Ok(IssuedToken {
        id,
        token,
        role,
        expires_at,
    })
}

/// Revoke a token by id. Returns false when no active token matched.
pub async fn revoke_token(pool: &Pool, id: &str) -> AppResult<bool> {
    let now = chrono::Utc::now().timestamp();
    let token_id = id.to_string();
    let conn = pool.get().await?;
    let updated = conn
        .interact(move |conn| {
            conn.execute(
                "UPDATE api_tokens SET revoked_at = ?1 WHERE id = ?2 AND revoked_at IS NULL",
                params![now, token_id],
            )
        })
        .await??;

    if updated > 0 {
        tracing::info!(token_id = %id, "api token revoked");
    }
    Ok(updated > 0)
}
