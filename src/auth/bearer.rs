use axum::{
    body::Body,
    extract::Request,
    http::header,
    middleware::Next,
    response::Response,
};
use deadpool_sqlite::Pool;
use moka::sync::Cache;
use rusqlite::OptionalExtension;
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Admin,
    Staff,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Staff => "staff",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "staff" => Ok(Role::Staff),
            other => Err(format!("unknown role: {other} (expected admin or staff)")),
        }
    }
}

/// Injected into request extensions after successful bearer token validation.
#[derive(Clone, Debug)]
pub struct StaffAuth {
    pub token_id: String,
    pub name: String,
    pub role: Role,
    pub expires_at: Option<i64>,
}

impl StaffAuth {
    /// Fail with 403 unless the caller holds one of `roles`.
    pub fn require_role(&self, roles: &[Role]) -> AppResult<()> {
        if roles.contains(&self.role) {
            Ok(())
        } else {
            Err(AppError::Forbidden("Insufficient permissions".to_string()))
        }
    }
}

/// Cached token lookup: SHA-256 hash → StaffAuth.
#[derive(Clone)]
pub struct ApiTokenCache {
    cache: Cache<String, StaffAuth>,
    pool: Pool,
}

impl ApiTokenCache {
    pub fn new(pool: Pool) -> Self {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(Duration::from_secs(60))
            .build();
        Self { cache, pool }
    }

    /// Resolve a plaintext token. Hashes the token, checks cache, then DB.
    ///
    /// `Ok(None)` means the token is unknown, revoked or expired. Store
    /// failures are returned as errors so they are not reported as bad
    /// credentials.
    pub async fn resolve(&self, plaintext: &str) -> AppResult<Option<StaffAuth>> {
        let hash = hash_token(plaintext);
        let now = chrono::Utc::now().timestamp();

        // Check cache (re-validate expiry on every hit)
        if let Some(auth) = self.cache.get(&hash) {
            if auth.expires_at.is_some_and(|exp| exp < now) {
                self.cache.invalidate(&hash);
                return Ok(None);
            }
            return Ok(Some(auth));
        }

        let h = hash.clone();
        let conn = self.pool.get().await?;
        let row = conn
            .interact(move |conn| {
                conn.query_row(
                    "SELECT id, name, role, expires_at
                     FROM api_tokens
                     WHERE token_hash = ?1 AND revoked_at IS NULL",
                    rusqlite::params![h],
                    |row| {
                        Ok((
                            row.get::<_, String>(0)?,
                            row.get::<_, String>(1)?,
                            row.get::<_, String>(2)?,
                            row.get::<_, Option<i64>>(3)?,
                        ))
                    },
                )
                .optional()
            })
            .await??;

        let Some((id, name, role, expires_at)) = row else {
            return Ok(None);
        };

        if expires_at.is_some_and(|exp| exp < now) {
            return Ok(None);
        }

        let role = match role.parse::<Role>() {
            Ok(role) => role,
            Err(e) => {
                tracing::warn!(token_id = %id, error = %e, "api token has unknown role");
                return Ok(None);
            }
        };

        let auth = StaffAuth {
            token_id: id,
            name,
            role,
            expires_at,
        };
        self.cache.insert(hash, auth.clone());
        Ok(Some(auth))
    }

    /// Update last_used_at in the background (fire-and-forget).
    pub fn touch_last_used(&self, token_id: String) {
        let pool = self.pool.clone();
        tokio::spawn(async move {
            let now = chrono::Utc::now().timestamp();
            if let Ok(conn) = pool.get().await {
                let _ = conn
                    .interact(move |conn| {
                        conn.execute(
                            "UPDATE api_tokens SET last_used_at = ?1 WHERE id = ?2",
                            rusqlite::params![now, token_id],
                        )
                    })
                    .await;
            }
        });
    }
}

/// SHA-256 hash of a plaintext token, returned as hex.
pub fn hash_token(plaintext: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(plaintext.as_bytes());
    hex::encode(hasher.finalize())
}

/// Extract Bearer token from Authorization header.
fn extract_bearer(req: &Request<Body>) -> Option<String> {
    let value = req.headers().get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        return None;
    }
    Some(token.to_string())
}

/// Middleware: requires a valid bearer token and injects `StaffAuth`.
pub async fn require_bearer(mut request: Request<Body>, next: Next) -> AppResult<Response> {
    let cache = request
        .extensions()
        .get::<Arc<ApiTokenCache>>()
        .cloned()
        .ok_or_else(|| AppError::Internal("api token cache not configured".to_string()))?;

    let plaintext = extract_bearer(&request)
        .ok_or_else(|| AppError::Auth("Access token required".to_string()))?;

    let auth = cache
        .resolve(&plaintext)
        .await?
        .ok_or_else(|| AppError::Auth("invalid or expired token".to_string()))?;

    cache.touch_last_used(auth.token_id.clone());

    request.extensions_mut().insert(auth);
    Ok(next.run(request).await)
}
