use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use deadpool_sqlite::Pool;
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub db_ok: bool,
    pub database: String,
    pub timestamp: String,
    pub version: &'static str,
}

/// GET /health - 503 when the database cannot be reached.
pub async fn health(State(pool): State<Arc<Pool>>) -> (StatusCode, Json<HealthResponse>) {
    let db_ok = match pool.get().await {
        Ok(conn) => matches!(
            conn.interact(|conn| conn.execute_batch("SELECT 1")).await,
            Ok(Ok(()))
        ),
        Err(_) => false,
    };

    let (code, status, database) = if db_ok {
        (StatusCode::OK, "ok", "connected")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded", "disconnected")
    };

    (
        code,
        Json(HealthResponse {
            status: status.into(),
            db_ok,
            database: database.into(),
            timestamp: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
            version: env!("CARGO_PKG_VERSION"),
        }),
    )
}
