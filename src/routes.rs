use crate::analytics::{self, AnalyticsState};
use crate::auth::bearer::{self, ApiTokenCache};
use crate::health;
use axum::http::{header, HeaderValue, Method};
use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use deadpool_sqlite::Pool;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

/// Assemble the HTTP application: public health check plus the
/// token-protected analytics API.
pub fn build_router(
    pool: Pool,
    analytics_state: Arc<AnalyticsState>,
    allowed_origin: &str,
) -> Result<Router, axum::http::header::InvalidHeaderValue> {
    let token_cache = Arc::new(ApiTokenCache::new(pool.clone()));

    // ── Health route (public) ──
    let health_route = Router::new()
        .route("/health", get(health::health))
        .with_state(Arc::new(pool));

    // ── Analytics routes (bearer token; refresh checks admin in handler) ──
    let analytics_routes = Router::new()
        .route("/api/analytics", get(analytics::handler::get_metrics))
        .route(
            "/api/analytics/refresh",
            post(analytics::handler::refresh_metrics),
        )
        .route(
            "/api/analytics/revenue-report",
            get(analytics::handler::revenue_report),
        )
        .route(
            "/api/analytics/occupancy-report",
            get(analytics::handler::occupancy_report),
        )
        .layer(middleware::from_fn(bearer::require_bearer))
        .layer(axum::Extension(token_cache))
        .with_state(analytics_state);

    // CORS for the dashboard: restrict to configured origin with credentials
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::exact(allowed_origin.parse::<HeaderValue>()?))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true);

    Ok(Router::new()
        .merge(health_route)
        .merge(analytics_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http()))
}
