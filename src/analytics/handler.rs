use crate::analytics::types::*;
use crate::analytics::AnalyticsState;
use crate::auth::bearer::{Role, StaffAuth};
use crate::error::AppResult;
use axum::extract::{Query, State};
use axum::{Extension, Json};
use std::sync::Arc;

/// GET /api/analytics
pub async fn get_metrics(
    State(state): State<Arc<AnalyticsState>>,
) -> AppResult<Json<MetricsResponse>> {
    let analytics = state.reporting.get_metrics().await?;
    Ok(Json(MetricsResponse { analytics }))
}

/// POST /api/analytics/refresh (admin only)
pub async fn refresh_metrics(
    State(state): State<Arc<AnalyticsState>>,
    Extension(auth): Extension<StaffAuth>,
) -> AppResult<Json<RefreshResponse>> {
    auth.require_role(&[Role::Admin])?;
    tracing::info!(token_id = %auth.token_id, "analytics refresh requested");

    let analytics = state.reporting.refresh_metrics().await?;
    Ok(Json(RefreshResponse {
        message: "Analytics refreshed successfully",
        analytics,
    }))
}

/// GET /api/analytics/revenue-report?startDate=..&endDate=..
pub async fn revenue_report(
    State(state): State<Arc<AnalyticsState>>,
    Query(params): Query<RevenueReportParams>,
) -> AppResult<Json<ReportResponse<RevenueReport>>> {
    let report = state
        .reporting
        .revenue_report(params.start_date, params.end_date)
        .await?;
    Ok(Json(ReportResponse { report }))
}

/// GET /api/analytics/occupancy-report
pub async fn occupancy_report(
    State(state): State<Arc<AnalyticsState>>,
) -> AppResult<Json<ReportResponse<OccupancyReport>>> {
    let report = state.reporting.occupancy_report().await?;
    Ok(Json(ReportResponse { report }))
}
