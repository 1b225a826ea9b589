use serde::{Deserialize, Serialize};

/// Chart month labels, in calendar order.
pub const MONTH_LABELS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// One fully computed metrics record; the unit of caching.
///
/// Serialized with camelCase keys because the dashboard consumes it as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    pub active_guests: i64,
    pub total_revenue: f64,
    pub occupancy_rate: i64,
    pub pending_bookings: i64,
    pub avg_occupancy: i64,
    pub repeat_guests: i64,
    pub satisfaction: f64,
    pub monthly_revenue: Vec<MonthlyRevenue>,
    pub occupancy_trend: Vec<OccupancyPoint>,
    pub customer_satisfaction: Vec<CategoryScore>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyRevenue {
    pub month: String,
    pub revenue: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OccupancyPoint {
    pub month: String,
    pub rate: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryScore {
    pub category: String,
    pub score: f64,
}

// ── Reports ──

/// Query parameters for `GET /api/analytics/revenue-report`.
#[derive(Debug, Default, Deserialize)]
pub struct RevenueReportParams {
    #[serde(rename = "startDate")]
    pub start_date: Option<String>,
    #[serde(rename = "endDate")]
    pub end_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportPeriod {
    pub start_date: String,
    pub end_date: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevenueReport {
    pub period: ReportPeriod,
    pub total_revenue: f64,
    pub monthly_breakdown: Vec<MonthlyRevenue>,
    pub average_booking_value: f64,
    pub generated_at: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OccupancyReport {
    pub current_occupancy_rate: i64,
    pub average_occupancy: i64,
    pub monthly_trend: Vec<OccupancyPoint>,
    pub active_guests: i64,
    pub generated_at: String,
}

// ── Response envelopes ──

#[derive(Debug, Serialize)]
pub struct MetricsResponse {
    pub analytics: MetricsSnapshot,
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub message: &'static str,
    pub analytics: MetricsSnapshot,
}

#[derive(Debug, Serialize)]
pub struct ReportResponse<T> {
    pub report: T,
}
