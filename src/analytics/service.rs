use crate::analytics::aggregator::MetricsAggregator;
use crate::analytics::cache::MetricsCache;
use crate::analytics::types::*;
use crate::analytics::AnalyticsError;
use chrono::SecondsFormat;

/// Read surface for metrics and reports.
pub struct ReportingService {
    aggregator: MetricsAggregator,
    cache: MetricsCache,
}

impl ReportingService {
    pub fn new(aggregator: MetricsAggregator, cache: MetricsCache) -> Self {
        Self { aggregator, cache }
    }

    /// Serve the cached snapshot, recomputing on a miss. An unreadable cache
    /// counts as a miss.
    pub async fn get_metrics(&self) -> Result<MetricsSnapshot, AnalyticsError> {
        match self.cache.get().await {
            Ok(Some(snapshot)) => {
                tracing::debug!(key = self.cache.key(), "metrics cache hit");
                return Ok(snapshot);
            }
            Ok(None) => tracing::debug!(key = self.cache.key(), "metrics cache miss"),
            Err(e) => {
                tracing::warn!(error = %e, "metrics cache unavailable, recomputing")
            }
        }
        self.aggregator.compute_snapshot().await
    }

    /// Recompute unconditionally, ignoring any cached snapshot.
    pub async fn refresh_metrics(&self) -> Result<MetricsSnapshot, AnalyticsError> {
        self.aggregator.compute_snapshot().await
    }

    /// Revenue summary for the requested period.
    ///
    /// The period is validated and echoed back, but figures cover all
    /// bookings; see [`average_booking_value`].
    pub async fn revenue_report(
        &self,
        start_date: Option<String>,
        end_date: Option<String>,
    ) -> Result<RevenueReport, AnalyticsError> {
        let period = report_period(start_date, end_date)?;
        let snapshot = self.aggregator.compute_snapshot().await?;
        Ok(revenue_report_from(snapshot, period, generated_at()))
    }

    pub async fn occupancy_report(&self) -> Result<OccupancyReport, AnalyticsError> {
        let snapshot = self.aggregator.compute_snapshot().await?;
        Ok(occupancy_report_from(snapshot, generated_at()))
    }
}

/// Both bounds are required; blank strings count as missing.
pub fn report_period(
    start_date: Option<String>,
    end_date: Option<String>,
) -> Result<ReportPeriod, AnalyticsError> {
    let present = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
    match (present(start_date), present(end_date)) {
        (Some(start_date), Some(end_date)) => Ok(ReportPeriod {
            start_date,
            end_date,
        }),
        _ => Err(AnalyticsError::Validation(
            "Start date and end date are required".to_string(),
        )),
    }
}

/// Rough per-booking estimate: `total_revenue / max(pending_bookings + 10, 1)`.
///
/// This is not a true average (completed bookings are not counted and a
/// constant 10 is added). Kept as-is until product confirms the intended
/// formula.
pub fn average_booking_value(total_revenue: f64, pending_bookings: i64) -> f64 {
    total_revenue / (pending_bookings + 10).max(1) as f64
}

pub fn revenue_report_from(
    snapshot: MetricsSnapshot,
    period: ReportPeriod,
    generated_at: String,
) -> RevenueReport {
    RevenueReport {
        period,
        total_revenue: snapshot.total_revenue,
        average_booking_value: average_booking_value(
            snapshot.total_revenue,
            snapshot.pending_bookings,
        ),
        monthly_breakdown: snapshot.monthly_revenue,
        generated_at,
    }
}

pub fn occupancy_report_from(snapshot: MetricsSnapshot, generated_at: String) -> OccupancyReport {
    OccupancyReport {
        current_occupancy_rate: snapshot.occupancy_rate,
        average_occupancy: snapshot.avg_occupancy,
        monthly_trend: snapshot.occupancy_trend,
        active_guests: snapshot.active_guests,
        generated_at,
    }
}

fn generated_at() -> String {
    chrono::Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
