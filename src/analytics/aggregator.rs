use crate::analytics::cache::MetricsCache;
use crate::analytics::conn::SqliteReader;
use crate::analytics::queries;
use crate::analytics::satisfaction::SatisfactionSource;
use crate::analytics::types::*;
use crate::analytics::AnalyticsError;
use chrono::Datelike;
use rusqlite::Connection;
use std::sync::Arc;

/// Satisfaction reported when no category scores are available.
const DEFAULT_SATISFACTION: f64 = 4.5;

/// Computes [`MetricsSnapshot`]s from the current store contents and writes
/// each successful result into the [`MetricsCache`].
pub struct MetricsAggregator {
    reader: SqliteReader,
    cache: MetricsCache,
    satisfaction: Arc<dyn SatisfactionSource>,
    total_rooms: u32,
    cache_ttl_secs: u64,
}

impl MetricsAggregator {
    pub fn new(
        reader: SqliteReader,
        cache: MetricsCache,
        satisfaction: Arc<dyn SatisfactionSource>,
        total_rooms: u32,
        cache_ttl_secs: u64,
    ) -> Self {
        Self {
            reader,
            cache,
            satisfaction,
            total_rooms,
            cache_ttl_secs,
        }
    }

    /// Compute a fresh snapshot for the current calendar year.
    ///
    /// All queries must succeed; any failure yields
    /// [`AnalyticsError::Computation`] and nothing is cached.
    pub async fn compute_snapshot(&self) -> Result<MetricsSnapshot, AnalyticsError> {
        let year = chrono::Utc::now().year().to_string();
        let year_for_occupancy = year.clone();

        let (active_guests, total_revenue, pending_bookings, revenue_rows, check_in_rows, repeat) =
            tokio::try_join!(
                self.fetch("active_guests", |conn| {
                    conn.query_row(queries::ACTIVE_GUESTS_SQL, [], |row| row.get::<_, i64>(0))
                }),
                self.fetch("total_revenue", |conn| {
                    conn.query_row(queries::TOTAL_REVENUE_SQL, [], |row| row.get::<_, f64>(0))
                }),
                self.fetch("pending_bookings", |conn| {
                    conn.query_row(queries::PENDING_BOOKINGS_SQL, [], |row| {
                        row.get::<_, i64>(0)
                    })
                }),
                self.fetch("monthly_revenue", move |conn| {
                    let mut stmt = conn.prepare(queries::MONTHLY_REVENUE_SQL)?;
                    let rows = stmt.query_map([&year], |row| {
                        Ok((row.get::<_, i64>(0)?, row.get::<_, f64>(1)?))
                    })?;
                    rows.collect::<Result<Vec<_>, _>>()
                }),
                self.fetch("monthly_occupancy", move |conn| {
                    let mut stmt = conn.prepare(queries::MONTHLY_CHECK_INS_SQL)?;
                    let rows = stmt.query_map([&year_for_occupancy], |row| {
                        Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?))
                    })?;
                    rows.collect::<Result<Vec<_>, _>>()
                }),
                self.fetch("repeat_guests", |conn| {
                    conn.query_row(queries::REPEAT_GUESTS_SQL, [], |row| {
                        Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?))
                    })
                }),
            )?;

        let customer_satisfaction = self.satisfaction.category_scores();
        let occupancy_trend = occupancy_trend(&check_in_rows, self.total_rooms);

        let snapshot = MetricsSnapshot {
            active_guests,
            total_revenue,
            occupancy_rate: occupancy_rate(active_guests, self.total_rooms),
            pending_bookings,
            avg_occupancy: average_occupancy(&occupancy_trend),
            repeat_guests: repeat_guest_percentage(repeat.0, repeat.1),
            satisfaction: overall_satisfaction(&customer_satisfaction),
            monthly_revenue: monthly_revenue(&revenue_rows),
            occupancy_trend,
            customer_satisfaction,
        };

        if let Err(e) = self.cache.put(&snapshot, self.cache_ttl_secs).await {
            tracing::warn!(error = %e, key = self.cache.key(), "failed to cache metrics snapshot");
        }

        tracing::info!(
            active_guests = snapshot.active_guests,
            pending_bookings = snapshot.pending_bookings,
            "analytics metrics calculated"
        );
        Ok(snapshot)
    }

    async fn fetch<F, T>(&self, what: &'static str, f: F) -> Result<T, AnalyticsError>
    where
        F: FnOnce(&Connection) -> Result<T, rusqlite::Error> + Send + 'static,
        T: Send + 'static,
    {
        self.reader.query(f).await.map_err(|e| {
            tracing::error!(query = what, error = %e, "metrics query failed");
            AnalyticsError::Computation(format!("{what}: {e}"))
        })
    }
}

/// Percentage of `count` over `total_rooms`, rounded and capped at 100.
pub fn occupancy_rate(count: i64, total_rooms: u32) -> i64 {
    if total_rooms == 0 {
        return 0;
    }
    let rate = (count as f64 / total_rooms as f64 * 100.0).round() as i64;
    rate.clamp(0, 100)
}

/// Expand sparse `(month_num, revenue)` rows to Jan..Dec, zero-filling gaps.
pub fn monthly_revenue(rows: &[(i64, f64)]) -> Vec<MonthlyRevenue> {
    let mut by_month = [0.0_f64; 12];
    for &(month_num, revenue) in rows {
        if let Some(slot) = month_index(month_num).and_then(|i| by_month.get_mut(i)) {
            *slot = revenue;
        }
    }
    MONTH_LABELS
        .iter()
        .zip(by_month)
        .map(|(month, revenue)| MonthlyRevenue {
            month: month.to_string(),
            revenue,
        })
        .collect()
}

/// Expand sparse `(month_num, check_ins)` rows to a Jan..Dec occupancy trend.
pub fn occupancy_trend(rows: &[(i64, i64)], total_rooms: u32) -> Vec<OccupancyPoint> {
    let mut by_month = [0_i64; 12];
    for &(month_num, check_ins) in rows {
        if let Some(slot) = month_index(month_num).and_then(|i| by_month.get_mut(i)) {
            *slot = check_ins;
        }
    }
    MONTH_LABELS
        .iter()
        .zip(by_month)
        .map(|(month, check_ins)| OccupancyPoint {
            month: month.to_string(),
            rate: occupancy_rate(check_ins, total_rooms),
        })
        .collect()
}

pub fn average_occupancy(trend: &[OccupancyPoint]) -> i64 {
    if trend.is_empty() {
        return 0;
    }
    let sum: i64 = trend.iter().map(|p| p.rate).sum();
    (sum as f64 / trend.len() as f64).round() as i64
}

pub fn repeat_guest_percentage(total_customers: i64, repeat_customers: i64) -> i64 {
    if total_customers <= 0 {
        return 0;
    }
    (repeat_customers as f64 / total_customers as f64 * 100.0).round() as i64
}

/// Mean category score rounded to one decimal place.
pub fn overall_satisfaction(scores: &[CategoryScore]) -> f64 {
    if scores.is_empty() {
        return DEFAULT_SATISFACTION;
    }
    let mean = scores.iter().map(|s| s.score).sum::<f64>() / scores.len() as f64;
    (mean * 10.0).round() / 10.0
}

fn month_index(month_num: i64) -> Option<usize> {
    (1..=12)
        .contains(&month_num)
        .then(|| (month_num - 1) as usize)
}
