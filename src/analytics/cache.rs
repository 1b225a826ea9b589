use crate::analytics::conn::SqliteReader;
use crate::analytics::types::MetricsSnapshot;
use crate::analytics::AnalyticsError;
use deadpool_sqlite::Pool;
use rusqlite::{params, OptionalExtension};

/// Single-slot snapshot cache stored as one row of `analytics_cache`.
///
/// Freshness is decided only by the row's `expires_at`; there is no separate
/// invalidation signal. Writes are unconditional upserts, so concurrent
/// writers resolve as last-writer-wins.
#[derive(Clone)]
pub struct MetricsCache {
    reader: SqliteReader,
    key: String,
}

impl MetricsCache {
    pub fn new(pool: Pool, key: impl Into<String>) -> Self {
        Self::with_reader(SqliteReader::new(pool), key)
    }

    pub fn with_reader(reader: SqliteReader, key: impl Into<String>) -> Self {
        Self {
            reader,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Store `snapshot` with `expires_at = now + ttl_secs`.
    pub async fn put(&self, snapshot: &MetricsSnapshot, ttl_secs: u64) -> Result<(), AnalyticsError> {
        self.put_at(snapshot, ttl_secs, now_ms()).await
    }

    /// Return the cached snapshot if it has not expired.
    pub async fn get(&self) -> Result<Option<MetricsSnapshot>, AnalyticsError> {
        self.get_at(now_ms()).await
    }

    pub(crate) async fn put_at(
        &self,
        snapshot: &MetricsSnapshot,
        ttl_secs: u64,
        now_ms: i64,
    ) -> Result<(), AnalyticsError> {
        let data = serde_json::to_string(snapshot)
            .map_err(|e| AnalyticsError::CacheUnavailable(format!("serialize: {e}")))?;
        let ttl_ms = i64::try_from(ttl_secs)
            .unwrap_or(i64::MAX)
            .saturating_mul(1000);
        let expires_at = now_ms.saturating_add(ttl_ms);
        let key = self.key.clone();

        self.reader
            .query(move |conn| {
                conn.execute(
                    "INSERT INTO analytics_cache (cache_key, data, expires_at, updated_at)
                     VALUES (?1, ?2, ?3, ?4)
                     ON CONFLICT (cache_key) DO UPDATE SET
                        data = excluded.data,
                        expires_at = excluded.expires_at,
                        updated_at = excluded.updated_at",
                    params![key, data, expires_at, now_ms],
                )
            })
            .await
            .map_err(unavailable)?;

        Ok(())
    }

    pub(crate) async fn get_at(&self, now_ms: i64) -> Result<Option<MetricsSnapshot>, AnalyticsError> {
        let key = self.key.clone();
        let row: Option<String> = self
            .reader
            .query(move |conn| {
                conn.query_row(
                    "SELECT data FROM analytics_cache WHERE cache_key = ?1 AND expires_at > ?2",
                    params![key, now_ms],
                    |row| row.get(0),
                )
                .optional()
            })
            .await
            .map_err(unavailable)?;

        match row {
            Some(data) => serde_json::from_str(&data)
                .map(Some)
                .map_err(|e| AnalyticsError::CacheUnavailable(format!("cache deserialize: {e}"))),
            None => Ok(None),
        }
    }
}

fn unavailable(e: impl std::fmt::Display) -> AnalyticsError {
    AnalyticsError::CacheUnavailable(e.to_string())
}

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::types::{CategoryScore, MonthlyRevenue, OccupancyPoint, MONTH_LABELS};
    use crate::storage::sqlite::test_pool;

    fn snapshot(active_guests: i64) -> MetricsSnapshot {
        MetricsSnapshot {
            active_guests,
            total_revenue: 1250.5,
            occupancy_rate: active_guests,
            pending_bookings: 4,
            avg_occupancy: 12,
            repeat_guests: 25,
            satisfaction: 4.5,
            monthly_revenue: MONTH_LABELS
                .iter()
                .map(|m| MonthlyRevenue {
                    month: m.to_string(),
                    revenue: 0.0,
                })
                .collect(),
            occupancy_trend: MONTH_LABELS
                .iter()
                .map(|m| OccupancyPoint {
                    month: m.to_string(),
                    rate: 0,
                })
                .collect(),
            customer_satisfaction: vec![CategoryScore {
                category: "Service".to_string(),
                score: 4.5,
            }],
        }
    }

    #[tokio::test]
    async fn test_empty_slot_is_absent() {
        let (pool, _dir) = test_pool().await;
        let cache = MetricsCache::new(pool, "current_metrics");
        assert_eq!(cache.get().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_put_then_get_returns_same_snapshot() {
        let (pool, _dir) = test_pool().await;
        let cache = MetricsCache::new(pool, "current_metrics");
        let stored = snapshot(42);

        cache.put(&stored, 300).await.unwrap();
        let loaded = cache.get().await.unwrap();
        assert_eq!(loaded, Some(stored));
    }

    #[tokio::test]
    async fn test_round_trip_keeps_inexact_sums() {
        let (pool, _dir) = test_pool().await;
        let cache = MetricsCache::new(pool, "current_metrics");
        let mut stored = snapshot(42);
        stored.total_revenue = 254703.18000000002;
        stored.monthly_revenue[2].revenue = 912630.1799999999;
        stored.monthly_revenue[5].revenue = 0.1 + 0.2;

        cache.put(&stored, 300).await.unwrap();
        let loaded = cache.get().await.unwrap().unwrap();
        assert_eq!(loaded.total_revenue.to_bits(), stored.total_revenue.to_bits());
        assert_eq!(loaded, stored);
    }

    #[tokio::test]
    async fn test_huge_ttl_does_not_wrap() {
        let (pool, _dir) = test_pool().await;
        let cache = MetricsCache::new(pool, "current_metrics");
        let written_at = 1_700_000_000_000;
        cache.put_at(&snapshot(9), u64::MAX, written_at).await.unwrap();

        assert!(cache.get_at(written_at + 1).await.unwrap().is_some());
        assert!(cache.get_at(i64::MAX - 1).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_stuck_store_times_out_as_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let config = crate::config::DatabaseConfig {
            path: dir.path().join("single.db"),
            pool_size: 1,
        };
        let pool = crate::storage::sqlite::create_pool(&config).unwrap();
        crate::storage::sqlite::init_pool(&pool).await.unwrap();

        // Hold the only connection so the cache cannot check one out
        let _held = pool.get().await.unwrap();
        let reader = SqliteReader::with_timeout(pool.clone(), std::time::Duration::from_millis(50));
        let cache = MetricsCache::with_reader(reader, "current_metrics");

        match cache.get().await {
            Err(AnalyticsError::CacheUnavailable(msg)) => assert!(msg.contains("timed out")),
            other => panic!("expected timeout, got {other:?}"),
        }
        assert!(matches!(
            cache.put(&snapshot(1), 300).await,
            Err(AnalyticsError::CacheUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_expired_exactly_at_expiry_instant() {
        let (pool, _dir) = test_pool().await;
        let cache = MetricsCache::new(pool, "current_metrics");
        let written_at = 1_700_000_000_000;
        cache.put_at(&snapshot(7), 300, written_at).await.unwrap();

        let expires_at = written_at + 300_000;
        assert!(cache.get_at(expires_at - 1).await.unwrap().is_some());
        assert!(cache.get_at(expires_at).await.unwrap().is_none());
        assert!(cache.get_at(expires_at + 1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_put_overwrites_previous_value() {
        let (pool, _dir) = test_pool().await;
        let cache = MetricsCache::new(pool.clone(), "current_metrics");
        cache.put(&snapshot(1), 300).await.unwrap();
        cache.put(&snapshot(2), 300).await.unwrap();

        assert_eq!(cache.get().await.unwrap().unwrap().active_guests, 2);

        // Upsert keeps a single row for the key
        let conn = pool.get().await.unwrap();
        let rows: i64 = conn
            .interact(|conn| {
                conn.query_row(
                    "SELECT COUNT(*) FROM analytics_cache WHERE cache_key = 'current_metrics'",
                    [],
                    |row| row.get(0),
                )
            })
            .await
            .unwrap()
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[tokio::test]
    async fn test_put_with_shorter_ttl_replaces_expiry() {
        let (pool, _dir) = test_pool().await;
        let cache = MetricsCache::new(pool, "current_metrics");
        let t0 = 1_700_000_000_000;
        cache.put_at(&snapshot(1), 300, t0).await.unwrap();
        cache.put_at(&snapshot(2), 10, t0).await.unwrap();

        assert!(cache.get_at(t0 + 11_000).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_keys_are_independent() {
        let (pool, _dir) = test_pool().await;
        let current = MetricsCache::new(pool.clone(), "current_metrics");
        let other = MetricsCache::new(pool, "other_metrics");
        current.put(&snapshot(3), 300).await.unwrap();

        assert!(other.get().await.unwrap().is_none());
        assert_eq!(current.key(), "current_metrics");
    }

    #[tokio::test]
    async fn test_missing_table_reports_unavailable() {
        let (pool, _dir) = test_pool().await;
        let conn = pool.get().await.unwrap();
        conn.interact(|conn| conn.execute_batch("DROP TABLE analytics_cache"))
            .await
            .unwrap()
            .unwrap();
        drop(conn);

        let cache = MetricsCache::new(pool, "current_metrics");
        let err = cache.get().await.unwrap_err();
        assert!(matches!(err, AnalyticsError::CacheUnavailable(_)));
    }

    #[tokio::test]
    async fn test_corrupt_row_reports_unavailable() {
        let (pool, _dir) = test_pool().await;
        let conn = pool.get().await.unwrap();
        conn.interact(|conn| {
            conn.execute(
                "INSERT INTO analytics_cache (cache_key, data, expires_at, updated_at)
                 VALUES ('current_metrics', 'not json', 9223372036854775807, 0)",
                [],
            )
        })
        .await
        .unwrap()
        .unwrap();
        drop(conn);

        let cache = MetricsCache::new(pool, "current_metrics");
        assert!(matches!(
            cache.get().await,
            Err(AnalyticsError::CacheUnavailable(_))
        ));
    }
}
