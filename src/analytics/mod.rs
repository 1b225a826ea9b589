pub mod aggregator;
pub mod cache;
pub mod conn;
pub mod handler;
pub mod queries;
pub mod satisfaction;
pub mod service;
pub mod types;

use crate::config::AnalyticsConfig;
use aggregator::MetricsAggregator;
use cache::MetricsCache;
use conn::SqliteReader;
use deadpool_sqlite::Pool;
use satisfaction::{SatisfactionSource, StaticSatisfaction};
use service::ReportingService;
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum AnalyticsError {
    /// A required aggregate query failed; no snapshot was produced.
    #[error("metrics computation failed: {0}")]
    Computation(String),

    #[error("{0}")]
    Validation(String),

    /// The cache slot could not be read or written.
    #[error("metrics cache unavailable: {0}")]
    CacheUnavailable(String),
}

/// Shared state for analytics endpoints.
pub struct AnalyticsState {
    pub reporting: ReportingService,
}

impl AnalyticsState {
    pub fn new(pool: Pool, config: &AnalyticsConfig) -> Self {
        Self::with_satisfaction(pool, config, Arc::new(StaticSatisfaction))
    }

    pub fn with_satisfaction(
        pool: Pool,
        config: &AnalyticsConfig,
        satisfaction: Arc<dyn SatisfactionSource>,
    ) -> Self {
        let cache = MetricsCache::new(pool.clone(), config.cache_key.clone());
        let aggregator = MetricsAggregator::new(
            SqliteReader::new(pool),
            cache.clone(),
            satisfaction,
            config.total_rooms,
            config.cache_ttl_secs,
        );
        Self {
            reporting: ReportingService::new(aggregator, cache),
        }
    }
}
