use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub analytics: AnalyticsConfig,
    #[serde(default)]
    pub cors: CorsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub path: PathBuf,
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,
}

fn default_pool_size() -> usize {
    8
}

/// Metrics aggregation and snapshot caching.
#[derive(Debug, Deserialize, Clone)]
pub struct AnalyticsConfig {
    /// Room inventory used as the occupancy divisor.
    #[serde(default = "default_total_rooms")]
    pub total_rooms: u32,
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_secs: u64,
    #[serde(default = "default_cache_key")]
    pub cache_key: String,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            total_rooms: default_total_rooms(),
            cache_ttl_secs: default_cache_ttl(),
            cache_key: default_cache_key(),
        }
    }
}

fn default_total_rooms() -> u32 {
    100
}
fn default_cache_ttl() -> u64 {
    300 // 5 minutes
}
fn default_cache_key() -> String {
    "current_metrics".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    #[serde(default = "default_allowed_origin")]
    pub allowed_origin: String,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origin: default_allowed_origin(),
        }
    }
}

fn default_allowed_origin() -> String {
    "http://localhost:5173".to_string()
}

impl AppConfig {
    /// Reject values that would make the service misbehave at runtime.
    pub fn validate(&self) -> Result<(), String> {
        if self.analytics.total_rooms == 0 {
            return Err("analytics.total_rooms must be greater than zero. \
                 Set it in config.toml or via HOTELIER__ANALYTICS__TOTAL_ROOMS env var."
                .to_string());
        }
        if self.analytics.cache_ttl_secs == 0 {
            return Err("analytics.cache_ttl_secs must be greater than zero".to_string());
        }
        if self.analytics.cache_key.trim().is_empty() {
            return Err("analytics.cache_key must not be empty".to_string());
        }
        if self.database.pool_size == 0 {
            return Err("database.pool_size must be greater than zero".to_string());
        }
        if self
            .cors
            .allowed_origin
            .parse::<axum::http::HeaderValue>()
            .is_err()
        {
            return Err(format!(
                "cors.allowed_origin is not a valid origin: {}",
                self.cors.allowed_origin
            ));
        }
        Ok(())
    }

    pub fn load(config_path: Option<&str>) -> Result<Self, config::ConfigError> {
        let mut builder = Config::builder();

        // Load from config file
        let path = config_path.unwrap_or("config.toml");
        builder = builder.add_source(File::with_name(path).required(false));

        // Overlay with environment variables (HOTELIER__SERVER__PORT=5001, etc.)
        builder = builder.add_source(
            Environment::with_prefix("HOTELIER")
                .separator("__")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }
}
