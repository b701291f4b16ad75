//! Application configuration management.

use chrono_tz::Tz;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::error::{AppError, AppResult};

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Storage backend selection.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Settlement engine defaults.
    #[serde(default)]
    pub settlement: SettlementConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    #[serde(default)]
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
        }
    }
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// Where settlements are persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// PostgreSQL through SeaORM.
    #[default]
    Postgres,
    /// Process-local map, lost on restart. Development only.
    Memory,
}

/// Storage configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StorageConfig {
    /// Selected backend.
    #[serde(default)]
    pub backend: StorageBackend,
}

/// Settlement engine configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SettlementConfig {
    /// Deduction rate applied when a submission omits one.
    #[serde(default = "default_deduction_rate")]
    pub default_deduction_rate_percent: Decimal,
    /// IANA timezone that defines a business day for reference values.
    #[serde(default = "default_timezone")]
    pub business_timezone: Tz,
    /// Maximum in-flight submissions while persisting a batch.
    #[serde(default = "default_batch_concurrency")]
    pub batch_concurrency: usize,
    /// Maximum number of memoized carry-over seeds.
    #[serde(default = "default_seed_cache_capacity")]
    pub seed_cache_capacity: u64,
    /// Time-to-live of a memoized seed in seconds.
    #[serde(default = "default_seed_cache_ttl")]
    pub seed_cache_ttl_secs: u64,
}

impl Default for SettlementConfig {
    fn default() -> Self {
        Self {
            default_deduction_rate_percent: default_deduction_rate(),
            business_timezone: default_timezone(),
            batch_concurrency: default_batch_concurrency(),
            seed_cache_capacity: default_seed_cache_capacity(),
            seed_cache_ttl_secs: default_seed_cache_ttl(),
        }
    }
}

fn default_deduction_rate() -> Decimal {
    Decimal::TEN
}

fn default_timezone() -> Tz {
    chrono_tz::Asia::Kolkata
}

fn default_batch_concurrency() -> usize {
    4
}

fn default_seed_cache_capacity() -> u64 {
    1_000
}

fn default_seed_cache_ttl() -> u64 {
    300 // 5 minutes
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded or fails validation.
    pub fn load() -> AppResult<Self> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("BAHI").separator("__"))
            .build()?;

        let loaded: Self = config.try_deserialize()?;
        loaded.settlement.validate()?;
        Ok(loaded)
    }
}

impl SettlementConfig {
    /// Checks the settlement settings are usable.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] naming the first bad setting.
    pub fn validate(&self) -> AppResult<()> {
        if self.default_deduction_rate_percent < Decimal::ZERO
            || self.default_deduction_rate_percent > Decimal::ONE_HUNDRED
        {
            return Err(AppError::Validation(format!(
                "default_deduction_rate_percent must be between 0 and 100, got {}",
                self.default_deduction_rate_percent
            )));
        }
        if self.batch_concurrency == 0 {
            return Err(AppError::Validation(
                "batch_concurrency must be at least 1".into(),
            ));
        }
        if self.seed_cache_capacity == 0 {
            return Err(AppError::Validation(
                "seed_cache_capacity must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
