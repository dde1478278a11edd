//! Configuration types for excel-export
//!
//! All settings carry serde defaults so a partial (or empty) configuration
//! deserializes into a working setup.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use utoipa::ToSchema;

use crate::error::{Error, Result};

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct Config {
    /// Export pipeline settings
    #[serde(default)]
    pub export: ExportConfig,

    /// Status cache settings
    #[serde(default)]
    pub cache: CacheConfig,

    /// Memory sampler settings
    #[serde(default)]
    pub sampler: SamplerConfig,

    /// Task store settings
    #[serde(default)]
    pub persistence: PersistenceConfig,

    /// REST API settings
    #[serde(default)]
    pub api: ApiConfig,
}

impl Config {
    /// Validate the configuration, returning the first violated setting
    pub fn validate(&self) -> Result<()> {
        if self.export.batch_size == 0 {
            return Err(Error::Config {
                message: "batch_size must be greater than zero".to_string(),
                key: Some("export.batch_size".to_string()),
            });
        }
        if self.export.max_concurrent_tasks == 0 {
            return Err(Error::Config {
                message: "max_concurrent_tasks must be greater than zero".to_string(),
                key: Some("export.max_concurrent_tasks".to_string()),
            });
        }
        if self.cache.ttl_minutes == 0 {
            return Err(Error::Config {
                message: "ttl_minutes must be greater than zero".to_string(),
                key: Some("cache.ttl_minutes".to_string()),
            });
        }
        if !(0.0..=1.0).contains(&self.sampler.high_watermark)
            || !(0.0..=1.0).contains(&self.sampler.low_watermark)
        {
            return Err(Error::Config {
                message: "watermarks must be ratios within [0, 1]".to_string(),
                key: Some("sampler.high_watermark".to_string()),
            });
        }
        if self.sampler.low_watermark > self.sampler.high_watermark {
            return Err(Error::Config {
                message: "low_watermark must not exceed high_watermark".to_string(),
                key: Some("sampler.low_watermark".to_string()),
            });
        }
        Ok(())
    }
}

/// Export pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ExportConfig {
    /// Rows fetched and written per batch
    #[serde(default = "default_batch_size")]
    pub batch_size: u64,

    /// Directory artifacts are written to (created on startup)
    #[serde(default = "default_temp_dir")]
    #[schema(value_type = String)]
    pub temp_dir: PathBuf,

    /// Soft ceiling on concurrently processing export tasks
    #[serde(default = "default_max_concurrent_tasks")]
    pub max_concurrent_tasks: usize,

    /// Run the memory-pressure hook every this many batches
    #[serde(default = "default_memory_check_interval")]
    pub memory_check_interval: u64,

    /// Task name used when a request omits one
    #[serde(default = "default_task_name")]
    pub default_task_name: String,

    /// Creator identity used when a request omits one
    #[serde(default = "default_creator")]
    pub default_creator: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            temp_dir: default_temp_dir(),
            max_concurrent_tasks: default_max_concurrent_tasks(),
            memory_check_interval: default_memory_check_interval(),
            default_task_name: default_task_name(),
            default_creator: default_creator(),
        }
    }
}

fn default_batch_size() -> u64 {
    10_000
}

fn default_temp_dir() -> PathBuf {
    PathBuf::from("./exports/tmp")
}

fn default_max_concurrent_tasks() -> usize {
    5
}

fn default_memory_check_interval() -> u64 {
    20
}

fn default_task_name() -> String {
    "data export".to_string()
}

fn default_creator() -> String {
    "system".to_string()
}

/// Status cache configuration
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CacheConfig {
    /// How long a cached snapshot stays valid
    #[serde(default = "default_ttl_minutes")]
    pub ttl_minutes: u64,

    /// How often the expired-entry sweep runs
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_minutes: default_ttl_minutes(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

fn default_ttl_minutes() -> u64 {
    30
}

fn default_sweep_interval_secs() -> u64 {
    60
}

/// Memory sampler configuration
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SamplerConfig {
    /// Sampling interval in milliseconds
    #[serde(default = "default_sample_interval_ms")]
    pub interval_ms: u64,

    /// Used/total ratio above which the mitigation hook yields and logs
    #[serde(default = "default_high_watermark")]
    pub high_watermark: f64,

    /// Used/total ratio above which the mitigation hook warns
    #[serde(default = "default_low_watermark")]
    pub low_watermark: f64,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_sample_interval_ms(),
            high_watermark: default_high_watermark(),
            low_watermark: default_low_watermark(),
        }
    }
}

fn default_sample_interval_ms() -> u64 {
    100
}

fn default_high_watermark() -> f64 {
    0.75
}

fn default_low_watermark() -> f64 {
    0.60
}

/// Task store configuration
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PersistenceConfig {
    /// Path to the SQLite task database
    #[serde(default = "default_database_path")]
    #[schema(value_type = String)]
    pub database_path: PathBuf,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

fn default_database_path() -> PathBuf {
    PathBuf::from("./exports/tasks.db")
}

/// REST API configuration
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiConfig {
    /// Address the HTTP server binds to
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Whether to serve the interactive Swagger UI
    #[serde(default = "default_swagger_ui")]
    pub swagger_ui: bool,

    /// Allowed CORS origins; "*" or an empty list allows any origin
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            swagger_ui: default_swagger_ui(),
            cors_origins: Vec::new(),
        }
    }
}

fn default_bind_address() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_swagger_ui() -> bool {
    true
}
