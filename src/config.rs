//! Runtime configuration
//!
//! Centralized configuration with TOML file loading, environment variable
//! overrides, runtime defaults, and validation. The CLI layer resolves the
//! billing period and account; everything tunable about how collection
//! runs lives here.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::info;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Logging configuration
    pub logging: LoggingConfig,

    /// Collection configuration
    pub collect: CollectConfig,

    /// Storage configuration
    pub storage: StorageConfig,

    /// Paths configuration
    pub paths: PathsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
    pub output: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectConfig {
    /// Aggregation window size in whole hours.
    pub window_hours: i64,
    /// Maximum simultaneous object fetches within one window.
    pub concurrency: usize,
    /// Permit report generation for an in-progress billing period.
    pub allow_incomplete: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Bucket/container name, or root directory for the local backend.
    pub bucket: String,
    /// Custom endpoint override for backends that support one.
    pub endpoint: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    pub log_directory: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            logging: LoggingConfig {
                level: "ERROR".to_string(),
                format: "pretty".to_string(),
                output: "console".to_string(),
            },
            collect: CollectConfig {
                window_hours: 1,
                concurrency: 10,
                allow_incomplete: false,
            },
            storage: StorageConfig {
                bucket: String::new(),
                endpoint: None,
            },
            paths: PathsConfig {
                log_directory: PathBuf::from("logs"),
            },
        }
    }
}

impl Config {
    /// Load configuration from file, environment, and defaults.
    pub fn load() -> Result<Self> {
        let mut config = Config::default();

        let config_paths = [
            PathBuf::from("usage-meter.toml"),
            PathBuf::from(".usage-meter.toml"),
        ];
        for path in &config_paths {
            if path.exists() {
                info!(config_file = %path.display(), "Loading configuration from file");
                config = Self::load_from_file(path)?;
                break;
            }
        }

        config.apply_env_overrides()?;
        config.validate()?;

        Ok(config)
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(val) = env::var("LOG_LEVEL") {
            self.logging.level = val;
        }
        if let Ok(val) = env::var("LOG_FORMAT") {
            self.logging.format = val;
        }
        if let Ok(val) = env::var("LOG_OUTPUT") {
            self.logging.output = val;
        }

        if let Ok(val) = env::var("USAGE_METER_WINDOW_HOURS") {
            self.collect.window_hours = val.parse().context("Invalid USAGE_METER_WINDOW_HOURS")?;
        }
        if let Ok(val) = env::var("USAGE_METER_CONCURRENCY") {
            self.collect.concurrency = val.parse().context("Invalid USAGE_METER_CONCURRENCY")?;
        }
        if let Ok(val) = env::var("USAGE_METER_ALLOW_INCOMPLETE") {
            self.collect.allow_incomplete =
                val.parse().context("Invalid USAGE_METER_ALLOW_INCOMPLETE")?;
        }

        if let Ok(val) = env::var("USAGE_METER_BUCKET") {
            self.storage.bucket = val;
        }
        if let Ok(val) = env::var("USAGE_METER_ENDPOINT") {
            self.storage.endpoint = Some(val);
        }
        if let Ok(val) = env::var("USAGE_METER_LOG_DIR") {
            self.paths.log_directory = PathBuf::from(val);
        }

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.collect.window_hours < 1 {
            anyhow::bail!(
                "Window must be at least 1 hour, got {}",
                self.collect.window_hours
            );
        }
        if self.collect.concurrency == 0 {
            anyhow::bail!("Concurrency must be greater than 0");
        }
        Ok(())
    }
}

/// Global configuration instance
static CONFIG: OnceLock<Config> = OnceLock::new();

/// Get the global configuration instance
pub fn get_config() -> &'static Config {
    CONFIG.get_or_init(|| {
        Config::load().expect("Failed to load configuration")
    })
}
