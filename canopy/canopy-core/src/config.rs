//! Configuration for the Canopy similarity engine.
//!
//! Configuration is read from a TOML file (every section optional) and then
//! overridden by `CANOPY_*` environment variables:
//!
//! ```toml
//! [general]
//! log_level = "info"
//!
//! [pool]
//! num_workers = 4
//!
//! [distance]
//! algorithm = "pqGram"
//! pq_gram_p = 2
//! pq_gram_q = 3
//!
//! [selection]
//! max_combinations = 100000
//! ```
//!
//! # Example
//!
//! ```
//! use canopy_core::config::CanopyConfig;
//!
//! let config = CanopyConfig::from_toml_str("[pool]\nnum_workers = 2\n")?;
//! assert_eq!(config.pool.num_workers, 2);
//! assert_eq!(config.distance.pq_gram_p, 2);
//! # Ok::<(), canopy_core::CanopyError>(())
//! ```

use crate::error::{CanopyError, Result};
use crate::types::DistanceAlgorithm;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

/// Environment variables read by [`CanopyConfig::from_env`]
pub const ENV_LOG_LEVEL: &str = "CANOPY_LOG_LEVEL";
pub const ENV_WORKERS: &str = "CANOPY_WORKERS";
pub const ENV_DISTANCE_ALGORITHM: &str = "CANOPY_DISTANCE_ALGORITHM";
pub const ENV_PQ_P: &str = "CANOPY_PQ_P";
pub const ENV_PQ_Q: &str = "CANOPY_PQ_Q";
pub const ENV_MAX_COMBINATIONS: &str = "CANOPY_MAX_COMBINATIONS";

/// Ceiling on C(n, k) before the dissimilar-subset search refuses to run
pub const DEFAULT_MAX_COMBINATIONS: u64 = 100_000;

const VALID_LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanopyConfig {
    pub general: GeneralConfig,
    pub pool: PoolConfig,
    pub distance: DistanceConfig,
    pub selection: SelectionConfig,
}

/// General settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Criterion evaluation worker pool
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Number of worker threads (0 = available parallelism)
    pub num_workers: usize,
}

impl PoolConfig {
    /// Worker count with `0` resolved against the host's parallelism
    pub fn effective_workers(&self) -> usize {
        if self.num_workers > 0 {
            self.num_workers
        } else {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        }
    }
}

/// Distance engine settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DistanceConfig {
    /// Algorithm used when a request does not name one
    pub algorithm: DistanceAlgorithm,
    /// Number of ancestor labels in a pq-gram
    pub pq_gram_p: usize,
    /// Number of sibling labels in a pq-gram
    pub pq_gram_q: usize,
}

impl Default for DistanceConfig {
    fn default() -> Self {
        Self {
            algorithm: DistanceAlgorithm::default(),
            pq_gram_p: 2,
            pq_gram_q: 3,
        }
    }
}

/// Dissimilar-subset selection settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    pub max_combinations: u64,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            max_combinations: DEFAULT_MAX_COMBINATIONS,
        }
    }
}

impl CanopyConfig {
    /// Parse configuration from TOML text and validate it.
    ///
    /// Environment overrides are not applied.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| CanopyError::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file, apply environment overrides and validate.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if the
    /// resulting configuration is invalid.
    pub fn load(path: &Path) -> Result<Self> {
        debug!("Loading configuration from: {}", path.display());

        let content = std::fs::read_to_string(path)
            .map_err(|e| CanopyError::Config(format!("Failed to read config file: {}", e)))?;

        let mut config: Self = toml::from_str(&content)
            .map_err(|e| CanopyError::Config(format!("Failed to parse config file: {}", e)))?;

        config.apply_env_overrides()?;
        config.validate()?;

        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Default configuration with environment overrides applied
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `CANOPY_*` environment variable overrides.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(log_level) = lookup(ENV_LOG_LEVEL) {
            debug!("Overriding log_level from environment: {}", log_level);
            self.general.log_level = log_level;
        }

        if let Some(workers) = lookup(ENV_WORKERS) {
            debug!("Overriding num_workers from environment: {}", workers);
            self.pool.num_workers = parse_number(ENV_WORKERS, &workers)?;
        }

        if let Some(algorithm) = lookup(ENV_DISTANCE_ALGORITHM) {
            debug!("Overriding distance algorithm from environment: {}", algorithm);
            self.distance.algorithm = algorithm.parse()?;
        }

        if let Some(p) = lookup(ENV_PQ_P) {
            self.distance.pq_gram_p = parse_number(ENV_PQ_P, &p)?;
        }

        if let Some(q) = lookup(ENV_PQ_Q) {
            self.distance.pq_gram_q = parse_number(ENV_PQ_Q, &q)?;
        }

        if let Some(max) = lookup(ENV_MAX_COMBINATIONS) {
            debug!("Overriding max_combinations from environment: {}", max);
            self.selection.max_combinations = parse_number(ENV_MAX_COMBINATIONS, &max)?;
        }

        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if !VALID_LOG_LEVELS.contains(&self.general.log_level.as_str()) {
            return Err(CanopyError::Config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.general.log_level,
                VALID_LOG_LEVELS.join(", ")
            )));
        }

        if self.distance.pq_gram_p == 0 || self.distance.pq_gram_q == 0 {
            return Err(CanopyError::Config(
                "pq_gram_p and pq_gram_q must be greater than 0".to_string(),
            ));
        }

        if self.selection.max_combinations == 0 {
            return Err(CanopyError::Config(
                "max_combinations must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| CanopyError::Config(format!("{} must be a number, got '{}'", key, value)))
}
