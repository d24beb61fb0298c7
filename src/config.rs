//! Configuration management for the expression engine
//!
//! Settings load from a TOML file, can be overridden from environment
//! variables, and fall back to sensible defaults for every field.
//!
//! ```toml
//! interpolation = "lerp"
//! skip_missing = false
//! log_rankings = false
//! max_input_series = 100000
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::aggregation::Interpolation;
use crate::error::{Error, Result};

/// Engine configuration shared by every function in a registry
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct EngineConfig {
    /// How merged series fill timestamps they have no sample for
    #[serde(default)]
    pub interpolation: Interpolation,

    /// Only merge samples that actually exist at a timestamp
    #[serde(default)]
    pub skip_missing: bool,

    /// Log top-K ranking tables at info instead of debug
    #[serde(default)]
    pub log_rankings: bool,

    /// Maximum flattened series per evaluation (0 = unlimited)
    #[serde(default = "default_max_input_series")]
    pub max_input_series: usize,
}

fn default_max_input_series() -> usize {
    100_000
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            interpolation: Interpolation::default(),
            skip_missing: false,
            log_rankings: false,
            max_input_series: default_max_input_series(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;

        toml::from_str(&contents).map_err(|e| {
            Error::Configuration(format!(
                "Failed to parse config file {}: {}",
                path.display(),
                e
            ))
        })
    }

    /// Load configuration with environment variable overrides
    pub fn from_file_with_env(path: impl AsRef<Path>) -> Result<Self> {
        let mut config = Self::from_file(path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Load from environment variables only
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env_overrides();
        config
    }

    /// Apply environment variable overrides
    ///
    /// Unparseable values are ignored and the current setting is kept.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("KUBA_EXPR_INTERPOLATION") {
            if let Ok(i) = v.parse() {
                self.interpolation = i;
            }
        }
        if let Ok(v) = std::env::var("KUBA_EXPR_SKIP_MISSING") {
            if let Ok(b) = v.parse() {
                self.skip_missing = b;
            }
        }
        if let Ok(v) = std::env::var("KUBA_EXPR_LOG_RANKINGS") {
            if let Ok(b) = v.parse() {
                self.log_rankings = b;
            }
        }
        if let Ok(v) = std::env::var("KUBA_EXPR_MAX_INPUT_SERIES") {
            if let Ok(n) = v.parse() {
                self.max_input_series = n;
            }
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.skip_missing && self.interpolation != Interpolation::Lerp {
            return Err(Error::Configuration(format!(
                "interpolation '{}' has no effect when skip_missing is set",
                self.interpolation
            )));
        }
        Ok(())
    }

    /// Check a flattened input size against `max_input_series`
    pub fn check_input_size(&self, series: usize) -> Result<()> {
        if self.max_input_series != 0 && series > self.max_input_series {
            return Err(Error::invalid_argument(format!(
                "{} input series exceeds the limit of {}",
                series, self.max_input_series
            )));
        }
        Ok(())
    }

    /// Save configuration to a TOML file
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Serialization(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        Ok(())
    }
}
