//! Serializable run configuration, loaded from TOML.
//!
//! ```toml
//! [scheduler]
//! feature_update_interval = 60000
//! ordering = "trust"
//!
//! [instruments]
//! supported = ["stock", "crypto"]
//! history_len = 128
//!
//! [[features]]
//! type = "moving_average"
//! params = { period = 20 }
//!
//! [execution]
//! type = "threshold"
//! feature = "moving_average_20"
//! enter_above = 101.0
//! exit_below = 99.0
//!
//! [source]
//! type = "csv"
//! path = "ticks.csv"
//! ```

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use ticklab_core::domain::InstrumentKind;
use ticklab_core::engine::OrderingPolicy;
use ticklab_core::features::{create_features, FactoryError, FeatureConfig};

/// Unique identifier for a run (content-addressable hash).
pub type RunId = String;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("config could not be serialized: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("invalid feature: {0}")]
    Feature(#[from] FactoryError),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Everything needed to reproduce a run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    pub scheduler: SchedulerConfig,

    #[serde(default)]
    pub instruments: InstrumentsConfig,

    #[serde(default)]
    pub features: Vec<FeatureConfig>,

    #[serde(default)]
    pub execution: ExecutionConfig,

    pub source: SourceConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct SchedulerConfig {
    /// Minimum logical time between two feature passes.
    pub feature_update_interval: i64,

    #[serde(default)]
    pub ordering: OrderingPolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct InstrumentsConfig {
    /// Instrument types the factory will create. Anything else is skipped.
    #[serde(default = "default_supported")]
    pub supported: Vec<InstrumentKind>,

    /// Snapshots kept per instrument (raised to the largest feature lookback).
    #[serde(default = "default_history_len")]
    pub history_len: usize,
}

fn default_supported() -> Vec<InstrumentKind> {
    vec![InstrumentKind::Stock, InstrumentKind::Future, InstrumentKind::Crypto]
}

fn default_history_len() -> usize {
    256
}

impl Default for InstrumentsConfig {
    fn default() -> Self {
        Self {
            supported: default_supported(),
            history_len: default_history_len(),
        }
    }
}

/// Execution resolver selection.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case", deny_unknown_fields)]
pub enum ExecutionConfig {
    /// Never trade.
    #[default]
    None,

    /// Long/flat on a feature crossing two thresholds.
    Threshold {
        feature: String,
        enter_above: f64,
        exit_below: f64,
        #[serde(default = "default_quantity")]
        quantity: f64,
    },
}

fn default_quantity() -> f64 {
    1.0
}

/// Where updates come from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case", deny_unknown_fields)]
pub enum SourceConfig {
    Csv {
        path: PathBuf,
    },
    Synthetic {
        symbols: Vec<String>,
        updates: usize,
        #[serde(default = "default_step")]
        step: i64,
        #[serde(default)]
        start: i64,
        #[serde(default)]
        seed: u64,
    },
}

fn default_step() -> i64 {
    1_000
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    /// JSONL file receiving every execution, one per line.
    #[serde(default)]
    pub executions: Option<PathBuf>,
}

impl RunConfig {
    /// Load and validate a config file.
    ///
    /// Relative paths inside the file are resolved against the file's directory.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_toml(&content)?;
        if let Some(base) = path.parent() {
            config.resolve_paths(base);
        }
        Ok(config)
    }

    /// Parse and validate a config from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: RunConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check everything that can be checked without touching the data.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.instruments.history_len == 0 {
            return Err(ConfigError::Invalid(
                "instruments.history_len must be at least 1".into(),
            ));
        }
        if self.instruments.supported.contains(&InstrumentKind::Unknown) {
            return Err(ConfigError::Invalid(
                "instruments.supported may not contain unknown instrument types".into(),
            ));
        }

        let features = create_features(&self.features)?;

        if let ExecutionConfig::Threshold {
            feature,
            enter_above,
            exit_below,
            quantity,
        } = &self.execution
        {
            let names: HashSet<&str> = features.iter().map(|f| f.name()).collect();
            if !names.contains(feature.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "execution.feature '{feature}' is not a configured feature"
                )));
            }
            if exit_below > enter_above {
                return Err(ConfigError::Invalid(format!(
                    "execution.exit_below ({exit_below}) is above enter_above ({enter_above})"
                )));
            }
            if !(*quantity > 0.0 && quantity.is_finite()) {
                return Err(ConfigError::Invalid(format!(
                    "execution.quantity must be positive, got {quantity}"
                )));
            }
        }

        match &self.source {
            SourceConfig::Csv { path } if path.as_os_str().is_empty() => {
                return Err(ConfigError::Invalid("source.path is empty".into()));
            }
            SourceConfig::Synthetic { symbols, step, .. } => {
                if symbols.is_empty() {
                    return Err(ConfigError::Invalid("source.symbols is empty".into()));
                }
                if *step <= 0 {
                    return Err(ConfigError::Invalid(format!(
                        "source.step must be positive, got {step}"
                    )));
                }
            }
            SourceConfig::Csv { .. } => {}
        }

        Ok(())
    }

    /// Computes a deterministic hash ID for this configuration.
    ///
    /// Two runs with identical configs get the same RunId.
    pub fn run_id(&self) -> Result<RunId, ConfigError> {
        let json = serde_json::to_string(self)?;
        Ok(blake3::hash(json.as_bytes()).to_hex().to_string())
    }

    fn resolve_paths(&mut self, base: &Path) {
        if let SourceConfig::Csv { path } = &mut self.source {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
        if let Some(path) = &mut self.output.executions {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
    }
}
