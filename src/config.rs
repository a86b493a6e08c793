//! Engine configuration and JSON loader.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Conventional CR acceptance threshold.
pub const DEFAULT_CONSISTENCY_THRESHOLD: f64 = 0.10;

/// Relative slack for reciprocity and diagonal checks on dense input.
///
/// Spreadsheet users type `0.33` for `1/3` or `0.14` for `1/7`; two-decimal rounding
/// of Saaty reciprocals stays within 5%.
pub const DEFAULT_RECIPROCAL_TOLERANCE: f64 = 0.05;

/// What the solver does with a row whose priority weight is exactly zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZeroWeightPolicy {
    /// Leave the row out of the λmax average and record it in `skipped_rows`.
    #[default]
    SkipRow,
    /// Abort the solve with a numeric error.
    Fail,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// `is_consistent = CR < consistency_threshold`.
    pub consistency_threshold: f64,
    /// Allowed relative deviation of `M[i][j] * M[j][i]` (and `M[i][i]`) from 1.
    pub reciprocal_tolerance: f64,
    pub zero_weight_policy: ZeroWeightPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            consistency_threshold: DEFAULT_CONSISTENCY_THRESHOLD,
            reciprocal_tolerance: DEFAULT_RECIPROCAL_TOLERANCE,
            zero_weight_policy: ZeroWeightPolicy::default(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("consistency_threshold must be finite and > 0, got {0}")]
    InvalidThreshold(f64),
    #[error("reciprocal_tolerance must be finite and >= 0, got {0}")]
    InvalidTolerance(f64),
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.consistency_threshold.is_finite() || self.consistency_threshold <= 0.0 {
            return Err(ConfigError::InvalidThreshold(self.consistency_threshold));
        }
        if !self.reciprocal_tolerance.is_finite() || self.reciprocal_tolerance < 0.0 {
            return Err(ConfigError::InvalidTolerance(self.reciprocal_tolerance));
        }
        Ok(())
    }
}

/// Load and validate an `EngineConfig` from a JSON file. Missing fields take defaults.
pub fn load_config_from_path(path: impl AsRef<Path>) -> Result<EngineConfig, ConfigError> {
    let path = path.as_ref();
    let display = path.display().to_string();
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: display.clone(),
        source,
    })?;
    let config: EngineConfig = serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: display,
        source,
    })?;
    config.validate()?;
    Ok(config)
}
