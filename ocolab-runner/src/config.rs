//! Serializable strategy configuration.
//!
//! Every key is optional; an empty file (`{}` or an empty TOML document)
//! runs the default strategy. Unknown keys are rejected so typos fail loudly.

use chrono::Duration;
use ocolab_core::band::BandParams;
use ocolab_core::engine::SimConfig;
use ocolab_core::metrics::MetricsParams;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Longest accepted post-to-arm latency (one day).
pub const MAX_LATENCY_MS: u64 = 86_400_000;

/// Longest accepted window or holding period (one year).
pub const MAX_DURATION_S: u64 = 365 * 86_400;

/// Errors from loading or validating a strategy config.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported config format '{0}' (expected .json or .toml)")]
    UnsupportedFormat(String),

    #[error("invalid JSON config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid TOML config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid value for '{key}': {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Strategy parameters as they appear in the config file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct StrategyConfig {
    /// Minimum one-way entry slippage in bp, applied against the stop price.
    pub slip_bp_param: f64,
    pub take_profit_bp: f64,
    pub stop_loss_bp: f64,
    pub max_hold_s: u64,
    pub baseline_window_s: u64,
    pub vol_window_s: u64,
    pub band_multiplier: f64,
    pub band_min_bp: f64,
    pub band_max_bp: f64,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            slip_bp_param: 1.0,
            take_profit_bp: 12.0,
            stop_loss_bp: 6.0,
            max_hold_s: 180,
            baseline_window_s: 60,
            vol_window_s: 1,
            band_multiplier: 0.5,
            band_min_bp: 2.0,
            band_max_bp: 8.0,
        }
    }
}

impl StrategyConfig {
    /// Load and validate a config; format is chosen by file extension.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        let read = || {
            std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })
        };
        match ext.as_str() {
            "json" => Self::from_json_str(&read()?),
            "toml" => Self::from_toml_str(&read()?),
            other => Err(ConfigError::UnsupportedFormat(other.to_string())),
        }
    }

    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        non_negative("slip_bp_param", self.slip_bp_param)?;
        positive("take_profit_bp", self.take_profit_bp)?;
        positive("stop_loss_bp", self.stop_loss_bp)?;
        non_negative("band_multiplier", self.band_multiplier)?;
        non_negative("band_min_bp", self.band_min_bp)?;
        non_negative("band_max_bp", self.band_max_bp)?;
        if self.band_min_bp > self.band_max_bp {
            return Err(ConfigError::Invalid {
                key: "band_min_bp",
                reason: format!(
                    "{} exceeds band_max_bp {}",
                    self.band_min_bp, self.band_max_bp
                ),
            });
        }
        seconds("max_hold_s", self.max_hold_s)?;
        seconds("baseline_window_s", self.baseline_window_s)?;
        seconds("vol_window_s", self.vol_window_s)?;
        Ok(())
    }

    /// Core simulation parameters for a run with the given latency.
    pub fn to_sim_config(&self, latency_ms: u64) -> Result<SimConfig, ConfigError> {
        self.validate()?;
        if latency_ms > MAX_LATENCY_MS {
            return Err(ConfigError::Invalid {
                key: "latency_ms",
                reason: format!("{latency_ms} exceeds the {MAX_LATENCY_MS} ms limit"),
            });
        }
        let latency = i64::try_from(latency_ms)
            .ok()
            .and_then(Duration::try_milliseconds)
            .ok_or_else(|| ConfigError::Invalid {
                key: "latency_ms",
                reason: format!("{latency_ms} is out of range"),
            })?;
        Ok(SimConfig {
            latency,
            slip_bp: self.slip_bp_param,
            take_profit_bp: self.take_profit_bp,
            stop_loss_bp: self.stop_loss_bp,
            max_hold: seconds("max_hold_s", self.max_hold_s)?,
            band: BandParams {
                multiplier: self.band_multiplier,
                min_bp: self.band_min_bp,
                max_bp: self.band_max_bp,
            },
            metrics: MetricsParams {
                baseline_window: seconds("baseline_window_s", self.baseline_window_s)?,
                vol_window: seconds("vol_window_s", self.vol_window_s)?,
            },
        })
    }

    /// Deterministic BLAKE3 hash of the canonical JSON form.
    pub fn config_hash(&self) -> String {
        // Plain struct of numbers: serialization cannot fail.
        let json = serde_json::to_string(self).unwrap_or_default();
        blake3::hash(json.as_bytes()).to_hex().to_string()
    }
}

fn non_negative(key: &'static str, v: f64) -> Result<(), ConfigError> {
    if v.is_finite() && v >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            key,
            reason: format!("{v} must be a finite, non-negative number"),
        })
    }
}

fn positive(key: &'static str, v: f64) -> Result<(), ConfigError> {
    if v.is_finite() && v > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            key,
            reason: format!("{v} must be a finite, positive number"),
        })
    }
}

fn seconds(key: &'static str, s: u64) -> Result<Duration, ConfigError> {
    if s == 0 {
        return Err(ConfigError::Invalid {
            key,
            reason: "must be at least 1 second".into(),
        });
    }
    if s > MAX_DURATION_S {
        return Err(ConfigError::Invalid {
            key,
            reason: format!("{s} seconds exceeds the {MAX_DURATION_S} s limit"),
        });
    }
    i64::try_from(s)
        .ok()
        .and_then(Duration::try_seconds)
        .ok_or_else(|| ConfigError::Invalid {
            key,
            reason: format!("{s} seconds is out of range"),
        })
}
