//! Serializable backtest configuration.
//!
//! Loaded from TOML; every key is optional and falls back to the MACD
//! conventions (12/26/9) and a 100 000 starting balance.
//!
//! ```toml
//! [indicator]
//! short_window = 12
//! long_window = 26
//! signal_window = 9
//!
//! [backtest]
//! initial_balance = 100000.0
//! symbol = "HDFCBANK"
//! ```

use std::path::{Path, PathBuf};

use macdlab_core::{MacdParams, DEFAULT_INITIAL_BALANCE};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unique identifier for a backtest configuration (content-addressable hash).
pub type RunId = String;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Indicator windows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorSection {
    pub short_window: usize,
    pub long_window: usize,
    pub signal_window: usize,
}

impl Default for IndicatorSection {
    fn default() -> Self {
        let params = MacdParams::default();
        Self {
            short_window: params.short_window,
            long_window: params.long_window,
            signal_window: params.signal_window,
        }
    }
}

/// Simulation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestSection {
    pub initial_balance: f64,
    /// Label used in reports; defaults to the input file stem.
    pub symbol: Option<String>,
}

impl Default for BacktestSection {
    fn default() -> Self {
        Self {
            initial_balance: DEFAULT_INITIAL_BALANCE,
            symbol: None,
        }
    }
}

/// Complete configuration of one backtest run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestConfig {
    pub indicator: IndicatorSection,
    pub backtest: BacktestSection,
}

impl BacktestConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the engine would refuse anyway, with a config-level message.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let ind = &self.indicator;
        if ind.short_window == 0 || ind.long_window == 0 || ind.signal_window == 0 {
            return Err(ConfigError::Invalid(format!(
                "windows must be positive (short={}, long={}, signal={})",
                ind.short_window, ind.long_window, ind.signal_window
            )));
        }
        let balance = self.backtest.initial_balance;
        if !(balance.is_finite() && balance > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "initial_balance must be positive, got {balance}"
            )));
        }
        if ind.short_window >= ind.long_window {
            tracing::warn!(
                short = ind.short_window,
                long = ind.long_window,
                "short_window is not shorter than long_window; MACD sign is inverted"
            );
        }
        Ok(())
    }

    pub fn macd_params(&self) -> MacdParams {
        MacdParams::new(
            self.indicator.short_window,
            self.indicator.long_window,
            self.indicator.signal_window,
        )
    }

    /// Deterministic hash of every parameter that affects the result.
    ///
    /// Two configs with the same RunId produce identical output on the same data.
    pub fn run_id(&self) -> RunId {
        let key = format!(
            "macd:{}:{}:{}|balance:{:016x}",
            self.indicator.short_window,
            self.indicator.long_window,
            self.indicator.signal_window,
            self.backtest.initial_balance.to_bits()
        );
        blake3::hash(key.as_bytes()).to_hex().to_string()
    }
}
