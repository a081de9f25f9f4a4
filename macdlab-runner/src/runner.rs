//! Backtest runner: wires together data loading, the engine, and metrics.
//!
//! Two entry points:
//! - `run_backtest_from_file()`: loads a quote CSV, then runs. Used by the CLI.
//! - `run_backtest_from_bars()`: takes a pre-loaded series. Used by sweeps and tests.

use std::path::Path;

use macdlab_core::{run_backtest, BarSeries, CoreError, IndicatorRecord, SimulationResult};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{BacktestConfig, ConfigError, RunId};
use crate::data_loader::{load_csv, LoadError};
use crate::metrics::PerformanceMetrics;

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error: {0}")]
    Data(#[from] LoadError),
    #[error("backtest error: {0}")]
    Core(#[from] CoreError),
}

/// Current schema version for persisted artifacts.
pub const SCHEMA_VERSION: u32 = 1;

/// Complete result of a single backtest run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestResult {
    /// Schema version for forward-compatible deserialization.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub run_id: RunId,
    pub symbol: String,
    pub start_date: String,
    pub end_date: String,
    pub bar_count: usize,
    pub config: BacktestConfig,
    pub metrics: PerformanceMetrics,
    pub records: Vec<IndicatorRecord>,
    pub simulation: SimulationResult,
}

/// Default schema version for serde deserialization of older JSON without the field.
fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// Load `path` and run a backtest on it.
///
/// The symbol label comes from the config, falling back to the file stem.
pub fn run_backtest_from_file(
    config: &BacktestConfig,
    path: &Path,
) -> Result<BacktestResult, RunError> {
    let bars = load_csv(path)?;
    let symbol = config
        .backtest
        .symbol
        .clone()
        .or_else(|| path.file_stem().map(|s| s.to_string_lossy().into_owned()))
        .unwrap_or_else(|| "UNKNOWN".to_string());
    run_backtest_from_bars(config, &bars, &symbol)
}

/// Run a backtest with a pre-loaded series. No I/O.
pub fn run_backtest_from_bars(
    config: &BacktestConfig,
    bars: &BarSeries,
    symbol: &str,
) -> Result<BacktestResult, RunError> {
    config.validate()?;
    let params = config.macd_params();
    let run_id = config.run_id();
    let short_id = &run_id[..12];
    tracing::info!(
        symbol,
        run_id = short_id,
        short = params.short_window,
        long = params.long_window,
        signal = params.signal_window,
        initial_balance = config.backtest.initial_balance,
        "running backtest"
    );

    let backtest = run_backtest(bars, &params, config.backtest.initial_balance)?;
    for trade in &backtest.simulation.trades {
        tracing::debug!(
            entry = %trade.entry_date,
            entry_price = trade.entry_price,
            exit = %trade.exit_date,
            exit_price = trade.exit_price,
            reason = ?trade.exit_reason,
            "trade"
        );
    }

    let metrics = PerformanceMetrics::compute(&backtest.simulation);
    tracing::info!(
        symbol,
        final_balance = metrics.final_balance,
        strategy_return = metrics.strategy_return,
        buy_and_hold_return = ?metrics.buy_and_hold_return,
        trades = metrics.trade_count,
        "backtest complete"
    );

    Ok(BacktestResult {
        schema_version: SCHEMA_VERSION,
        run_id,
        symbol: symbol.to_string(),
        start_date: bars.first().date.to_string(),
        end_date: bars.last().date.to_string(),
        bar_count: bars.len(),
        config: config.clone(),
        metrics,
        records: backtest.records,
        simulation: backtest.simulation,
    })
}
