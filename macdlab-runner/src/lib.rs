//! MACDLab Runner: backtest orchestration, configuration, data loading, sweeps, export.
//!
//! This crate builds on `macdlab-core` to provide:
//! - TOML configuration with MACD defaults and content-addressed run ids
//! - Quote CSV loading (thousands separators, textual dates, newest-first exports)
//! - Single-backtest runner with metrics
//! - Parallel parameter sweeps over the MACD windows
//! - JSON/CSV/text export of results

pub mod config;
pub mod data_loader;
pub mod export;
pub mod metrics;
pub mod runner;
pub mod sweep;

pub use config::{BacktestConfig, ConfigError, RunId};
pub use data_loader::{load_csv, parse_csv, LoadError};
pub use export::{
    export_equity_csv, export_indicators_csv, export_json, export_sweep_csv, export_trades_csv,
    format_indicator_table, format_summary, format_sweep_table, import_json, load_artifacts,
    save_artifacts,
};
pub use metrics::PerformanceMetrics;
pub use runner::{run_backtest_from_bars, run_backtest_from_file, BacktestResult, RunError};
pub use sweep::{run_sweep, ParamGrid, SweepEntry, SweepResults};

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn result_types_are_send_sync() {
        assert_send::<BacktestResult>();
        assert_sync::<BacktestResult>();
        assert_send::<PerformanceMetrics>();
        assert_sync::<PerformanceMetrics>();
        assert_send::<SweepResults>();
        assert_sync::<SweepResults>();
    }

    #[test]
    fn config_types_are_send_sync() {
        assert_send::<BacktestConfig>();
        assert_sync::<BacktestConfig>();
        assert_send::<ParamGrid>();
        assert_sync::<ParamGrid>();
    }

    #[test]
    fn error_types_are_send_sync() {
        assert_send::<RunError>();
        assert_sync::<RunError>();
    }
}
