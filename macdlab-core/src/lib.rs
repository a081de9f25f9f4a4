//! MACDLab Core: bar series, MACD indicator engine, crossover signals, backtest simulator.
//!
//! This crate is the pure, synchronous heart of MACDLab:
//! - Domain types (bars, the validated bar series)
//! - Recursive EMA and the MACD/signal indicator with crossover flags
//! - Two-state position machine (flat / invested)
//! - Fold-based walk-forward simulator with end-of-series liquidation
//!
//! No I/O and no logging happen here; see `macdlab-runner` for both.

pub mod domain;
pub mod engine;
pub mod error;
pub mod indicators;
pub mod signals;

pub use domain::{Bar, BarSeries};
pub use engine::{
    buy_and_hold_return, run_backtest, simulate, Action, Backtest, Position, SimulationResult,
    StepRecord, Trade, DEFAULT_INITIAL_BALANCE,
};
pub use error::CoreError;
pub use indicators::{compute_indicators, IndicatorRecord, MacdParams};
