//! Backtest engine: position state machine, simulator, and the end-to-end
//! bars → indicators → simulation pipeline.

pub mod position;
pub mod simulator;

pub use position::{Action, Position};
pub use simulator::{
    buy_and_hold_return, simulate, ExitReason, SimulationResult, StepRecord, Trade,
};

use serde::{Deserialize, Serialize};

use crate::domain::Bar;
use crate::error::Result;
use crate::indicators::{compute_indicators, IndicatorRecord, MacdParams};

/// Default starting cash for a run.
pub const DEFAULT_INITIAL_BALANCE: f64 = 100_000.0;

/// Indicator trace and simulation outcome of one pipeline invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Backtest {
    pub params: MacdParams,
    pub records: Vec<IndicatorRecord>,
    pub simulation: SimulationResult,
}

/// Compute indicators over `bars` and simulate the crossover strategy.
///
/// Pure: the same input always produces the same output, and each call owns
/// its own state, so independent calls may run in parallel.
pub fn run_backtest(bars: &[Bar], params: &MacdParams, initial_balance: f64) -> Result<Backtest> {
    let records = compute_indicators(bars, params)?;
    let simulation = simulate(&records, initial_balance)?;
    Ok(Backtest {
        params: *params,
        records,
        simulation,
    })
}
