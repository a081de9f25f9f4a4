//! Parameter sweep over MACD windows.
//!
//! Every combination runs against the same read-only series. Each run owns
//! its own simulation state, so the grid is evaluated in parallel with rayon.

use std::cmp::Ordering;

use macdlab_core::{buy_and_hold_return, run_backtest, BarSeries, MacdParams};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::metrics::max_drawdown;
use crate::runner::RunError;

/// Parameter grid specification.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamGrid {
    pub short_windows: Vec<usize>,
    pub long_windows: Vec<usize>,
    pub signal_windows: Vec<usize>,
}

impl Default for ParamGrid {
    /// Short 5..=15 step 1, long 20..=40 step 2, signal 5..=12.
    fn default() -> Self {
        Self {
            short_windows: (5..=15).collect(),
            long_windows: (20..=40).step_by(2).collect(),
            signal_windows: (5..=12).collect(),
        }
    }
}

impl ParamGrid {
    pub fn new(
        short_windows: Vec<usize>,
        long_windows: Vec<usize>,
        signal_windows: Vec<usize>,
    ) -> Self {
        Self {
            short_windows,
            long_windows,
            signal_windows,
        }
    }

    /// All valid combinations: positive windows with short < long.
    pub fn combinations(&self) -> Vec<MacdParams> {
        let mut out = Vec::new();
        for &short in &self.short_windows {
            for &long in &self.long_windows {
                // Skip invalid combinations (short >= long)
                if short == 0 || short >= long {
                    continue;
                }
                for &signal in &self.signal_windows {
                    if signal == 0 {
                        continue;
                    }
                    out.push(MacdParams::new(short, long, signal));
                }
            }
        }
        out
    }

    /// Number of valid combinations in this grid.
    pub fn size(&self) -> usize {
        self.combinations().len()
    }
}

/// Summary of one grid point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepEntry {
    pub params: MacdParams,
    pub final_balance: f64,
    pub strategy_return: f64,
    pub max_drawdown: f64,
    pub trade_count: usize,
}

/// Sweep outcome, ranked by final balance (best first).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepResults {
    pub initial_balance: f64,
    pub buy_and_hold_return: Option<f64>,
    pub entries: Vec<SweepEntry>,
}

impl SweepResults {
    pub fn best(&self) -> Option<&SweepEntry> {
        self.entries.first()
    }

    pub fn top(&self, n: usize) -> &[SweepEntry] {
        &self.entries[..n.min(self.entries.len())]
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Evaluate every grid combination over `bars`.
///
/// Ties in final balance are ordered by (short, long, signal) so the ranking
/// does not depend on thread scheduling.
pub fn run_sweep(
    bars: &BarSeries,
    grid: &ParamGrid,
    initial_balance: f64,
) -> Result<SweepResults, RunError> {
    let combos = grid.combinations();
    tracing::info!(combinations = combos.len(), bars = bars.len(), "starting sweep");

    let mut entries = combos
        .par_iter()
        .map(|params| -> Result<SweepEntry, RunError> {
            let bt = run_backtest(bars, params, initial_balance)?;
            let sim = &bt.simulation;
            tracing::debug!(
                short = params.short_window,
                long = params.long_window,
                signal = params.signal_window,
                final_balance = sim.final_balance,
                "sweep point done"
            );
            Ok(SweepEntry {
                params: *params,
                final_balance: sim.final_balance,
                strategy_return: sim.strategy_return,
                max_drawdown: max_drawdown(&sim.equity_curve()),
                trade_count: sim.trades.len(),
            })
        })
        .collect::<Result<Vec<_>, RunError>>()?;

    entries.sort_by(|a, b| {
        b.final_balance
            .partial_cmp(&a.final_balance)
            .unwrap_or(Ordering::Equal)
            .then_with(|| param_key(&a.params).cmp(&param_key(&b.params)))
    });

    let buy_and_hold_return = buy_and_hold_return(bars.first().close, bars.last().close);
    if let Some(best) = entries.first() {
        tracing::info!(
            short = best.params.short_window,
            long = best.params.long_window,
            signal = best.params.signal_window,
            final_balance = best.final_balance,
            "sweep complete"
        );
    }

    Ok(SweepResults {
        initial_balance,
        buy_and_hold_return,
        entries,
    })
}

fn param_key(p: &MacdParams) -> (usize, usize, usize) {
    (p.short_window, p.long_window, p.signal_window)
}
