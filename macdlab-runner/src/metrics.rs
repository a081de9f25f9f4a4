//! Performance metrics: pure functions that compute strategy statistics.
//!
//! Every metric is a pure function: equity curve and/or trade list in, scalar out.

use macdlab_core::{SimulationResult, Trade};
use serde::{Deserialize, Serialize};

/// Aggregate performance metrics for a single backtest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub initial_balance: f64,
    pub final_balance: f64,
    /// Fractional return of holding from the first close to the last.
    /// `None` when the first close is zero.
    pub buy_and_hold_return: Option<f64>,
    /// Fractional return of the crossover strategy.
    pub strategy_return: f64,
    pub max_drawdown: f64,
    pub trade_count: usize,
    pub winning_trades: usize,
    pub win_rate: f64,
    /// Fraction of bars that ended invested.
    pub exposure: f64,
}

impl PerformanceMetrics {
    pub fn compute(sim: &SimulationResult) -> Self {
        let winning_trades = sim.trades.iter().filter(|t| t.is_winner()).count();
        let invested_bars = sim.steps.iter().filter(|s| s.shares > 0.0).count();
        Self {
            initial_balance: sim.initial_balance,
            final_balance: sim.final_balance,
            buy_and_hold_return: sim.buy_and_hold_return,
            strategy_return: sim.strategy_return,
            max_drawdown: max_drawdown(&sim.equity_curve()),
            trade_count: sim.trades.len(),
            winning_trades,
            win_rate: win_rate(&sim.trades),
            exposure: fraction(invested_bars, sim.steps.len()),
        }
    }

    /// Strategy return minus buy-and-hold return.
    pub fn excess_return(&self) -> Option<f64> {
        self.buy_and_hold_return.map(|bh| self.strategy_return - bh)
    }
}

// ─── Individual metric functions ────────────────────────────────────

/// Largest peak-to-trough decline as a non-positive fraction.
pub fn max_drawdown(equity_curve: &[f64]) -> f64 {
    let mut peak = f64::NEG_INFINITY;
    let mut max_dd = 0.0_f64;

    for &eq in equity_curve {
        peak = peak.max(eq);
        if peak > 0.0 {
            max_dd = max_dd.min((eq - peak) / peak);
        }
    }
    max_dd
}

/// Win rate: fraction of trades that exited above their entry.
pub fn win_rate(trades: &[Trade]) -> f64 {
    let winners = trades.iter().filter(|t| t.is_winner()).count();
    fraction(winners, trades.len())
}

fn fraction(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}
