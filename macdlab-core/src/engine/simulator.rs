//! Walk-forward backtest over an annotated series.
//!
//! The walk is a fold over the indicator records with a [`Position`] as the
//! accumulator. Each bar either leaves the position alone or flips it; after
//! the last bar any shares are liquidated at the final close so the result
//! is always a cash figure.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::engine::position::{Action, Position};
use crate::error::{CoreError, Result};
use crate::indicators::IndicatorRecord;

/// One bar of the balance/position trajectory, after that bar's transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepRecord {
    pub index: usize,
    pub date: NaiveDate,
    pub close: f64,
    pub action: Action,
    pub balance: f64,
    pub shares: f64,
    pub equity: f64,
}

impl StepRecord {
    fn new(record: &IndicatorRecord, index: usize, action: Action, position: Position) -> Self {
        Self {
            index,
            date: record.date,
            close: record.close,
            action,
            balance: position.balance(),
            shares: position.shares(),
            equity: position.equity(record.close),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    Signal,
    EndOfSeries,
}

/// A completed entry/exit round trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub entry_index: usize,
    pub entry_date: NaiveDate,
    pub entry_price: f64,
    pub exit_index: usize,
    pub exit_date: NaiveDate,
    pub exit_price: f64,
    pub shares: f64,
    pub exit_reason: ExitReason,
}

impl Trade {
    /// Fractional return of the round trip.
    pub fn return_pct(&self) -> f64 {
        (self.exit_price - self.entry_price) / self.entry_price
    }

    pub fn is_winner(&self) -> bool {
        self.exit_price > self.entry_price
    }

    pub fn bars_held(&self) -> usize {
        self.exit_index - self.entry_index
    }
}

/// Outcome of one simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    pub initial_balance: f64,
    pub final_balance: f64,
    /// One entry per bar, aligned with the input records.
    pub steps: Vec<StepRecord>,
    /// The end-of-series liquidation, if the walk ended invested.
    pub liquidation: Option<StepRecord>,
    pub trades: Vec<Trade>,
    /// `(close[last] - close[0]) / close[0]`, `None` when the first close is zero.
    pub buy_and_hold_return: Option<f64>,
    /// `(final_balance - initial_balance) / initial_balance`
    pub strategy_return: f64,
}

impl SimulationResult {
    /// Mark-to-market equity per bar. The last entry already equals the final
    /// balance, since an open position is marked at the last close.
    pub fn equity_curve(&self) -> Vec<f64> {
        self.steps.iter().map(|s| s.equity).collect()
    }
}

struct OpenEntry {
    index: usize,
    date: NaiveDate,
    price: f64,
    shares: f64,
}

struct Walk {
    position: Position,
    open: Option<OpenEntry>,
    steps: Vec<StepRecord>,
    trades: Vec<Trade>,
}

impl Walk {
    fn close_trade(&mut self, record: &IndicatorRecord, index: usize, reason: ExitReason) {
        if let Some(entry) = self.open.take() {
            self.trades.push(Trade {
                entry_index: entry.index,
                entry_date: entry.date,
                entry_price: entry.price,
                exit_index: index,
                exit_date: record.date,
                exit_price: record.close,
                shares: entry.shares,
                exit_reason: reason,
            });
        }
    }
}

/// Run the strategy over an annotated series, starting all in cash.
///
/// Does not mutate its input. Fails with `InvalidInput` for an empty series
/// or a non-positive balance, and with `ConflictingSignals` if a record has
/// both flags set.
pub fn simulate(records: &[IndicatorRecord], initial_balance: f64) -> Result<SimulationResult> {
    if records.is_empty() {
        return Err(CoreError::invalid("bar series is empty"));
    }
    if !(initial_balance.is_finite() && initial_balance > 0.0) {
        return Err(CoreError::invalid(format!(
            "initial_balance must be positive, got {initial_balance}"
        )));
    }

    let start = Walk {
        position: Position::flat(initial_balance),
        open: None,
        steps: Vec::with_capacity(records.len()),
        trades: Vec::new(),
    };

    let mut walk = records
        .iter()
        .enumerate()
        .try_fold(start, |mut walk, (index, record)| {
            if record.buy_flag && record.sell_flag {
                return Err(CoreError::ConflictingSignals { index });
            }
            let buys_now = record.buy_flag && !walk.position.is_invested();
            if buys_now && (record.close <= 0.0 || !record.close.is_finite()) {
                return Err(CoreError::invalid(format!(
                    "cannot buy at non-positive close {} on bar {index}",
                    record.close
                )));
            }

            let (position, action) = walk
                .position
                .on_bar(record.buy_flag, record.sell_flag, record.close);
            match action {
                Action::Buy => {
                    walk.open = Some(OpenEntry {
                        index,
                        date: record.date,
                        price: record.close,
                        shares: position.shares(),
                    })
                }
                Action::Sell => walk.close_trade(record, index, ExitReason::Signal),
                Action::Liquidate | Action::Hold => {}
            }
            walk.position = position;
            walk.steps.push(StepRecord::new(record, index, action, position));
            Ok(walk)
        })?;

    let last_index = records.len() - 1;
    let last = &records[last_index];
    let (position, action) = walk.position.liquidate(last.close);
    let liquidation = if action == Action::Liquidate {
        walk.close_trade(last, last_index, ExitReason::EndOfSeries);
        Some(StepRecord::new(last, last_index, action, position))
    } else {
        None
    };

    let final_balance = position.balance();
    let first_close = records[0].close;
    Ok(SimulationResult {
        initial_balance,
        final_balance,
        steps: walk.steps,
        liquidation,
        trades: walk.trades,
        buy_and_hold_return: buy_and_hold_return(first_close, last.close),
        strategy_return: (final_balance - initial_balance) / initial_balance,
    })
}

/// Fractional return of holding from `first` to `last`.
///
/// Undefined for a zero entry price.
pub fn buy_and_hold_return(first: f64, last: f64) -> Option<f64> {
    (first != 0.0).then(|| (last - first) / first)
}
