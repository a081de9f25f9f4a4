//! MACD: Moving Average Convergence/Divergence with crossover flags.
//!
//! ema_fast  = EMA(close, short_window)
//! ema_slow  = EMA(close, long_window)
//! macd      = ema_fast - ema_slow
//! signal    = EMA(macd, signal_window)
//! histogram = macd - signal
//!
//! Buy/sell flags mark upward/downward crossovers of macd over signal.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::Bar;
use crate::error::{CoreError, Result};
use crate::indicators::ema::Ema;
use crate::signals::detect_crossover;

/// Window parameters for the MACD indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MacdParams {
    pub short_window: usize,
    pub long_window: usize,
    pub signal_window: usize,
}

impl Default for MacdParams {
    fn default() -> Self {
        Self {
            short_window: 12,
            long_window: 26,
            signal_window: 9,
        }
    }
}

impl MacdParams {
    pub fn new(short_window: usize, long_window: usize, signal_window: usize) -> Self {
        Self {
            short_window,
            long_window,
            signal_window,
        }
    }

    /// All three windows must be positive.
    pub fn validate(&self) -> Result<()> {
        for (name, window) in [
            ("short_window", self.short_window),
            ("long_window", self.long_window),
            ("signal_window", self.signal_window),
        ] {
            if window == 0 {
                return Err(CoreError::invalid(format!("{name} must be positive")));
            }
        }
        Ok(())
    }
}

/// Derived values for one bar, aligned by index with the input series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorRecord {
    pub date: NaiveDate,
    pub close: f64,
    pub ema_fast: f64,
    pub ema_slow: f64,
    pub macd: f64,
    pub signal: f64,
    pub histogram: f64,
    pub buy_flag: bool,
    pub sell_flag: bool,
}

/// Compute MACD, signal line and crossover flags for every bar.
///
/// Fails before computing anything if the series is empty, a window is zero,
/// or a close is missing or negative.
pub fn compute_indicators(bars: &[Bar], params: &MacdParams) -> Result<Vec<IndicatorRecord>> {
    if bars.is_empty() {
        return Err(CoreError::invalid("bar series is empty"));
    }
    params.validate()?;
    let closes = extract_closes(bars)?;

    let ema_fast = Ema::new(params.short_window).smooth(&closes);
    let ema_slow = Ema::new(params.long_window).smooth(&closes);
    let macd: Vec<f64> = ema_fast
        .iter()
        .zip(&ema_slow)
        .map(|(fast, slow)| fast - slow)
        .collect();
    let signal = Ema::new(params.signal_window).smooth(&macd);

    let records = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| {
            let prev = i.checked_sub(1).map(|p| (macd[p], signal[p]));
            let cross = detect_crossover(prev, (macd[i], signal[i]));
            IndicatorRecord {
                date: bar.date,
                close: closes[i],
                ema_fast: ema_fast[i],
                ema_slow: ema_slow[i],
                macd: macd[i],
                signal: signal[i],
                histogram: macd[i] - signal[i],
                buy_flag: cross.is_up(),
                sell_flag: cross.is_down(),
            }
        })
        .collect();

    Ok(records)
}

fn extract_closes(bars: &[Bar]) -> Result<Vec<f64>> {
    bars.iter()
        .enumerate()
        .map(|(index, bar)| {
            let close = bar.close_price().ok_or(CoreError::MissingField {
                index,
                field: "close",
            })?;
            if close < 0.0 {
                return Err(CoreError::invalid(format!(
                    "bar {index} has a negative close ({close})"
                )));
            }
            Ok(close)
        })
        .collect()
}
