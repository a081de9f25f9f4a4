//! Bar, the fundamental market data unit, and the ordered series built from it.

use std::ops::Deref;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// One trading day of quote data.
///
/// Only `close` feeds the indicator engine and the simulator. The remaining
/// price fields are carried through for reporting. A missing close is stored
/// as NaN and surfaces as `None` from [`Bar::close_price`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub prev_close: f64,
    pub last_traded_price: f64,
    pub close: f64,
    pub vwap: f64,
    pub volume: u64,
    pub value: f64,
}

impl Bar {
    /// A bar where every price field equals `close`. Useful when only closes are known.
    pub fn from_close(date: NaiveDate, close: f64) -> Self {
        Self {
            date,
            open: close,
            high: close,
            low: close,
            prev_close: close,
            last_traded_price: close,
            close,
            vwap: close,
            volume: 0,
            value: 0.0,
        }
    }

    /// The close price, or `None` if it is missing (non-finite).
    pub fn close_price(&self) -> Option<f64> {
        self.close.is_finite().then_some(self.close)
    }
}

/// Ordered, duplicate-free, non-empty sequence of bars.
///
/// Construction is the only place the ordering invariants are checked; the
/// series cannot be mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarSeries {
    bars: Vec<Bar>,
}

impl BarSeries {
    /// Build a series from bars already sorted ascending by date.
    pub fn new(bars: Vec<Bar>) -> Result<Self> {
        if bars.is_empty() {
            return Err(CoreError::invalid("bar series is empty"));
        }
        for (i, pair) in bars.windows(2).enumerate() {
            if pair[1].date <= pair[0].date {
                return Err(CoreError::invalid(format!(
                    "bar dates must be strictly ascending: bar {} ({}) follows {}",
                    i + 1,
                    pair[1].date,
                    pair[0].date
                )));
            }
        }
        Ok(Self { bars })
    }

    /// Build a series of consecutive calendar days from close prices.
    pub fn from_closes(start: NaiveDate, closes: &[f64]) -> Result<Self> {
        let bars = closes
            .iter()
            .enumerate()
            .map(|(i, &close)| Bar::from_close(start + chrono::Duration::days(i as i64), close))
            .collect();
        Self::new(bars)
    }

    pub fn first(&self) -> &Bar {
        &self.bars[0]
    }

    pub fn last(&self) -> &Bar {
        &self.bars[self.bars.len() - 1]
    }

    pub fn into_inner(self) -> Vec<Bar> {
        self.bars
    }
}

impl Deref for BarSeries {
    type Target = [Bar];

    fn deref(&self) -> &[Bar] {
        &self.bars
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn missing_close_is_none() {
        let mut bar = Bar::from_close(day(2), 100.0);
        assert_eq!(bar.close_price(), Some(100.0));
        bar.close = f64::NAN;
        assert_eq!(bar.close_price(), None);
    }

    #[test]
    fn series_rejects_empty() {
        let err = BarSeries::new(vec![]).unwrap_err();
        assert!(matches!(err, CoreError::InvalidInput(_)));
    }

    #[test]
    fn series_rejects_duplicate_dates() {
        let bars = vec![Bar::from_close(day(2), 1.0), Bar::from_close(day(2), 2.0)];
        assert!(BarSeries::new(bars).is_err());
    }

    #[test]
    fn series_rejects_descending_dates() {
        let bars = vec![Bar::from_close(day(3), 1.0), Bar::from_close(day(2), 2.0)];
        assert!(BarSeries::new(bars).is_err());
    }

    #[test]
    fn series_derefs_to_slice() {
        let series = BarSeries::from_closes(day(2), &[1.0, 2.0, 3.0]).unwrap();
        assert_eq!(series.len(), 3);
        assert_eq!(series.first().close, 1.0);
        assert_eq!(series.last().close, 3.0);
        assert_eq!(series[1].date, day(3));
    }

    #[test]
    fn bar_serialization_roundtrip() {
        let bar = Bar::from_close(day(2), 103.0);
        let json = serde_json::to_string(&bar).unwrap();
        let deser: Bar = serde_json::from_str(&json).unwrap();
        assert_eq!(bar, deser);
    }
}
