//! Indicator implementations.
//!
//! Both indicators are computed in a single left-to-right pass. Each value
//! depends on the one before it, so there is no chunked or parallel form.

pub mod ema;
pub mod macd;

pub use ema::{ema_of_series, Ema};
pub use macd::{compute_indicators, IndicatorRecord, MacdParams};

/// Create a bar series from close prices for testing.
#[cfg(test)]
pub fn make_bars(closes: &[f64]) -> Vec<crate::domain::Bar> {
    let base_date = chrono::NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            crate::domain::Bar::from_close(base_date + chrono::Duration::days(i as i64), close)
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
