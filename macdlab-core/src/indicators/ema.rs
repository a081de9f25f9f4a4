//! Exponential Moving Average (EMA), recursive "adjust=false" form.
//!
//! alpha = 2 / (span + 1)
//! EMA[0] = x[0]
//! EMA[t] = alpha * x[t] + (1 - alpha) * EMA[t-1]
//!
//! Historical terms are never re-weighted, so the early values differ from
//! a bias-adjusted weighted average.

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ema {
    span: usize,
    alpha: f64,
}

impl Ema {
    /// `span` must be >= 1; callers validate before constructing.
    pub fn new(span: usize) -> Self {
        debug_assert!(span >= 1, "EMA span must be >= 1");
        Self {
            span,
            alpha: 2.0 / (span as f64 + 1.0),
        }
    }

    pub fn span(&self) -> usize {
        self.span
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// One recursion step from the previous smoothed value.
    #[inline]
    pub fn step(&self, prev: f64, value: f64) -> f64 {
        self.alpha * value + (1.0 - self.alpha) * prev
    }

    /// Smooth an entire series, seeded with its first observation.
    pub fn smooth(&self, values: &[f64]) -> Vec<f64> {
        let Some((&seed, rest)) = values.split_first() else {
            return Vec::new();
        };
        let mut out = Vec::with_capacity(values.len());
        out.push(seed);
        rest.iter().fold(seed, |prev, &value| {
            let next = self.step(prev, value);
            out.push(next);
            next
        });
        out
    }
}

/// Compute EMA values of an arbitrary series with the given span.
pub fn ema_of_series(values: &[f64], span: usize) -> Vec<f64> {
    Ema::new(span).smooth(values)
}
