//! Crossover detection with one-bar look-back.
//!
//! Upward: current line > trigger AND previous line <= previous trigger.
//! Downward: current line < trigger AND previous line >= previous trigger.
//!
//! The triggering side needs strict inequality, so equality at both samples
//! is never a crossover. The two conditions are mutually exclusive.

use serde::{Deserialize, Serialize};

/// Direction of a crossover at a single bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Crossover {
    /// Line crossed above its trigger (bullish).
    Up,
    /// Line crossed below its trigger (bearish).
    Down,
    None,
}

impl Crossover {
    pub fn is_up(self) -> bool {
        self == Crossover::Up
    }

    pub fn is_down(self) -> bool {
        self == Crossover::Down
    }
}

/// Classify the transition from `prev` to `cur`, each a `(line, trigger)` pair.
///
/// `prev` is `None` for the first sample, which never crosses.
pub fn detect_crossover(prev: Option<(f64, f64)>, cur: (f64, f64)) -> Crossover {
    let Some((line_prev, trigger_prev)) = prev else {
        return Crossover::None;
    };
    let (line, trigger) = cur;

    if line > trigger && line_prev <= trigger_prev {
        Crossover::Up
    } else if line < trigger && line_prev >= trigger_prev {
        Crossover::Down
    } else {
        Crossover::None
    }
}
