//! Two-state position machine: all cash or all invested.

use serde::{Deserialize, Serialize};

/// Holdings at a point in the walk.
///
/// The strategy never splits capital, so the state is either all cash or
/// all shares.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Position {
    Flat { balance: f64 },
    Invested { shares: f64 },
}

/// What the machine did at one bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Buy,
    Sell,
    /// Unconditional end-of-series conversion back to cash.
    Liquidate,
    Hold,
}

impl Position {
    pub fn flat(balance: f64) -> Self {
        Position::Flat { balance }
    }

    pub fn is_invested(&self) -> bool {
        matches!(self, Position::Invested { .. })
    }

    pub fn balance(&self) -> f64 {
        match *self {
            Position::Flat { balance } => balance,
            Position::Invested { .. } => 0.0,
        }
    }

    pub fn shares(&self) -> f64 {
        match *self {
            Position::Flat { .. } => 0.0,
            Position::Invested { shares } => shares,
        }
    }

    /// Mark-to-market value at `price`.
    pub fn equity(&self, price: f64) -> f64 {
        match *self {
            Position::Flat { balance } => balance,
            Position::Invested { shares } => shares * price,
        }
    }

    /// Apply one bar's flags. A buy is checked before a sell; a buy while
    /// invested and a sell while flat are ignored.
    pub fn on_bar(self, buy: bool, sell: bool, price: f64) -> (Position, Action) {
        match self {
            Position::Flat { balance } if buy => (
                Position::Invested {
                    shares: balance / price,
                },
                Action::Buy,
            ),
            Position::Invested { shares } if sell => (
                Position::Flat {
                    balance: shares * price,
                },
                Action::Sell,
            ),
            other => (other, Action::Hold),
        }
    }

    /// Convert any holdings to cash at `price`.
    pub fn liquidate(self, price: f64) -> (Position, Action) {
        match self {
            Position::Invested { shares } => (
                Position::Flat {
                    balance: shares * price,
                },
                Action::Liquidate,
            ),
            flat => (flat, Action::Hold),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buy_from_flat_invests_everything() {
        let (pos, action) = Position::flat(1000.0).on_bar(true, false, 50.0);
        assert_eq!(action, Action::Buy);
        assert_eq!(pos, Position::Invested { shares: 20.0 });
        assert_eq!(pos.balance(), 0.0);
    }

    #[test]
    fn sell_from_invested_returns_to_cash() {
        let (pos, action) = Position::Invested { shares: 20.0 }.on_bar(false, true, 60.0);
        assert_eq!(action, Action::Sell);
        assert_eq!(pos, Position::Flat { balance: 1200.0 });
        assert_eq!(pos.shares(), 0.0);
    }

    #[test]
    fn buy_while_invested_is_ignored() {
        let start = Position::Invested { shares: 5.0 };
        let (pos, action) = start.on_bar(true, false, 10.0);
        assert_eq!(pos, start);
        assert_eq!(action, Action::Hold);
    }

    #[test]
    fn sell_while_flat_is_ignored() {
        let start = Position::flat(500.0);
        let (pos, action) = start.on_bar(false, true, 10.0);
        assert_eq!(pos, start);
        assert_eq!(action, Action::Hold);
    }

    #[test]
    fn liquidate_only_acts_when_invested() {
        let (pos, action) = Position::Invested { shares: 3.0 }.liquidate(7.0);
        assert_eq!(action, Action::Liquidate);
        assert_eq!(pos, Position::Flat { balance: 21.0 });

        let (pos, action) = Position::flat(9.0).liquidate(7.0);
        assert_eq!(action, Action::Hold);
        assert_eq!(pos, Position::flat(9.0));
    }

    #[test]
    fn equity_marks_shares_to_market() {
        assert_eq!(Position::Invested { shares: 2.0 }.equity(15.0), 30.0);
        assert_eq!(Position::flat(42.0).equity(15.0), 42.0);
    }
}
