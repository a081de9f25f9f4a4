//! Error taxonomy for the indicator engine and the simulator.
//!
//! Every failure is detected before any output is produced. There is no
//! partial or degraded result.

use thiserror::Error;

/// Errors raised by the core pipeline stages.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    /// Empty series, non-positive parameters, or otherwise unusable input.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A bar lacks a usable value for a field the stage depends on.
    #[error("bar {index} is missing a usable '{field}' value")]
    MissingField { index: usize, field: &'static str },

    /// Both a buy and a sell flag are set on the same bar.
    #[error("bar {index} carries both a buy and a sell flag")]
    ConflictingSignals { index: usize },
}

impl CoreError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        CoreError::InvalidInput(msg.into())
    }
}

pub type Result<T, E = CoreError> = std::result::Result<T, E>;
