//! Error types for sequence validation, matrix arithmetic and searches.

use std::time::Duration;

use thiserror::Error;

/// The given character is not a valid symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid symbol: {0:?}")]
pub struct InvalidSymbol(pub char);

/// Malformed input, detected before any search begins.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error(transparent)]
    InvalidSymbol(#[from] InvalidSymbol),
    /// A sequence does not have the same length as the first one.
    #[error("sequence {index} has length {found}, expected {expected}")]
    LengthMismatch {
        index: usize,
        expected: usize,
        found: usize,
    },
    /// The motif width is zero or not smaller than the sequence length.
    #[error("invalid motif width {width} for sequences of length {length}")]
    InvalidWidth { width: usize, length: usize },
    /// No sequences or instances were given.
    #[error("empty input")]
    Empty,
    /// The search needs more sequences than given.
    #[error("at least {required} sequences are required, found {found}")]
    TooFewSequences { required: usize, found: usize },
}

/// A numeric operation without a finite result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DomainError {
    /// The log-odds of a zero frequency was requested.
    #[error("logarithm of a zero frequency at position {position} for symbol {symbol:?}")]
    LogOfZero { position: usize, symbol: char },
    /// A row could not be normalized.
    #[error("row {row} has a non-positive total")]
    NonPositiveTotal { row: usize },
}

/// The main error type of the crate.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error(transparent)]
    Input(#[from] InputError),
    #[error(transparent)]
    Domain(#[from] DomainError),
    /// A single Gibbs trial ran out of budget before converging.
    #[error("no convergence after {passes} passes ({elapsed:?})")]
    ConvergenceTimeout { passes: usize, elapsed: Duration },
    /// Every trial of an aggregation run failed.
    #[error("none of the {trials} trials succeeded")]
    NoSuccessfulTrial { trials: usize },
}

impl From<InvalidSymbol> for Error {
    fn from(e: InvalidSymbol) -> Self {
        Error::Input(InputError::InvalidSymbol(e))
    }
}

impl Error {
    /// Whether the aggregator may skip the failing trial and carry on.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::ConvergenceTimeout { .. })
    }
}
