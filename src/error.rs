//! Error types for parsing user-facing values

use thiserror::Error;

/// Errors raised when turning strings or numbers into engine values.
#[derive(Debug, Error, PartialEq)]
pub enum ParseError {
    #[error("unknown chart range: {0} (expected 1m, 3m, 6m, 1y or all)")]
    UnknownRange(String),

    #[error("unknown chart kind: {0} (expected strength, volume or frequency)")]
    UnknownChartKind(String),

    #[error("unknown muscle group: {0}")]
    UnknownMuscle(String),

    #[error("invalid PR key: {0}")]
    InvalidPrKey(String),

    #[error("invalid month: {year}-{month}")]
    InvalidMonth { year: i32, month: u32 },

    #[error("empty locale tag")]
    EmptyLocale,
}
