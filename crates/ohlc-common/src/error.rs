//! Error types for OHLC records

use thiserror::Error;

/// Result type alias for OHLC operations
pub type Result<T> = std::result::Result<T, OhlcError>;

/// Record invariant violations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OhlcError {
    #[error("Timestamp must be non-negative epoch milliseconds, got {0}")]
    NegativeTimestamp(i64),

    #[error("Symbol cannot be empty")]
    EmptySymbol,
}
