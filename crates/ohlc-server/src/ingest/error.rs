//! Ingestion pipeline error taxonomy

use thiserror::Error;

/// Result type alias for pipeline operations
pub type IngestResult<T> = std::result::Result<T, IngestError>;

/// Every way an ingestion run can end without success.
///
/// Only the first error of a run is ever reported; see
/// [`FirstError`](super::slot::FirstError).
#[derive(Error, Debug)]
pub enum IngestError {
    /// Missing, unreadable or mismatched header row. Raised before any
    /// record is produced, so nothing was written.
    #[error("invalid header")]
    InvalidHeader,

    /// A data row could not be read as CSV.
    #[error("invalid csv row: {0}")]
    Read(String),

    /// A data row was read but a field failed validation.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// A batch write failed.
    #[error(transparent)]
    Sink(#[from] SinkError),

    /// The caller's cancellation signal (timeout or disconnect) fired.
    #[error("request cancelled")]
    Cancelled,

    /// A worker task ended without reporting (panic or abort).
    #[error("ingestion worker failed: {0}")]
    WorkerPanicked(String),
}

impl IngestError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, IngestError::Cancelled)
    }
}

/// Field-level failure for one data row.
///
/// `line` is the 1-based line number in the upload (the header is line 1).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("line {line}: invalid column count: expected {expected}, found {found}")]
    ColumnCount {
        line: u64,
        expected: usize,
        found: usize,
    },

    #[error("line {line}: invalid unix timestamp {value:?}")]
    Timestamp { line: u64, value: String },

    #[error("line {line}: symbol cannot be empty")]
    Symbol { line: u64 },

    #[error("line {line}: invalid price in column {column}: {value:?}")]
    Price {
        line: u64,
        column: &'static str,
        value: String,
    },
}

impl ParseError {
    /// Name of the offending column, if the failure is tied to one.
    pub fn column(&self) -> Option<&'static str> {
        match self {
            ParseError::ColumnCount { .. } => None,
            ParseError::Timestamp { .. } => Some("UNIX"),
            ParseError::Symbol { .. } => Some("SYMBOL"),
            ParseError::Price { column, .. } => Some(*column),
        }
    }

    pub fn line(&self) -> u64 {
        match self {
            ParseError::ColumnCount { line, .. }
            | ParseError::Timestamp { line, .. }
            | ParseError::Symbol { line }
            | ParseError::Price { line, .. } => *line,
        }
    }
}

/// A failed `bulk_write`. The batch it was given was not persisted.
#[derive(Error, Debug)]
pub enum SinkError {
    #[error("bulk insert failed: {0}")]
    Database(#[from] sqlx::Error),

    #[error("bulk insert failed: {0}")]
    Write(String),
}
