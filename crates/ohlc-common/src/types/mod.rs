//! Common types used across the OHLC service

use serde::Serialize;

use crate::error::{OhlcError, Result};

/// Column names an upload must start with, in order.
pub const EXPECTED_HEADER: [&str; 6] = ["UNIX", "SYMBOL", "OPEN", "HIGH", "LOW", "CLOSE"];

/// Number of columns in every data row.
pub const COLUMN_COUNT: usize = EXPECTED_HEADER.len();

/// One market bar: timestamp, symbol and open/high/low/close prices.
///
/// Prices are stored as parsed; no ordering between them (e.g. `high >= low`)
/// is checked.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OhlcRecord {
    #[serde(rename = "unix")]
    unix_ms: i64,
    symbol: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
}

impl OhlcRecord {
    /// Build a record, rejecting negative timestamps and empty symbols.
    pub fn new(
        unix_ms: i64,
        symbol: impl Into<String>,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
    ) -> Result<Self> {
        if unix_ms < 0 {
            return Err(OhlcError::NegativeTimestamp(unix_ms));
        }
        let symbol = symbol.into();
        if symbol.is_empty() {
            return Err(OhlcError::EmptySymbol);
        }

        Ok(Self {
            unix_ms,
            symbol,
            open,
            high,
            low,
            close,
        })
    }

    /// Bar timestamp in epoch milliseconds
    pub fn unix_ms(&self) -> i64 {
        self.unix_ms
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn open(&self) -> f64 {
        self.open
    }

    pub fn high(&self) -> f64 {
        self.high
    }

    pub fn low(&self) -> f64 {
        self.low
    }

    pub fn close(&self) -> f64 {
        self.close
    }
}
