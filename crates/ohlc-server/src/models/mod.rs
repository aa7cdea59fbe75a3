//! Database models

use ohlc_common::OhlcRecord;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Stored market bar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct OhlcRow {
    pub id: i64,
    #[serde(rename = "unix")]
    #[sqlx(rename = "ts_unix_ms")]
    pub unix_ms: i64,
    pub symbol: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl OhlcRow {
    /// Pair a record with the id the store assigned to it.
    pub fn from_record(id: i64, record: &OhlcRecord) -> Self {
        Self {
            id,
            unix_ms: record.unix_ms(),
            symbol: record.symbol().to_string(),
            open: record.open(),
            high: record.high(),
            low: record.low(),
            close: record.close(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_uses_unix_key() {
        let record = OhlcRecord::new(1735689600000, "BTCUSDT", 1.0, 2.0, 0.5, 1.5).unwrap();
        let json = serde_json::to_value(OhlcRow::from_record(7, &record)).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "id": 7,
                "unix": 1735689600000_i64,
                "symbol": "BTCUSDT",
                "open": 1.0,
                "high": 2.0,
                "low": 0.5,
                "close": 1.5,
            })
        );
    }
}
