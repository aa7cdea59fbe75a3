//! Row parser: one CSV row in, one validated [`OhlcRecord`] out.

use csv_async::StringRecord;
use ohlc_common::types::{COLUMN_COUNT, EXPECTED_HEADER};
use ohlc_common::{OhlcError, OhlcRecord};

use super::error::ParseError;

/// Check a header row against [`EXPECTED_HEADER`]: exact names, order and count.
pub fn is_valid_header(row: &StringRecord) -> bool {
    row.len() == EXPECTED_HEADER.len()
        && row.iter().zip(EXPECTED_HEADER.iter()).all(|(got, want)| got == *want)
}

/// Parse one data row (`UNIX,SYMBOL,OPEN,HIGH,LOW,CLOSE`).
///
/// Fields are taken verbatim; surrounding whitespace makes a number invalid.
pub fn parse_record(row: &StringRecord, line: u64) -> Result<OhlcRecord, ParseError> {
    if row.len() != COLUMN_COUNT {
        return Err(ParseError::ColumnCount {
            line,
            expected: COLUMN_COUNT,
            found: row.len(),
        });
    }

    // Length checked above, so every index below is present.
    let field = |idx: usize| row.get(idx).unwrap_or_default();

    let unix_raw = field(0);
    let unix_ms: i64 = unix_raw.parse().map_err(|_| ParseError::Timestamp {
        line,
        value: unix_raw.to_string(),
    })?;

    let open = parse_price(field(2), EXPECTED_HEADER[2], line)?;
    let high = parse_price(field(3), EXPECTED_HEADER[3], line)?;
    let low = parse_price(field(4), EXPECTED_HEADER[4], line)?;
    let close = parse_price(field(5), EXPECTED_HEADER[5], line)?;

    OhlcRecord::new(unix_ms, field(1), open, high, low, close).map_err(|e| match e {
        OhlcError::NegativeTimestamp(_) => ParseError::Timestamp {
            line,
            value: unix_raw.to_string(),
        },
        OhlcError::EmptySymbol => ParseError::Symbol { line },
    })
}

/// Prices must be finite: out-of-range literals (`1e400`) and the `inf` /
/// `NaN` spellings are rejected, as they would not round-trip through JSON.
fn parse_price(raw: &str, column: &'static str, line: u64) -> Result<f64, ParseError> {
    raw.parse::<f64>()
        .ok()
        .filter(|price| price.is_finite())
        .ok_or_else(|| ParseError::Price {
            line,
            column,
            value: raw.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(fields: &[&str]) -> StringRecord {
        StringRecord::from(fields.to_vec())
    }

    #[test]
    fn test_valid_header() {
        assert!(is_valid_header(&row(&EXPECTED_HEADER)));
    }

    #[test]
    fn test_header_rejects_missing_column() {
        assert!(!is_valid_header(&row(&["UNIX", "SYMBOL", "OPEN", "HIGH", "LOW"])));
    }

    #[test]
    fn test_header_rejects_reordered_or_renamed() {
        assert!(!is_valid_header(&row(&["SYMBOL", "UNIX", "OPEN", "HIGH", "LOW", "CLOSE"])));
        assert!(!is_valid_header(&row(&["unix", "SYMBOL", "OPEN", "HIGH", "LOW", "CLOSE"])));
        assert!(!is_valid_header(&row(&[
            "UNIX", "SYMBOL", "OPEN", "HIGH", "LOW", "CLOSE", "VOLUME"
        ])));
    }

    #[test]
    fn test_parse_valid_row() {
        let rec = parse_record(
            &row(&["1735689600000", "BTCUSDT", "42123.29", "42148.32", "42120.82", "42146.06"]),
            2,
        )
        .unwrap();

        assert_eq!(rec.unix_ms(), 1735689600000);
        assert_eq!(rec.symbol(), "BTCUSDT");
        assert_eq!(rec.open(), 42123.29);
        assert_eq!(rec.high(), 42148.32);
        assert_eq!(rec.low(), 42120.82);
        assert_eq!(rec.close(), 42146.06);
    }

    #[test]
    fn test_parse_accepts_exponent_and_integer_prices() {
        let rec = parse_record(&row(&["0", "ETHUSDT", "1e3", "2000", "-5", ".5"]), 2).unwrap();
        assert_eq!(rec.open(), 1000.0);
        assert_eq!(rec.low(), -5.0);
        assert_eq!(rec.close(), 0.5);
    }

    #[test]
    fn test_parse_rejects_non_finite_prices() {
        for bad in ["1e400", "-1e400", "inf", "-inf", "infinity", "NaN", "nan"] {
            let err = parse_record(&row(&["1", "BTCUSDT", bad, "2", "3", "4"]), 2).unwrap_err();
            assert_eq!(
                err,
                ParseError::Price {
                    line: 2,
                    column: "OPEN",
                    value: bad.to_string()
                },
                "{bad:?} should fail"
            );
        }
    }

    #[test]
    fn test_parse_accepts_extreme_finite_prices() {
        let rec = parse_record(&row(&["1", "BTCUSDT", "1e308", "1e-320", "-1.7e308", "0"]), 2).unwrap();
        assert_eq!(rec.open(), 1e308);
        assert!(rec.high().is_finite());
    }

    #[test]
    fn test_parse_wrong_column_count() {
        let err = parse_record(&row(&["1", "BTCUSDT", "1", "2", "3"]), 7).unwrap_err();
        assert_eq!(
            err,
            ParseError::ColumnCount {
                line: 7,
                expected: 6,
                found: 5
            }
        );
    }

    #[test]
    fn test_parse_bad_timestamp() {
        for bad in ["", "12.5", "abc", "0x10", " 1"] {
            let err = parse_record(&row(&[bad, "BTCUSDT", "1", "2", "3", "4"]), 2).unwrap_err();
            assert!(matches!(err, ParseError::Timestamp { .. }), "{bad:?} should fail");
        }
    }

    #[test]
    fn test_parse_negative_timestamp() {
        let err = parse_record(&row(&["-1", "BTCUSDT", "1", "2", "3", "4"]), 4).unwrap_err();
        assert_eq!(
            err,
            ParseError::Timestamp {
                line: 4,
                value: "-1".to_string()
            }
        );
    }

    #[test]
    fn test_parse_empty_symbol() {
        let err = parse_record(&row(&["1", "", "1", "2", "3", "4"]), 5).unwrap_err();
        assert_eq!(err, ParseError::Symbol { line: 5 });
    }

    #[test]
    fn test_parse_reports_offending_price_column() {
        let err = parse_record(&row(&["1", "BTCUSDT", "1", "2", "x", "4"]), 9).unwrap_err();
        assert_eq!(err.column(), Some("LOW"));
        assert_eq!(err.line(), 9);

        let err = parse_record(&row(&["1", "BTCUSDT", "1", "2", "3", ""]), 9).unwrap_err();
        assert_eq!(err.column(), Some("CLOSE"));
    }
}
