//! OHLC Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared types, logging and error handling for the OHLC ingestion service.
//!
//! # Overview
//!
//! - **Types**: the market-bar record and the fixed CSV column layout
//! - **Error Handling**: record invariant errors and the crate result type
//! - **Logging**: `tracing` subscriber setup shared by every binary
//!
//! # Example
//!
//! ```no_run
//! use ohlc_common::types::OhlcRecord;
//!
//! let bar = OhlcRecord::new(1735689600000, "BTCUSDT", 42123.29, 42148.32, 42120.82, 42146.06)?;
//! assert_eq!(bar.symbol(), "BTCUSDT");
//! # Ok::<(), ohlc_common::OhlcError>(())
//! ```

pub mod error;
pub mod logging;
pub mod types;

// Re-export commonly used types
pub use error::{OhlcError, Result};
pub use types::{OhlcRecord, EXPECTED_HEADER};
