//! Durable-write boundary of the pipeline
//!
//! Workers only ever see a [`RecordSink`]. The production implementation is
//! [`PgOhlcRepository`](crate::db::ohlc::PgOhlcRepository); tests substitute
//! in-memory sinks.

use async_trait::async_trait;
use ohlc_common::OhlcRecord;

use super::error::SinkError;

/// Storage that accepts batches of records atomically.
#[async_trait]
pub trait RecordSink: Send + Sync {
    /// Persist every record in `records`, or none of them.
    ///
    /// Called with a non-empty batch; an empty slice must be a no-op.
    async fn bulk_write(&self, records: &[OhlcRecord]) -> Result<(), SinkError>;
}
