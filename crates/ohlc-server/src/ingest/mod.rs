//! Streaming CSV ingestion
//!
//! A single producer reads the upload row by row and pushes parsed records
//! into a bounded queue; a fixed pool of workers batches them and writes each
//! batch through a [`RecordSink`]. Memory stays bounded by
//! `queue_capacity + worker_count * batch_size` records regardless of the
//! upload size.
//!
//! # Architecture
//!
//! ```text
//! upload ──> RecordReader ──> bounded queue ──> BatchWorker x N ──> RecordSink
//!                 │                                   │
//!                 └──────── FirstError + abort token ─┘
//! ```
//!
//! - [`parser`]: one row to one [`OhlcRecord`](ohlc_common::OhlcRecord)
//! - [`reader`]: header check and lazy row iteration over any `AsyncRead`
//! - [`queue`]: cancellation-aware bounded queue
//! - [`worker`]: per-worker batching and flushing
//! - [`coordinator`]: one run from header to outcome

pub mod config;
pub mod coordinator;
pub mod error;
pub mod parser;
pub mod queue;
pub mod reader;
pub mod sink;
pub mod slot;
pub mod worker;

pub use config::PipelineConfig;
pub use coordinator::{IngestSummary, IngestionCoordinator, RunState};
pub use error::{IngestError, IngestResult, ParseError, SinkError};
pub use sink::RecordSink;
