//! OHLC Server Library
//!
//! HTTP service that ingests market bars (timestamp, symbol, open, high, low,
//! close) from CSV uploads into PostgreSQL and serves paginated reads.
//!
//! # Overview
//!
//! - **Ingestion**: a streaming pipeline (one reader, a bounded queue, a pool
//!   of batch writers) with first-error-wins failure handling and cooperative
//!   cancellation; see [`ingest`]
//! - **Queries**: symbol-filtered, time-ordered pages
//! - **Configuration**: environment-based, see [`config`]
//!
//! # Architecture
//!
//! Features are vertical slices under [`features`]: commands (writes) and
//! queries (reads) with their own error types, wired to Axum in `routes.rs`.
//! Storage sits behind two traits, [`ingest::RecordSink`] for batch writes and
//! [`features::ohlc::OhlcStore`] for reads, both implemented by
//! [`db::ohlc::PgOhlcRepository`].
//!
//! # Example
//!
//! ```no_run
//! use ohlc_server::{api, config::Config, db};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load()?;
//!     let pool = db::create_pool(&config.database).await?;
//!     let state = api::AppState::from_repository(db::ohlc::PgOhlcRepository::new(pool));
//!     let app = api::create_router(state, &config);
//!     let listener = tokio::net::TcpListener::bind("127.0.0.1:8080").await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod features;
pub mod ingest;
pub mod middleware;
pub mod models;

pub use error::{error_response, ErrorBody};
