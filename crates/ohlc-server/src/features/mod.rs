//! Feature modules implementing the OHLC API
//!
//! Each feature is a vertical slice:
//! - `commands/` - write operations
//! - `queries/` - read operations
//! - `routes.rs` - HTTP route definitions
//!
//! # Features
//!
//! - **ohlc**: CSV ingestion and paginated reads of market bars

pub mod ohlc;
pub mod shared;

use axum::Router;
use std::sync::Arc;
use std::time::Duration;

use crate::ingest::IngestionCoordinator;
use ohlc::OhlcStore;

/// Shared state for all feature routes
#[derive(Clone)]
pub struct FeatureState {
    /// Runs uploads through the ingestion pipeline
    pub coordinator: IngestionCoordinator,
    /// Read side of the market-bar store
    pub store: Arc<dyn OhlcStore>,
    /// Time budget for one upload
    pub upload_timeout: Duration,
}

/// Creates the feature router
///
/// - `/data` - CSV upload and paginated reads
pub fn router(state: FeatureState) -> Router<()> {
    Router::new().nest("/data", ohlc::ohlc_routes().with_state(state))
}
