//! Router assembly
//!
//! ```text
//! GET  /health  database ping
//! POST /data    CSV upload
//! GET  /data    paginated read
//! ```

use axum::{
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use tower_http::limit::RequestBodyLimitLayer;

use crate::config::Config;
use crate::features::{self, ohlc::OhlcStore, FeatureState};
use crate::ingest::{IngestionCoordinator, RecordSink};
use crate::middleware;

/// Everything the HTTP layer needs
#[derive(Clone)]
pub struct AppState {
    pub sink: Arc<dyn RecordSink>,
    pub store: Arc<dyn OhlcStore>,
}

impl AppState {
    /// Use one value as both the write sink and the read store.
    pub fn from_repository<T>(repository: T) -> Self
    where
        T: RecordSink + OhlcStore + 'static,
    {
        let repository = Arc::new(repository);
        Self {
            sink: repository.clone(),
            store: repository,
        }
    }
}

/// Create the application router with all routes and middleware
pub fn create_router(state: AppState, config: &Config) -> Router {
    let pipeline = config.ingest.pipeline();

    let feature_state = FeatureState {
        coordinator: IngestionCoordinator::new(state.sink.clone(), pipeline),
        store: state.store.clone(),
        upload_timeout: config.ingest.upload_timeout(),
    };

    Router::new()
        .route("/health", get(health_check))
        .with_state(state.store)
        .merge(features::router(feature_state))
        // Uploads stream through the pipeline; the only cap is the configured body limit.
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(config.ingest.max_upload_bytes))
        .layer(middleware::tracing_layer(&pipeline))
        .layer(middleware::cors_layer(&config.cors))
}

/// Health check handler
async fn health_check(State(store): State<Arc<dyn OhlcStore>>) -> Response {
    match store.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "database": "connected"
            })),
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Database health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "unavailable" })),
            )
                .into_response()
        },
    }
}
