//! Middleware for the OHLC server
//!
//! - CORS (Cross-Origin Resource Sharing)
//! - Request logging with tracing, tagged with the ingest pool settings

use axum::http::{header, HeaderValue, Method, Request};
use std::time::Duration;
use tower_http::{
    classify::{ServerErrorsAsFailures, SharedClassifier},
    cors::{Any, CorsLayer},
    trace::{DefaultOnResponse, MakeSpan, TraceLayer},
};
use tracing::{Level, Span};

use crate::config::CorsConfig;
use crate::ingest::PipelineConfig;

/// Create CORS layer from configuration
pub fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::ACCEPT, header::CONTENT_TYPE, header::CONTENT_LENGTH])
        .max_age(Duration::from_secs(3600));

    let wildcard = config.allowed_origins.is_empty() || config.allowed_origins.iter().any(|o| o == "*");
    if wildcard {
        if config.allow_credentials {
            tracing::warn!("CORS credentials cannot be combined with a wildcard origin; ignoring");
        }
        return cors.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    cors.allow_origin(origins)
        .allow_credentials(config.allow_credentials)
}

/// Span for every HTTP request, carrying the pipeline sizing in effect
#[derive(Debug, Clone, Copy)]
pub struct RequestSpan {
    worker_count: usize,
    batch_size: usize,
}

impl RequestSpan {
    pub fn new(pipeline: &PipelineConfig) -> Self {
        Self {
            worker_count: pipeline.worker_count,
            batch_size: pipeline.batch_size,
        }
    }
}

impl<B> MakeSpan<B> for RequestSpan {
    fn make_span(&mut self, request: &Request<B>) -> Span {
        tracing::info_span!(
            "request",
            method = %request.method(),
            uri = %request.uri(),
            version = ?request.version(),
            workers = self.worker_count,
            batch_size = self.batch_size,
        )
    }
}

/// Create tracing/logging layer
pub fn tracing_layer(
    pipeline: &PipelineConfig,
) -> TraceLayer<SharedClassifier<ServerErrorsAsFailures>, RequestSpan> {
    TraceLayer::new_for_http()
        .make_span_with(RequestSpan::new(pipeline))
        .on_response(
            DefaultOnResponse::new()
                .level(Level::INFO)
                .latency_unit(tower_http::LatencyUnit::Millis),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cors_layer_with_specific_origins() {
        let config = CorsConfig {
            allowed_origins: vec!["http://localhost:3000".to_string(), "https://example.com".to_string()],
            allow_credentials: true,
        };
        let _layer = cors_layer(&config);
    }

    #[test]
    fn test_cors_wildcard_with_credentials_does_not_panic() {
        let config = CorsConfig {
            allowed_origins: vec!["*".to_string()],
            allow_credentials: true,
        };
        let _layer = cors_layer(&config);
    }

    #[test]
    fn test_request_span_carries_pipeline_settings() {
        let pipeline = PipelineConfig::default().with_workers(3).with_batch_size(42);
        let mut make = RequestSpan::new(&pipeline);
        assert_eq!(make.worker_count, 3);
        assert_eq!(make.batch_size, 42);

        let request = Request::builder().uri("/data").body(()).unwrap();
        let _span = make.make_span(&request);
    }
}
