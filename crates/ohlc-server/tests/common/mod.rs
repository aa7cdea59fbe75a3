//! Shared fixtures for OHLC server integration tests
//!
//! In-memory doubles stand in for PostgreSQL so the router and the pipeline
//! can be exercised end to end without a database.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use ohlc_common::OhlcRecord;
use ohlc_server::{
    api::{self, AppState},
    config::Config,
    db::{DbError, DbResult},
    features::ohlc::{OhlcPage, OhlcStore},
    ingest::{RecordSink, SinkError},
    models::OhlcRow,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

pub const HEADER: &str = "UNIX,SYMBOL,OPEN,HIGH,LOW,CLOSE\n";
pub const BOUNDARY: &str = "ohlc-test-boundary";

// ============================================================================
// Sink double
// ============================================================================

/// Records every batch it receives.
#[derive(Default)]
pub struct MemorySink {
    calls: Mutex<Vec<Vec<OhlcRecord>>>,
    /// Zero-based call index that fails instead of writing.
    fail_on_call: Option<usize>,
    /// When set, every write blocks until the token fires.
    block_until: Option<CancellationToken>,
    /// Set once any call has started.
    started: AtomicBool,
    /// Calls that began after `observed` was cancelled.
    late_calls: Mutex<usize>,
    observed: Option<CancellationToken>,
}

impl MemorySink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing_on(call: usize) -> Arc<Self> {
        Arc::new(Self {
            fail_on_call: Some(call),
            ..Default::default()
        })
    }

    /// Blocks every write until `release` fires and counts writes that start
    /// after `observed` was cancelled.
    pub fn blocking(release: CancellationToken, observed: CancellationToken) -> Arc<Self> {
        Arc::new(Self {
            block_until: Some(release),
            observed: Some(observed),
            ..Default::default()
        })
    }

    pub fn calls(&self) -> Vec<Vec<OhlcRecord>> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_sizes(&self) -> Vec<usize> {
        self.calls().iter().map(Vec::len).collect()
    }

    pub fn written(&self) -> Vec<OhlcRecord> {
        self.calls().into_iter().flatten().collect()
    }

    pub fn has_started(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }

    pub fn late_calls(&self) -> usize {
        *self.late_calls.lock().unwrap()
    }
}

#[async_trait]
impl RecordSink for MemorySink {
    async fn bulk_write(&self, records: &[OhlcRecord]) -> Result<(), SinkError> {
        if self.observed.as_ref().is_some_and(CancellationToken::is_cancelled) {
            *self.late_calls.lock().unwrap() += 1;
        }
        self.started.store(true, Ordering::SeqCst);

        if let Some(release) = &self.block_until {
            release.cancelled().await;
        }

        let mut calls = self.calls.lock().unwrap();
        if self.fail_on_call == Some(calls.len()) {
            return Err(SinkError::Write("connection reset by peer".to_string()));
        }
        calls.push(records.to_vec());
        Ok(())
    }
}

// ============================================================================
// Store double
// ============================================================================

/// Filters, sorts and slices an in-memory table the way the SQL store does.
#[derive(Default)]
pub struct MemoryStore {
    rows: Vec<OhlcRow>,
    broken: bool,
}

impl MemoryStore {
    pub fn with_rows(rows: Vec<OhlcRow>) -> Arc<Self> {
        Arc::new(Self { rows, broken: false })
    }

    pub fn broken() -> Arc<Self> {
        Arc::new(Self {
            rows: Vec::new(),
            broken: true,
        })
    }
}

#[async_trait]
impl OhlcStore for MemoryStore {
    async fn query_page(&self, symbol: Option<&str>, limit: i64, offset: i64) -> DbResult<OhlcPage> {
        if self.broken {
            return Err(DbError::Sqlx(sqlx::Error::PoolTimedOut));
        }

        let mut matching: Vec<OhlcRow> = self
            .rows
            .iter()
            .filter(|row| symbol.map_or(true, |s| row.symbol == s))
            .cloned()
            .collect();
        matching.sort_by_key(|row| (row.unix_ms, row.id));

        let total = matching.len() as i64;
        let rows = matching
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect();

        Ok(OhlcPage { rows, total })
    }

    async fn ping(&self) -> DbResult<()> {
        if self.broken {
            Err(DbError::Sqlx(sqlx::Error::PoolTimedOut))
        } else {
            Ok(())
        }
    }
}

pub fn row(id: i64, unix_ms: i64, symbol: &str) -> OhlcRow {
    let record = OhlcRecord::new(unix_ms, symbol, 42123.29, 42148.32, 42120.82, 42146.06).unwrap();
    OhlcRow::from_record(id, &record)
}

// ============================================================================
// App and request helpers
// ============================================================================

pub fn test_config(workers: usize, batch_size: usize) -> Config {
    let mut config = Config::default();
    config.ingest.worker_count = workers;
    config.ingest.batch_size = batch_size;
    config.ingest.queue_capacity = 16;
    config
}

pub fn test_app(sink: Arc<MemorySink>, store: Arc<MemoryStore>, config: &Config) -> Router {
    let state = AppState { sink, store };
    api::create_router(state, config)
}

pub fn app_with_sink(sink: Arc<MemorySink>) -> Router {
    test_app(sink, MemoryStore::with_rows(Vec::new()), &test_config(4, 5000))
}

pub fn app_with_upload_timeout(sink: Arc<MemorySink>, timeout: Duration) -> Router {
    let mut config = test_config(1, 1);
    config.ingest.upload_timeout_secs = timeout.as_secs();
    test_app(sink, MemoryStore::with_rows(Vec::new()), &config)
}

/// CSV text with `rows` valid bars after the header.
pub fn csv_rows(rows: usize) -> String {
    let mut csv = HEADER.to_string();
    for i in 0..rows {
        csv.push_str(&format!(
            "{},BTCUSDT,42123.29,42148.32,42120.82,42146.06\n",
            1_735_689_600_000_i64 + 60_000 * i as i64
        ));
    }
    csv
}

/// `multipart/form-data` body with a single field.
pub fn multipart_body(field: &str, content: &str) -> String {
    format!(
        "--{BOUNDARY}\r\n\
         Content-Disposition: form-data; name=\"{field}\"; filename=\"bars.csv\"\r\n\
         Content-Type: text/csv\r\n\
         \r\n\
         {content}\r\n\
         --{BOUNDARY}--\r\n"
    )
}

pub fn upload_request(field: &str, content: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/data")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(field, content)))
        .unwrap()
}

pub fn get_request(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

/// Send a request and decode the JSON response body.
pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.clone().oneshot(request).await.unwrap();

    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);

    (status, json)
}
