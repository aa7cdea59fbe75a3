//! OHLC API routes
//!
//! # Route Structure
//!
//! - `POST /data` - Stream a CSV upload (multipart field `file`) into the store
//! - `GET /data` - Paginated, symbol-filtered read

use axum::{
    extract::{
        multipart::{Field, MultipartRejection},
        Multipart, Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use futures::TryStreamExt;
use tokio_util::io::StreamReader;

use super::{
    commands::UploadOhlcError,
    queries::{ListOhlcError, ListOhlcQuery},
};
use crate::error::error_response;
use crate::features::FeatureState;
use crate::ingest::IngestError;

const FILE_FIELD: &str = "file";

pub fn ohlc_routes() -> Router<FeatureState> {
    Router::new().route("/", post(upload_ohlc).get(list_ohlc))
}

// ============================================================================
// Command Handlers (Write Operations)
// ============================================================================

/// Ingest a CSV upload
///
/// # Response
///
/// - `201 Created` - `{"processed_rows": n}`
/// - `400 Bad Request` - no `file` field, or header mismatch
/// - `408 Request Timeout` - upload deadline reached or client gone
/// - `500 Internal Server Error` - bad row or failed write
#[tracing::instrument(
    skip_all,
    fields(
        workers = state.coordinator.config().worker_count,
        batch_size = state.coordinator.config().batch_size,
    )
)]
async fn upload_ohlc(
    State(state): State<FeatureState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, OhlcApiError> {
    let mut multipart = multipart.map_err(|e| {
        tracing::debug!(error = %e, "Request is not a multipart upload");
        UploadOhlcError::FileRequired
    })?;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => return Err(UploadOhlcError::FileRequired.into()),
            Err(e) => {
                tracing::debug!(error = %e, "Malformed multipart body");
                return Err(UploadOhlcError::FileRequired.into());
            },
        };

        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        tracing::debug!(file_name = ?field.file_name(), "Streaming upload");
        let response = super::commands::upload::handle(
            &state.coordinator,
            field_reader(field),
            state.upload_timeout,
        )
        .await?;

        tracing::info!(processed_rows = response.processed_rows, "CSV upload ingested");
        return Ok((StatusCode::CREATED, Json(response)).into_response());
    }
}

/// Adapt a multipart field into an `AsyncRead` without buffering it.
fn field_reader(field: Field<'_>) -> impl tokio::io::AsyncRead + Unpin + Send + '_ {
    StreamReader::new(Box::pin(field.map_err(std::io::Error::other)))
}

// ============================================================================
// Query Handlers (Read Operations)
// ============================================================================

/// List stored bars
///
/// # Query Parameters
///
/// - `symbol` - exact symbol filter (optional)
/// - `limit` - page size, 1 to 1000 (default 100)
/// - `offset` - rows to skip (default 0)
#[tracing::instrument(skip(state))]
async fn list_ohlc(
    State(state): State<FeatureState>,
    Query(query): Query<ListOhlcQuery>,
) -> Result<Response, OhlcApiError> {
    let response = super::queries::list::handle(state.store.as_ref(), query).await?;

    tracing::debug!(
        returned = response.data.len(),
        total_count = response.page.total_count,
        "OHLC page served"
    );

    Ok((StatusCode::OK, Json(response)).into_response())
}

// ============================================================================
// Error Handling
// ============================================================================

#[derive(Debug, thiserror::Error)]
enum OhlcApiError {
    #[error(transparent)]
    Upload(#[from] UploadOhlcError),
    #[error(transparent)]
    List(#[from] ListOhlcError),
}

impl IntoResponse for OhlcApiError {
    fn into_response(self) -> Response {
        match self {
            OhlcApiError::Upload(UploadOhlcError::FileRequired)
            | OhlcApiError::Upload(UploadOhlcError::Ingest(IngestError::InvalidHeader)) => {
                error_response(StatusCode::BAD_REQUEST, self.to_string())
            },
            OhlcApiError::Upload(UploadOhlcError::Ingest(IngestError::Cancelled)) => {
                error_response(StatusCode::REQUEST_TIMEOUT, self.to_string())
            },
            OhlcApiError::Upload(UploadOhlcError::Ingest(ref e)) => {
                tracing::error!(error = %e, "Upload failed");
                error_response(StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
            },
            OhlcApiError::List(ListOhlcError::Store(ref e)) => {
                tracing::error!(error = %e, "OHLC query failed");
                error_response(StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
            },
        }
    }
}
