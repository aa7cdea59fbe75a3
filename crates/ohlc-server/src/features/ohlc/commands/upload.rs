use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::io::AsyncRead;
use tokio_util::sync::CancellationToken;
use tokio_util::task::AbortOnDropHandle;

use crate::ingest::{IngestError, IngestSummary, IngestionCoordinator};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadOhlcResponse {
    pub processed_rows: u64,
}

impl From<IngestSummary> for UploadOhlcResponse {
    fn from(summary: IngestSummary) -> Self {
        Self {
            processed_rows: summary.processed_rows,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum UploadOhlcError {
    #[error("file is required")]
    FileRequired,
    #[error(transparent)]
    Ingest(#[from] IngestError),
}

/// Stream one CSV upload into the store.
///
/// The run is cancelled cooperatively when `timeout` elapses, or when this
/// future is dropped (the client went away).
#[tracing::instrument(skip_all, fields(timeout_secs = timeout.as_secs()))]
pub async fn handle<R>(
    coordinator: &IngestionCoordinator,
    reader: R,
    timeout: Duration,
) -> Result<UploadOhlcResponse, UploadOhlcError>
where
    R: AsyncRead + Unpin + Send,
{
    let cancel = CancellationToken::new();
    let _cancel_on_drop = cancel.clone().drop_guard();

    let _deadline = {
        let cancel = cancel.clone();
        AbortOnDropHandle::new(tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            tracing::warn!("Upload deadline reached, cancelling run");
            cancel.cancel();
        }))
    };

    let summary = coordinator.run(reader, &cancel).await?;
    Ok(summary.into())
}
