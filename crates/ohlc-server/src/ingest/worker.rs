//! Batch worker
//!
//! Each worker owns a private batch. It pulls records off the shared queue,
//! flushes the batch to the [`RecordSink`] whenever it fills up, and flushes
//! the remainder once the producer has closed the queue.

use ohlc_common::OhlcRecord;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::queue::{Dequeued, QueueConsumer};
use super::sink::RecordSink;
use super::slot::FirstError;

/// Upper bound on the batch buffer reserved up front; larger batches grow on demand.
const INITIAL_BATCH_CAPACITY: usize = 1024;

/// How a worker left its loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerExit {
    /// Queue closed and drained; every record taken was flushed.
    Drained { batches: usize },
    /// The run token fired before the worker was done.
    Cancelled,
    /// A flush failed; the error went to the run's [`FirstError`].
    Failed,
}

/// Handles shared by every worker of one run
#[derive(Clone)]
pub struct WorkerContext {
    pub run_id: Uuid,
    pub sink: Arc<dyn RecordSink>,
    pub errors: Arc<FirstError>,
    pub processed: Arc<AtomicU64>,
    /// Run-level token: fires on external cancellation or on the first sink failure.
    pub abort: CancellationToken,
}

enum Flush {
    Written,
    Cancelled,
    Failed,
}

pub struct BatchWorker {
    id: usize,
    batch_size: usize,
    queue: QueueConsumer<OhlcRecord>,
    ctx: WorkerContext,
}

impl BatchWorker {
    pub fn new(id: usize, batch_size: usize, queue: QueueConsumer<OhlcRecord>, ctx: WorkerContext) -> Self {
        Self {
            id,
            batch_size: batch_size.max(1),
            queue,
            ctx,
        }
    }

    #[tracing::instrument(name = "ingest_worker", skip_all, fields(run_id = %self.ctx.run_id, worker = self.id))]
    pub async fn run(self) -> WorkerExit {
        let mut batch = Vec::with_capacity(self.batch_size.min(INITIAL_BATCH_CAPACITY));
        let mut batches = 0usize;

        loop {
            match self.queue.dequeue(&self.ctx.abort).await {
                Dequeued::Item(record) => {
                    self.ctx.processed.fetch_add(1, Ordering::Relaxed);
                    batch.push(record);

                    if batch.len() >= self.batch_size {
                        match self.flush(&mut batch).await {
                            Flush::Written => batches += 1,
                            Flush::Cancelled => return WorkerExit::Cancelled,
                            Flush::Failed => return WorkerExit::Failed,
                        }
                    }
                },
                Dequeued::Drained => {
                    if !batch.is_empty() {
                        match self.flush(&mut batch).await {
                            Flush::Written => batches += 1,
                            Flush::Cancelled => return WorkerExit::Cancelled,
                            Flush::Failed => return WorkerExit::Failed,
                        }
                    }
                    tracing::debug!(batches, "Queue drained, worker exiting");
                    return WorkerExit::Drained { batches };
                },
                Dequeued::Cancelled => {
                    tracing::debug!(pending = batch.len(), "Worker cancelled, dropping pending batch");
                    return WorkerExit::Cancelled;
                },
            }
        }
    }

    /// Write `batch` and clear it. The write races the run token; a dropped
    /// write future rolls its transaction back.
    async fn flush(&self, batch: &mut Vec<OhlcRecord>) -> Flush {
        let size = batch.len();
        let result = tokio::select! {
            biased;
            _ = self.ctx.abort.cancelled() => return Flush::Cancelled,
            result = self.ctx.sink.bulk_write(batch) => result,
        };

        match result {
            Ok(()) => {
                tracing::debug!(batch_size = size, "Batch written");
                batch.clear();
                Flush::Written
            },
            Err(e) => {
                tracing::warn!(batch_size = size, error = %e, "Batch write failed, aborting run");
                // Record before cancelling so the producer's Cancelled never wins the slot.
                self.ctx.errors.report(e.into());
                self.ctx.abort.cancel();
                Flush::Failed
            },
        }
    }
}
