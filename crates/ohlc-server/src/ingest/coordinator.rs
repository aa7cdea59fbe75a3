//! Ingestion run coordinator
//!
//! One call to [`IngestionCoordinator::run`] is one ingestion run:
//!
//! 1. validate the header (`Idle`); a bad header ends the run before any
//!    worker exists;
//! 2. spawn the worker pool, then stream records into the bounded queue from
//!    the calling task (`Streaming`);
//! 3. close the queue, join every worker and resolve a single outcome
//!    (`Succeeded`, `Failed` or `Cancelled`), then release the run (`Closed`).
//!
//! The caller's token cancels the whole run. Internally the run holds a child
//! token, `abort`, which a failing worker trips to stop its siblings and the
//! producer without touching the caller's token.

use ohlc_common::OhlcRecord;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::io::AsyncRead;
use tokio::task::JoinSet;
use tokio_util::sync::{CancellationToken, DropGuard};
use uuid::Uuid;

use super::config::PipelineConfig;
use super::error::{IngestError, IngestResult};
use super::queue::{bounded_queue, EnqueueError, QueueProducer};
use super::reader::RecordReader;
use super::sink::RecordSink;
use super::slot::FirstError;
use super::worker::{BatchWorker, WorkerContext, WorkerExit};

/// Lifecycle of one run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Idle,
    Streaming,
    Succeeded,
    Failed,
    Cancelled,
    Closed,
}

impl RunState {
    pub fn as_str(&self) -> &str {
        match self {
            RunState::Idle => "idle",
            RunState::Streaming => "streaming",
            RunState::Succeeded => "succeeded",
            RunState::Failed => "failed",
            RunState::Cancelled => "cancelled",
            RunState::Closed => "closed",
        }
    }
}

/// Result of a successful run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IngestSummary {
    pub processed_rows: u64,
}

/// Runs uploads through the reader, queue and worker pool into a sink.
#[derive(Clone)]
pub struct IngestionCoordinator {
    sink: Arc<dyn RecordSink>,
    config: PipelineConfig,
}

impl IngestionCoordinator {
    pub fn new(sink: Arc<dyn RecordSink>, config: PipelineConfig) -> Self {
        Self { sink, config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Ingest one CSV stream.
    ///
    /// Returns the number of records taken off the queue by workers. Batches
    /// committed before a failure stay committed.
    #[tracing::instrument(
        name = "ingest_run",
        skip_all,
        fields(
            run_id = tracing::field::Empty,
            workers = self.config.worker_count,
            batch_size = self.config.batch_size,
        )
    )]
    pub async fn run<R>(&self, reader: R, cancel: &CancellationToken) -> IngestResult<IngestSummary>
    where
        R: AsyncRead + Unpin + Send,
    {
        let run_id = Uuid::new_v4();
        tracing::Span::current().record("run_id", tracing::field::display(run_id));
        tracing::debug!(state = RunState::Idle.as_str(), "Run created");

        let mut records = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(IngestError::Cancelled),
            opened = RecordReader::open(reader) => opened?,
        };

        let mut run = PipelineRun::start(run_id, self.sink.clone(), self.config, cancel);
        run.produce(&mut records).await;
        run.finish().await
    }
}

/// State owned by a run between header validation and the outcome
struct PipelineRun {
    state: RunState,
    producer: Option<QueueProducer<OhlcRecord>>,
    workers: JoinSet<WorkerExit>,
    errors: Arc<FirstError>,
    processed: Arc<AtomicU64>,
    abort: CancellationToken,
    producer_cancelled: bool,
    _abort_on_drop: DropGuard,
}

impl PipelineRun {
    fn start(
        run_id: Uuid,
        sink: Arc<dyn RecordSink>,
        config: PipelineConfig,
        cancel: &CancellationToken,
    ) -> Self {
        let abort = cancel.child_token();
        let (producer, consumer) = bounded_queue(config.queue_capacity);

        let ctx = WorkerContext {
            run_id,
            sink,
            errors: Arc::new(FirstError::new()),
            processed: Arc::new(AtomicU64::new(0)),
            abort: abort.clone(),
        };

        // Workers are running before the first record is enqueued.
        let mut workers = JoinSet::new();
        for id in 0..config.worker_count.max(1) {
            let worker = BatchWorker::new(id, config.batch_size, consumer.clone(), ctx.clone());
            workers.spawn(worker.run());
        }

        let mut run = Self {
            state: RunState::Idle,
            producer: Some(producer),
            workers,
            errors: ctx.errors,
            processed: ctx.processed,
            _abort_on_drop: abort.clone().drop_guard(),
            abort,
            producer_cancelled: false,
        };
        run.transition(RunState::Streaming);
        run
    }

    fn transition(&mut self, next: RunState) {
        tracing::debug!(from = self.state.as_str(), to = next.as_str(), "Run state changed");
        self.state = next;
    }

    /// Feed records into the queue until input ends, a row fails, or the run
    /// is aborted. Always closes the queue.
    async fn produce<R>(&mut self, records: &mut RecordReader<R>)
    where
        R: AsyncRead + Unpin + Send,
    {
        let Some(producer) = self.producer.take() else {
            return;
        };

        let mut sent = 0u64;
        loop {
            let next = tokio::select! {
                biased;
                _ = self.abort.cancelled() => {
                    self.producer_cancelled = true;
                    break;
                },
                next = records.next_record() => next,
            };

            match next {
                Ok(Some(record)) => match producer.enqueue(record, &self.abort).await {
                    Ok(()) => sent += 1,
                    Err(EnqueueError::Cancelled) => {
                        self.producer_cancelled = true;
                        break;
                    },
                    Err(EnqueueError::Closed) => {
                        tracing::warn!("All workers exited before input ended");
                        break;
                    },
                },
                Ok(None) => break,
                Err(e) => {
                    match &e {
                        IngestError::Parse(bad) => tracing::warn!(
                            line = bad.line(),
                            column = bad.column(),
                            error = %e,
                            "Stopping run on bad row"
                        ),
                        _ => tracing::warn!(line = records.line(), error = %e, "Stopping run on unreadable row"),
                    }
                    self.errors.report(e);
                    break;
                },
            }
        }

        tracing::debug!(records_sent = sent, "Producer finished, closing queue");
        producer.close();
    }

    /// Join every worker and resolve the run's single outcome.
    async fn finish(mut self) -> IngestResult<IngestSummary> {
        let mut worker_cancelled = false;

        while let Some(joined) = self.workers.join_next().await {
            match joined {
                Ok(WorkerExit::Cancelled) => worker_cancelled = true,
                Ok(WorkerExit::Drained { .. }) | Ok(WorkerExit::Failed) => {},
                Err(e) => {
                    tracing::error!(error = %e, "Ingestion worker did not complete");
                    self.errors.report(IngestError::WorkerPanicked(e.to_string()));
                    self.abort.cancel();
                },
            }
        }

        let processed_rows = self.processed.load(Ordering::Relaxed);
        let outcome = match self.errors.take() {
            Some(err) => Err(err),
            None if worker_cancelled || self.producer_cancelled => Err(IngestError::Cancelled),
            None => Ok(IngestSummary { processed_rows }),
        };

        match &outcome {
            Ok(_) => {
                self.transition(RunState::Succeeded);
                tracing::info!(processed_rows, "Ingestion run succeeded");
            },
            Err(e) if e.is_cancelled() => {
                self.transition(RunState::Cancelled);
                tracing::info!(processed_rows, "Ingestion run cancelled");
            },
            Err(e) => {
                self.transition(RunState::Failed);
                tracing::warn!(processed_rows, error = %e, "Ingestion run failed");
            },
        }

        self.transition(RunState::Closed);
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::error::SinkError;
    use async_trait::async_trait;
    use std::sync::Mutex;

    const HEADER: &str = "UNIX,SYMBOL,OPEN,HIGH,LOW,CLOSE\n";

    #[derive(Default)]
    struct MemorySink {
        batches: Mutex<Vec<Vec<i64>>>,
        fail_on_call: Option<usize>,
    }

    #[async_trait]
    impl RecordSink for MemorySink {
        async fn bulk_write(&self, records: &[OhlcRecord]) -> Result<(), SinkError> {
            let mut batches = self.batches.lock().unwrap();
            if self.fail_on_call == Some(batches.len()) {
                return Err(SinkError::Write("connection reset".to_string()));
            }
            batches.push(records.iter().map(OhlcRecord::unix_ms).collect());
            Ok(())
        }
    }

    fn csv(rows: usize) -> String {
        let mut out = HEADER.to_string();
        for i in 0..rows {
            out.push_str(&format!("{},BTCUSDT,1.0,2.0,0.5,1.5\n", 1_700_000_000_000 + i as i64));
        }
        out
    }

    fn coordinator(sink: Arc<MemorySink>, workers: usize, batch: usize) -> IngestionCoordinator {
        let config = PipelineConfig::default()
            .with_workers(workers)
            .with_batch_size(batch)
            .with_queue_capacity(8);
        IngestionCoordinator::new(sink, config)
    }

    #[test]
    fn test_run_state_names() {
        assert_eq!(RunState::Streaming.as_str(), "streaming");
        assert_eq!(RunState::Succeeded.as_str(), "succeeded");
        assert_eq!(
            serde_json::to_value(RunState::Cancelled).unwrap(),
            serde_json::json!("cancelled")
        );
    }

    #[tokio::test]
    async fn test_single_worker_batches_in_order() {
        let sink = Arc::new(MemorySink::default());
        let summary = coordinator(sink.clone(), 1, 4)
            .run(csv(10).as_bytes(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(summary.processed_rows, 10);
        let sizes: Vec<usize> = sink.batches.lock().unwrap().iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![4, 4, 2]);
    }

    #[tokio::test]
    async fn test_header_error_spawns_nothing() {
        let sink = Arc::new(MemorySink::default());
        let err = coordinator(sink.clone(), 4, 4)
            .run(&b"UNIX,SYMBOL\n1,BTC\n"[..], &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, IngestError::InvalidHeader));
        assert!(sink.batches.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_bad_row_keeps_earlier_records_only() {
        let sink = Arc::new(MemorySink::default());
        let mut input = csv(5);
        input.push_str("oops,BTCUSDT,1,2,3,4\n9999999999999,BTCUSDT,1,2,3,4\n");

        let err = coordinator(sink.clone(), 2, 2)
            .run(input.as_bytes(), &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, IngestError::Parse(_)));
        let mut written: Vec<i64> = sink.batches.lock().unwrap().iter().flatten().copied().collect();
        written.sort_unstable();
        let expected: Vec<i64> = (0..5).map(|i| 1_700_000_000_000 + i).collect();
        assert_eq!(written, expected, "rows before the bad one drain and flush");
    }

    #[tokio::test]
    async fn test_oversized_sizes_do_not_panic() {
        let sink = Arc::new(MemorySink::default());
        let config = PipelineConfig::default()
            .with_workers(2)
            .with_batch_size(usize::MAX)
            .with_queue_capacity(usize::MAX);

        let summary = IngestionCoordinator::new(sink.clone(), config)
            .run(csv(3).as_bytes(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(summary.processed_rows, 3);
        let total: usize = sink.batches.lock().unwrap().iter().map(Vec::len).sum();
        assert_eq!(total, 3);
    }

    #[tokio::test]
    async fn test_sink_failure_is_the_outcome() {
        let sink = Arc::new(MemorySink {
            fail_on_call: Some(0),
            ..Default::default()
        });
        let err = coordinator(sink.clone(), 3, 2)
            .run(csv(50).as_bytes(), &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, IngestError::Sink(_)));
        assert_eq!(err.to_string(), "bulk insert failed: connection reset");
    }

    #[tokio::test]
    async fn test_pre_cancelled_run_reports_cancelled() {
        let sink = Arc::new(MemorySink::default());
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = coordinator(sink.clone(), 2, 2)
            .run(csv(20).as_bytes(), &cancel)
            .await
            .unwrap_err();

        assert!(err.is_cancelled());
        assert!(sink.batches.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_worker_count_does_not_change_processed_rows() {
        for workers in [1, 2, 4, 8] {
            let sink = Arc::new(MemorySink::default());
            let summary = coordinator(sink.clone(), workers, 7)
                .run(csv(100).as_bytes(), &CancellationToken::new())
                .await
                .unwrap();

            assert_eq!(summary.processed_rows, 100, "workers = {workers}");
            let total: usize = sink.batches.lock().unwrap().iter().map(Vec::len).sum();
            assert_eq!(total, 100);
        }
    }
}
