//! Bounded single-producer / multi-consumer queue
//!
//! The capacity is the pipeline's only backpressure: when workers fall behind,
//! `enqueue` waits, which in turn stops the reader from pulling more bytes off
//! the upload. Both sides wait on a [`CancellationToken`] as well, so an
//! aborted run never leaves a task parked on the queue.

use std::sync::Arc;
use tokio::sync::{mpsc, Mutex, Semaphore};
use tokio_util::sync::CancellationToken;

/// Default number of records buffered between reader and workers
pub const DEFAULT_QUEUE_CAPACITY: usize = 10_000;

/// Why an item could not be enqueued
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum EnqueueError {
    #[error("queue wait cancelled")]
    Cancelled,
    /// Every consumer has been dropped.
    #[error("queue has no consumers")]
    Closed,
}

/// Result of waiting on the queue
#[derive(Debug, PartialEq)]
pub enum Dequeued<T> {
    Item(T),
    /// The producer closed the queue and everything it sent has been taken.
    Drained,
    Cancelled,
}

/// Create a queue holding at most `capacity` items, clamped to
/// `1..=Semaphore::MAX_PERMITS`.
pub fn bounded_queue<T>(capacity: usize) -> (QueueProducer<T>, QueueConsumer<T>) {
    let (sender, receiver) = mpsc::channel(capacity.clamp(1, Semaphore::MAX_PERMITS));
    (
        QueueProducer { sender },
        QueueConsumer {
            receiver: Arc::new(Mutex::new(receiver)),
        },
    )
}

/// Sending half. Not cloneable: there is exactly one producer per queue.
#[derive(Debug)]
pub struct QueueProducer<T> {
    sender: mpsc::Sender<T>,
}

impl<T> QueueProducer<T> {
    /// Wait for a free slot and enqueue `item`, or give up when `cancel` fires.
    pub async fn enqueue(&self, item: T, cancel: &CancellationToken) -> Result<(), EnqueueError> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(EnqueueError::Cancelled),
            sent = self.sender.send(item) => sent.map_err(|_| EnqueueError::Closed),
        }
    }

    /// Signal end of input. Consumers drain what is left, then see
    /// [`Dequeued::Drained`].
    pub fn close(self) {
        drop(self.sender);
    }
}

/// Receiving half, shared by every worker of a run.
#[derive(Debug)]
pub struct QueueConsumer<T> {
    receiver: Arc<Mutex<mpsc::Receiver<T>>>,
}

impl<T> Clone for QueueConsumer<T> {
    fn clone(&self) -> Self {
        Self {
            receiver: Arc::clone(&self.receiver),
        }
    }
}

impl<T> QueueConsumer<T> {
    /// Wait for the next item in FIFO order.
    pub async fn dequeue(&self, cancel: &CancellationToken) -> Dequeued<T> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Dequeued::Cancelled,
            item = async { self.receiver.lock().await.recv().await } => match item {
                Some(item) => Dequeued::Item(item),
                None => Dequeued::Drained,
            },
        }
    }
}
