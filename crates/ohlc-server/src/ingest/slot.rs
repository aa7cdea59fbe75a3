//! Single-assignment error slot shared by the producer and every worker.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use super::error::IngestError;

/// Keeps the first error reported during a run and drops the rest.
///
/// The winner is decided by a compare-and-set on `claimed`; only that caller
/// ever writes `error`.
#[derive(Debug, Default)]
pub struct FirstError {
    claimed: AtomicBool,
    error: Mutex<Option<IngestError>>,
}

impl FirstError {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `err` if nothing was recorded yet.
    ///
    /// Returns `true` when this call won the slot.
    pub fn report(&self, err: IngestError) -> bool {
        if self
            .claimed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!(error = %err, "Discarding error reported after the first");
            return false;
        }

        *self.error.lock().unwrap_or_else(PoisonError::into_inner) = Some(err);
        true
    }

    /// Remove the recorded error. Call once every reporter has finished.
    pub fn take(&self) -> Option<IngestError> {
        self.error.lock().unwrap_or_else(PoisonError::into_inner).take()
    }
}
