//! Bound on simultaneous engine processes.

use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use vl_core::{Error, Result};

/// Semaphore shared by every probe, trim and merge.
///
/// A permit is held for the lifetime of one external process.
#[derive(Debug, Clone)]
pub struct TranscodeGate {
    semaphore: Arc<Semaphore>,
    capacity: usize,
}

impl TranscodeGate {
    /// A gate admitting `max_concurrent` holders (minimum 1).
    pub fn new(max_concurrent: usize) -> Self {
        let capacity = max_concurrent.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    /// Wait for a free slot.
    pub async fn acquire(&self) -> Result<OwnedSemaphorePermit> {
        self.semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| Error::Internal(format!("transcode gate closed: {e}")))
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Slots not currently held.
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }
}
