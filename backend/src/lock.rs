use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::warn;

/// Process-wide mutual exclusion for the sheet store.
///
/// Every request serializes through this lock with a bounded acquisition
/// wait. On timeout the request proceeds *without* the guard rather than
/// failing - a liveness-over-safety tradeoff that only holds up because
/// request rates are human-scale.
#[derive(Clone)]
pub struct StoreLock {
    inner: Arc<Mutex<()>>,
    wait: Duration,
}

impl StoreLock {
    pub fn new(wait: Duration) -> Self {
        Self {
            inner: Arc::new(Mutex::new(())),
            wait,
        }
    }

    /// Acquire the lock, waiting at most the configured duration.
    ///
    /// Returns `None` on timeout; the caller is expected to proceed anyway.
    pub async fn acquire(&self) -> Option<OwnedMutexGuard<()>> {
        match tokio::time::timeout(self.wait, self.inner.clone().lock_owned()).await {
            Ok(guard) => Some(guard),
            Err(_) => {
                warn!(
                    "store lock not acquired within {:?}; proceeding unguarded",
                    self.wait
                );
                None
            }
        }
    }
}
