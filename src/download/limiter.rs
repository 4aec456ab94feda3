//! Fixed-capacity slot pool bounding concurrent transfers.
//!
//! Acquisition does not observe cancellation: a task waiting for a slot
//! still wins one before it checks the batch token, so a cancelled batch
//! drains its queue through fast-failing no-op transfers.

use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::trace;

/// Errors from the slot pool.
#[derive(Debug, thiserror::Error)]
pub enum LimiterError {
    /// A pool needs at least one slot.
    #[error("limiter capacity must be at least 1")]
    ZeroCapacity,

    /// The underlying semaphore was closed.
    #[error("limiter closed unexpectedly")]
    Closed,
}

/// Counting semaphore with capacity `max_concurrent`.
///
/// Cloning shares the same pool. No FIFO fairness is promised to callers.
#[derive(Debug, Clone)]
pub struct ConcurrencyLimiter {
    semaphore: Arc<Semaphore>,
    capacity: usize,
}

/// A held slot. Dropping it (or calling [`release`](Self::release)) returns
/// the slot to the pool.
#[derive(Debug)]
#[must_use = "dropping a slot releases it immediately"]
pub struct LimiterSlot {
    _permit: OwnedSemaphorePermit,
}

impl LimiterSlot {
    /// Returns the slot to the pool.
    pub fn release(self) {
        trace!("releasing limiter slot");
    }
}

impl ConcurrencyLimiter {
    /// Creates a pool with `capacity` slots.
    ///
    /// # Errors
    ///
    /// Returns [`LimiterError::ZeroCapacity`] when `capacity` is 0.
    pub fn new(capacity: usize) -> Result<Self, LimiterError> {
        if capacity == 0 {
            return Err(LimiterError::ZeroCapacity);
        }
        Ok(Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
        })
    }

    /// Waits until a slot is free and takes it.
    ///
    /// # Errors
    ///
    /// Returns [`LimiterError::Closed`] if the pool was closed.
    pub async fn acquire(&self) -> Result<LimiterSlot, LimiterError> {
        let permit = Arc::clone(&self.semaphore)
            .acquire_owned()
            .await
            .map_err(|_| LimiterError::Closed)?;
        trace!(available = self.available(), "acquired limiter slot");
        Ok(LimiterSlot { _permit: permit })
    }

    /// Configured number of slots.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Slots currently free.
    #[must_use]
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_zero_capacity_rejected() {
        assert!(matches!(
            ConcurrencyLimiter::new(0),
            Err(LimiterError::ZeroCapacity)
        ));
    }

    #[tokio::test]
    async fn test_acquire_and_release_track_available_slots() {
        let limiter = ConcurrencyLimiter::new(2).unwrap();
        assert_eq!(limiter.capacity(), 2);

        let first = limiter.acquire().await.unwrap();
        let second = limiter.acquire().await.unwrap();
        assert_eq!(limiter.available(), 0);

        first.release();
        assert_eq!(limiter.available(), 1);
        drop(second);
        assert_eq!(limiter.available(), 2);
    }

    #[tokio::test]
    async fn test_acquire_blocks_when_exhausted() {
        let limiter = ConcurrencyLimiter::new(1).unwrap();
        let held = limiter.acquire().await.unwrap();

        let waiting = tokio::time::timeout(Duration::from_millis(50), limiter.acquire()).await;
        assert!(waiting.is_err(), "acquire should block while the only slot is held");

        held.release();
        let slot = tokio::time::timeout(Duration::from_millis(500), limiter.acquire()).await;
        assert!(slot.is_ok());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_holders_never_exceed_capacity() {
        let limiter = ConcurrencyLimiter::new(3).unwrap();
        let current = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..20 {
            let limiter = limiter.clone();
            let current = Arc::clone(&current);
            let peak = Arc::clone(&peak);
            handles.push(tokio::spawn(async move {
                let slot = limiter.acquire().await.unwrap();
                let now = current.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(10)).await;
                current.fetch_sub(1, Ordering::SeqCst);
                slot.release();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert!(peak.load(Ordering::SeqCst) <= 3);
        assert_eq!(limiter.available(), 3);
    }
}
