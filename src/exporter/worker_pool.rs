//! Bounded worker pool with run-on-caller overflow.

use std::sync::Arc;
use tokio::sync::Semaphore;

/// Fixed-size pool of concurrent units of work
///
/// When a permit is free, work is spawned onto the runtime holding the permit
/// for its duration. When the pool is exhausted, the work runs on the
/// submitter's own task instead of being queued or rejected, so the submitter
/// absorbs the overload.
#[derive(Clone)]
pub struct WorkerPool {
    semaphore: Arc<Semaphore>,
}

impl WorkerPool {
    /// Create a pool with `size` concurrent slots
    pub fn new(size: usize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(size)),
        }
    }

    /// Run `future` on the pool, or on the caller when the pool is full
    pub async fn spawn_or_run<F>(&self, future: F)
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        match Arc::clone(&self.semaphore).try_acquire_owned() {
            Ok(permit) => {
                tokio::spawn(async move {
                    let _permit = permit;
                    future.await;
                });
            }
            Err(_) => future.await,
        }
    }

    /// Number of free slots
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn work_runs_spawned_when_a_slot_is_free() {
        let pool = WorkerPool::new(2);
        let counter = Arc::new(AtomicUsize::new(0));

        let c = Arc::clone(&counter);
        pool.spawn_or_run(async move {
            c.fetch_add(1, Ordering::SeqCst);
        })
        .await;

        // Spawned work completes shortly after
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert_eq!(pool.available(), 2);
    }

    #[tokio::test]
    async fn overflow_runs_on_the_caller() {
        let pool = WorkerPool::new(1);

        // Occupy the only slot with work that outlives the test body
        let blocker = pool.clone();
        blocker
            .spawn_or_run(async {
                tokio::time::sleep(Duration::from_secs(5)).await;
            })
            .await;

        // Give the spawned task a tick to hold its permit
        tokio::task::yield_now().await;
        assert_eq!(pool.available(), 0);

        // The next submission must complete inline before spawn_or_run returns
        let ran = Arc::new(AtomicUsize::new(0));
        let r = Arc::clone(&ran);
        pool.spawn_or_run(async move {
            r.fetch_add(1, Ordering::SeqCst);
        })
        .await;

        assert_eq!(ran.load(Ordering::SeqCst), 1);
    }
}
