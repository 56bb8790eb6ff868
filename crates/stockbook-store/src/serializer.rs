//! # Write Serializer
//!
//! Guarantees at most one mutating operation executes against the store at
//! any time.
//!
//! ## How It Works
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Write Serializer                        │
//! │                                                             │
//! │  caller A ──enqueue(op)──┐                                  │
//! │  caller B ──enqueue(op)──┤   mpsc (unbounded, FIFO)         │
//! │  caller C ──enqueue(op)──┘        │                         │
//! │                                   ▼                         │
//! │                          ┌─────────────────┐                │
//! │                          │  worker task    │  one op in     │
//! │                          │  recv → run →   │  flight at a   │
//! │                          │  send result    │  time          │
//! │                          └─────────────────┘                │
//! │                                   │                         │
//! │       oneshot per job ◄───────────┘                         │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Operations run strictly in submission order. A failing operation sends
//! its error back through its own oneshot and does not block operations
//! queued after it. Reads bypass this component entirely and may interleave
//! with a pending write's suspension points; callers needing read-after-write
//! consistency must await the write first.
//!
//! Once enqueued, an operation is not cancellable: abandoning the `enqueue`
//! future leaves the job in the queue and the worker still runs it, which
//! preserves ordering for subsequent callers.

use std::future::Future;
use std::pin::Pin;

use tokio::sync::{mpsc, oneshot};
use tracing::debug;

use crate::error::{LedgerError, LedgerResult};

/// The running half of a queued job.
type JobFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

/// A queued write operation, already bound to its result channel.
type Job = Box<dyn FnOnce() -> JobFuture + Send>;

/// Serializes mutating store operations onto a single worker task.
///
/// Cloning hands out another sender to the same queue. Constructed once when
/// the [`Ledger`](crate::Ledger) opens; there is no explicit teardown - the
/// worker exits when the last handle drops.
#[derive(Clone)]
pub struct WriteSerializer {
    queue: mpsc::UnboundedSender<Job>,
}

impl WriteSerializer {
    /// Spawns the worker task and returns the handle.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn() -> Self {
        let (queue, mut jobs) = mpsc::unbounded_channel::<Job>();

        tokio::spawn(async move {
            while let Some(job) = jobs.recv().await {
                job().await;
            }
            debug!("write serializer queue closed, worker exiting");
        });

        WriteSerializer { queue }
    }

    /// Enqueues a mutating operation, returning a future for its result.
    ///
    /// The job enters the queue when `enqueue` is *called*, not when the
    /// returned future is first polled; dropping the future abandons the
    /// result, never the operation. The operation starts only after every
    /// previously enqueued operation has finished, successfully or not.
    pub fn enqueue<T, F, Fut>(&self, op: F) -> impl Future<Output = LedgerResult<T>> + Send
    where
        T: Send + 'static,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = LedgerResult<T>> + Send + 'static,
    {
        let (done_tx, done_rx) = oneshot::channel();

        let job: Job = Box::new(move || {
            let fut: JobFuture = Box::pin(async move {
                let result = op().await;
                // The caller may have abandoned its await; the operation has
                // still fully run, so ordering holds for later writes.
                let _ = done_tx.send(result);
            });
            fut
        });

        let sent = self.queue.send(job);

        async move {
            sent.map_err(|_| {
                LedgerError::Storage("write serializer is not running".to_string())
            })?;

            done_rx.await.map_err(|_| {
                LedgerError::Storage("write serializer dropped the operation".to_string())
            })?
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_runs_in_submission_order() {
        let serializer = WriteSerializer::spawn();
        let log = Arc::new(std::sync::Mutex::new(Vec::new()));

        let push = |i: u32, delay_ms: u64| {
            let serializer = serializer.clone();
            let log = Arc::clone(&log);
            async move {
                serializer
                    .enqueue(move || async move {
                        // Sleeps inverted to submission order: without FIFO
                        // draining, later jobs would finish first.
                        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                        log.lock().unwrap().push(i);
                        Ok(())
                    })
                    .await
            }
        };

        // enqueue sends at call time and join! polls in argument order, so
        // jobs enter the queue as 0,1,2,3.
        let (a, b, c, d) = tokio::join!(push(0, 40), push(1, 30), push(2, 20), push(3, 10));
        a.unwrap();
        b.unwrap();
        c.unwrap();
        d.unwrap();

        assert_eq!(*log.lock().unwrap(), vec![0, 1, 2, 3]);
    }

    #[tokio::test]
    async fn test_failure_does_not_block_queue() {
        let serializer = WriteSerializer::spawn();

        let failed: LedgerResult<()> = serializer
            .enqueue(|| async { Err(LedgerError::Storage("boom".to_string())) })
            .await;
        assert!(failed.is_err());

        let ok = serializer.enqueue(|| async { Ok(41 + 1) }).await.unwrap();
        assert_eq!(ok, 42);
    }

    #[tokio::test]
    async fn test_abandoned_caller_still_runs() {
        let serializer = WriteSerializer::spawn();
        let ran = Arc::new(AtomicU32::new(0));

        let ran_clone = Arc::clone(&ran);
        let fut = serializer.enqueue(move || async move {
            ran_clone.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        // Drop the await - the job must still execute.
        drop(fut);

        serializer.enqueue(|| async { Ok(()) }).await.unwrap();
        assert_eq!(ran.load(Ordering::SeqCst), 1);
    }
}
