//! Bounded worker pool
//!
//! A fixed number of tokio tasks share one bounded job queue:
//! - `submit` waits while the queue is full
//! - `close` stops intake; workers exit once the queue is drained
//! - cancellation stops workers between jobs, `abort` stops them immediately

use std::future::Future;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::{JoinError, JoinSet};
use tokio_util::sync::CancellationToken;

/// Pool error
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PoolError {
    /// Intake closed or every worker gone
    #[error("worker pool is closed")]
    Closed,
}

/// Fixed-size pool draining a bounded queue of `T`
#[derive(Debug)]
pub struct WorkerPool<T> {
    sender: Option<mpsc::Sender<T>>,
    workers: JoinSet<()>,
}

impl<T: Send + 'static> WorkerPool<T> {
    /// Start `workers` tasks running `handler` for every submitted job
    ///
    /// Must be called from within a tokio runtime. `workers` and
    /// `queue_capacity` are raised to at least one.
    pub fn spawn<F, Fut>(
        workers: usize,
        queue_capacity: usize,
        cancel: CancellationToken,
        handler: F,
    ) -> Self
    where
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (sender, receiver) = mpsc::channel(queue_capacity.max(1));
        let receiver = Arc::new(Mutex::new(receiver));
        let handler = Arc::new(handler);

        let mut set = JoinSet::new();
        for worker in 0..workers.max(1) {
            let receiver = Arc::clone(&receiver);
            let handler = Arc::clone(&handler);
            let cancel = cancel.clone();
            set.spawn(async move {
                loop {
                    let job = {
                        let mut receiver = receiver.lock().await;
                        tokio::select! {
                            () = cancel.cancelled() => None,
                            job = receiver.recv() => job,
                        }
                    };
                    match job {
                        Some(job) => handler(job).await,
                        None => break,
                    }
                }
                tracing::trace!(worker, "worker finished");
            });
        }

        Self {
            sender: Some(sender),
            workers: set,
        }
    }

    /// Queue a job, waiting for room
    ///
    /// # Errors
    /// - `PoolError::Closed` after `close` or once all workers have exited
    pub async fn submit(&self, job: T) -> Result<(), PoolError> {
        let sender = self.sender.as_ref().ok_or(PoolError::Closed)?;
        sender.send(job).await.map_err(|_| PoolError::Closed)
    }

    /// Stop accepting jobs; queued jobs are still processed
    pub fn close(&mut self) {
        self.sender = None;
    }

    /// Number of workers still running
    #[inline]
    #[must_use]
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Close and wait for every worker
    ///
    /// # Errors
    /// - the first worker `JoinError` (a panic)
    pub async fn join(mut self) -> Result<(), JoinError> {
        self.close();
        let mut first = None;
        while let Some(result) = self.workers.join_next().await {
            if let Err(err) = result {
                first.get_or_insert(err);
            }
        }
        first.map_or(Ok(()), Err)
    }

    /// Stop every worker now
    pub fn abort(&mut self) {
        self.close();
        self.workers.abort_all();
    }
}
