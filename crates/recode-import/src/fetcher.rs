//! Concurrent pattern fetch
//!
//! Lists a bucket page by page, keeps keys matching a glob, and downloads the
//! matches with a [`WorkerPool`]. A single collector merges the outcomes into
//! the result map.
//!
//! ```text
//! list_objects ──page──▶ KeyPattern::matches ──▶ WorkerPool(get_object ×N) ──▶ collector ──▶ BTreeMap
//! ```
//!
//! The fetch is all-or-nothing: the first listing or get error is returned
//! and no partial map is produced.

use crate::error::{FetchError, RemoteError};
use crate::pattern::KeyPattern;
use crate::pool::{PoolError, WorkerPool};
use crate::remote::{GetObject, ListObjects, ObjectStore, ObjectSummary};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Default number of download workers
pub const DEFAULT_WORKERS: usize = 16;

/// Default capacity of the job and result queues
pub const DEFAULT_QUEUE_CAPACITY: usize = 100;

/// Concurrent fetch settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetcherConfig {
    /// Parallel `get_object` workers
    pub workers: usize,
    /// Bounded queue length between stages
    pub queue_capacity: usize,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

impl FetcherConfig {
    /// Set worker count
    #[inline]
    #[must_use]
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Set queue capacity
    #[inline]
    #[must_use]
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }
}

/// Outcome of one download, tagged with its listing entry
struct FetchOutcome {
    summary: ObjectSummary,
    result: Result<Bytes, RemoteError>,
}

/// Glob fetcher over an [`ObjectStore`]
pub struct ConcurrentFetcher {
    store: Arc<dyn ObjectStore>,
    config: FetcherConfig,
    cancel: CancellationToken,
}

impl std::fmt::Debug for ConcurrentFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConcurrentFetcher")
            .field("config", &self.config)
            .field("cancelled", &self.cancel.is_cancelled())
            .finish_non_exhaustive()
    }
}

impl ConcurrentFetcher {
    /// Create fetcher
    #[inline]
    #[must_use]
    pub fn new(store: Arc<dyn ObjectStore>, config: FetcherConfig) -> Self {
        Self {
            store,
            config,
            cancel: CancellationToken::new(),
        }
    }

    /// Stop the fetch when `token` is cancelled
    #[inline]
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Fetch every object in `bucket` whose key matches `pattern`
    ///
    /// # Errors
    /// - `FetchError::InvalidPattern` for bad glob syntax
    /// - `FetchError::Listing` / `FetchError::Get` for the first remote failure
    /// - `FetchError::Cancelled` when the token fires
    /// - `FetchError::WorkerFailed` when a worker panics
    pub async fn fetch(&self, bucket: &str, pattern: &str) -> Result<BTreeMap<String, Bytes>, FetchError> {
        let matcher = KeyPattern::new(pattern).map_err(|source| FetchError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })?;
        let cancel = self.cancel.child_token();
        let (results_tx, mut results_rx) = mpsc::channel::<FetchOutcome>(self.config.queue_capacity.max(1));

        let store = Arc::clone(&self.store);
        let target = bucket.to_string();
        let mut pool = WorkerPool::spawn(
            self.config.workers,
            self.config.queue_capacity,
            cancel.clone(),
            move |summary: ObjectSummary| {
                let store = Arc::clone(&store);
                let results = results_tx.clone();
                let request = GetObject::new(target.clone(), summary.key.clone());
                async move {
                    let result = store.get_object(&request).await;
                    // collector gone means the fetch already failed
                    let _ = results.send(FetchOutcome { summary, result }).await;
                }
            },
        );

        let listing = async {
            let mut continuation_token = None;
            let mut page_number = 0usize;
            loop {
                let request = ListObjects {
                    bucket: bucket.to_string(),
                    prefix: matcher.prefix().to_string(),
                    continuation_token: continuation_token.take(),
                };
                let page = self
                    .store
                    .list_objects(&request)
                    .await
                    .map_err(|source| FetchError::Listing {
                        bucket: bucket.to_string(),
                        source,
                    })?;
                page_number += 1;
                tracing::debug!(bucket, page = page_number, objects = page.objects.len(), "listed page");

                for summary in page.objects {
                    if matcher.matches(&summary.key) {
                        pool.submit(summary).await.map_err(|PoolError::Closed| FetchError::PoolClosed)?;
                    }
                }
                match page.next_continuation_token {
                    Some(token) => continuation_token = Some(token),
                    None => break,
                }
            }
            pool.close();
            Ok::<_, FetchError>(())
        };

        let collector = async {
            let mut fetched = BTreeMap::new();
            while let Some(FetchOutcome { summary, result }) = results_rx.recv().await {
                let body = result.map_err(|source| FetchError::Get {
                    bucket: bucket.to_string(),
                    key: summary.key.clone(),
                    source,
                })?;
                tracing::trace!(key = %summary.key, bytes = body.len(), "fetched object");
                fetched.insert(summary.key, body);
            }
            Ok::<_, FetchError>(fetched)
        };

        let outcome = tokio::select! {
            biased;
            () = cancel.cancelled() => Err(FetchError::Cancelled),
            joined = async { tokio::try_join!(listing, collector) } => joined.map(|((), fetched)| fetched),
        };

        match outcome {
            Ok(fetched) => {
                pool.join().await.map_err(FetchError::WorkerFailed)?;
                tracing::debug!(bucket, pattern, matched = fetched.len(), "fetch complete");
                Ok(fetched)
            }
            Err(FetchError::PoolClosed) => match pool.join().await {
                Err(join) => Err(FetchError::WorkerFailed(join)),
                Ok(()) => Err(FetchError::PoolClosed),
            },
            Err(err) => {
                pool.abort();
                cancel.cancel();
                Err(err)
            }
        }
    }
}
