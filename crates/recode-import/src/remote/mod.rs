//! Remote object storage
//!
//! [`ObjectStore`] is the get/list capability the importer and the concurrent
//! fetcher need from a remote backend. [`Remotes`] maps URL schemes to stores
//! and owns the runtime used to drive them from synchronous callers.

use crate::error::{ImportError, RemoteError};
use crate::fetcher::FetcherConfig;
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, OnceLock};
use tokio::runtime::Runtime;

#[cfg(feature = "s3")]
mod s3;

#[cfg(feature = "s3")]
pub use s3::S3Store;

/// Single object request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetObject {
    /// Bucket name
    pub bucket: String,
    /// Object key
    pub key: String,
    /// Specific version, latest if absent
    pub version: Option<String>,
}

impl GetObject {
    /// Latest version of `key`
    #[inline]
    #[must_use]
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
            version: None,
        }
    }

    /// Request a specific version
    #[inline]
    #[must_use]
    pub fn with_version(mut self, version: Option<String>) -> Self {
        self.version = version;
        self
    }
}

/// One listing page request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListObjects {
    /// Bucket name
    pub bucket: String,
    /// Only keys starting with this
    pub prefix: String,
    /// Token from the previous page
    pub continuation_token: Option<String>,
}

/// Listed object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectSummary {
    /// Object key
    pub key: String,
    /// Size in bytes, if reported
    pub size: Option<u64>,
    /// Version, if reported
    pub version: Option<String>,
}

impl ObjectSummary {
    /// Summary with only a key
    #[inline]
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            size: None,
            version: None,
        }
    }
}

/// One page of a listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListPage {
    /// Objects in listing order
    pub objects: Vec<ObjectSummary>,
    /// Present when more pages follow
    pub next_continuation_token: Option<String>,
}

/// Remote get/list capability
#[async_trait]
pub trait ObjectStore: Send + Sync + 'static {
    /// Fetch one object body
    async fn get_object(&self, request: &GetObject) -> Result<Bytes, RemoteError>;

    /// Fetch one listing page
    async fn list_objects(&self, _request: &ListObjects) -> Result<ListPage, RemoteError> {
        Err(RemoteError::ListingUnsupported)
    }

    /// Check if [`ObjectStore::list_objects`] is implemented
    fn supports_listing(&self) -> bool {
        false
    }
}

/// Scheme → store table plus fetch settings
///
/// Cheap to clone; clones share stores and the lazily started runtime.
#[derive(Clone, Default)]
pub struct Remotes {
    stores: HashMap<String, Arc<dyn ObjectStore>>,
    fetcher: FetcherConfig,
    runtime: Arc<OnceLock<Runtime>>,
}

impl std::fmt::Debug for Remotes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut schemes: Vec<&str> = self.stores.keys().map(String::as_str).collect();
        schemes.sort_unstable();
        f.debug_struct("Remotes")
            .field("schemes", &schemes)
            .field("fetcher", &self.fetcher)
            .field("runtime_started", &self.runtime.get().is_some())
            .finish()
    }
}

impl Remotes {
    /// No remote stores
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Route `scheme://` references to `store`
    #[must_use]
    pub fn with_store(mut self, scheme: impl Into<String>, store: Arc<dyn ObjectStore>) -> Self {
        self.stores.insert(scheme.into(), store);
        self
    }

    /// Settings for pattern fetches
    #[inline]
    #[must_use]
    pub fn with_fetcher_config(mut self, config: FetcherConfig) -> Self {
        self.fetcher = config;
        self
    }

    /// Store for a scheme
    #[must_use]
    pub fn store(&self, scheme: &str) -> Option<&Arc<dyn ObjectStore>> {
        self.stores.get(scheme)
    }

    /// Pattern fetch settings
    #[inline]
    #[must_use]
    pub fn fetcher_config(&self) -> &FetcherConfig {
        &self.fetcher
    }

    /// Check if no store is configured
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stores.is_empty()
    }

    /// Drive a store future to completion from synchronous code
    ///
    /// Refused with `ImportError::Runtime` inside an async context.
    pub(crate) fn block_on<F: Future>(&self, future: F) -> Result<F::Output, ImportError> {
        if tokio::runtime::Handle::try_current().is_ok() {
            return Err(ImportError::Runtime(std::io::Error::other(
                "remote access cannot block inside an async runtime",
            )));
        }
        if self.runtime.get().is_none() {
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .thread_name("recode-remote")
                .enable_all()
                .build()
                .map_err(ImportError::Runtime)?;
            tracing::debug!("started runtime for remote access");
            // a concurrent caller may have won; its runtime is used instead
            let _ = self.runtime.set(runtime);
        }
        match self.runtime.get() {
            Some(runtime) => Ok(runtime.block_on(future)),
            None => Err(ImportError::Runtime(std::io::Error::other(
                "runtime not available",
            ))),
        }
    }
}

#[cfg(feature = "s3")]
impl Remotes {
    /// Route `s3://` to a client configured from the AWS environment
    ///
    /// The client is built on the runtime that later drives its requests.
    ///
    /// # Errors
    /// - `ImportError::Runtime` if the runtime cannot be started
    pub fn with_s3_from_env(self) -> Result<Self, ImportError> {
        let store = self.block_on(S3Store::from_env())?;
        Ok(self.with_store("s3", Arc::new(store)))
    }
}
