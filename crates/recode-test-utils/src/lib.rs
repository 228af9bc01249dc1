//! Testing utilities for the recode workspace
//!
//! Shared fixtures: an in-memory object store with pagination and fault
//! injection, temp directory builders and a ready registry.

#![allow(missing_docs)]

use async_trait::async_trait;
use bytes::Bytes;
use recode_core::Registry;
use recode_import::{GetObject, ListObjects, ListPage, ObjectStore, ObjectSummary, RemoteError, VarFilesFilter};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tempfile::TempDir;

/// In-memory [`ObjectStore`]
///
/// Objects are listed in key order, `page_size` per page. Failures and panics
/// can be injected per key; listing can fail at a given page.
#[derive(Debug)]
pub struct MemoryStore {
    objects: BTreeMap<(String, String), Vec<(Option<String>, Bytes)>>,
    page_size: usize,
    listing: bool,
    fail_listing_page: Option<usize>,
    failing_keys: HashSet<String>,
    panicking_keys: HashSet<String>,
    get_delay: Option<Duration>,
    get_calls: AtomicUsize,
    list_calls: AtomicUsize,
    listed_prefixes: Mutex<Vec<String>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            objects: BTreeMap::new(),
            page_size: 1000,
            listing: true,
            fail_listing_page: None,
            failing_keys: HashSet::new(),
            panicking_keys: HashSet::new(),
            get_delay: None,
            get_calls: AtomicUsize::new(0),
            list_calls: AtomicUsize::new(0),
            listed_prefixes: Mutex::new(Vec::new()),
        }
    }

    /// Add (or add a newer version of) an object
    #[must_use]
    pub fn with_object(self, bucket: &str, key: &str, body: impl Into<Bytes>) -> Self {
        self.with_versioned_object(bucket, key, None, body)
    }

    #[must_use]
    pub fn with_versioned_object(
        mut self,
        bucket: &str,
        key: &str,
        version: Option<&str>,
        body: impl Into<Bytes>,
    ) -> Self {
        self.objects
            .entry((bucket.to_string(), key.to_string()))
            .or_default()
            .push((version.map(str::to_string), body.into()));
        self
    }

    #[must_use]
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Behave like a store without listing support
    #[must_use]
    pub fn without_listing(mut self) -> Self {
        self.listing = false;
        self
    }

    /// Listing fails when page `page` (1-based) is requested
    #[must_use]
    pub fn fail_listing_at(mut self, page: usize) -> Self {
        self.fail_listing_page = Some(page);
        self
    }

    #[must_use]
    pub fn fail_get(mut self, key: &str) -> Self {
        self.failing_keys.insert(key.to_string());
        self
    }

    #[must_use]
    pub fn panic_on_get(mut self, key: &str) -> Self {
        self.panicking_keys.insert(key.to_string());
        self
    }

    #[must_use]
    pub fn with_get_delay(mut self, delay: Duration) -> Self {
        self.get_delay = Some(delay);
        self
    }

    pub fn get_calls(&self) -> usize {
        self.get_calls.load(Ordering::SeqCst)
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn listed_prefixes(&self) -> Vec<String> {
        self.listed_prefixes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn get_object(&self, request: &GetObject) -> Result<Bytes, RemoteError> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.get_delay {
            tokio::time::sleep(delay).await;
        }
        assert!(
            !self.panicking_keys.contains(&request.key),
            "injected panic for '{}'",
            request.key
        );
        if self.failing_keys.contains(&request.key) {
            return Err(RemoteError::transport(std::io::Error::other(format!(
                "injected failure for '{}'",
                request.key
            ))));
        }

        let not_found = || RemoteError::NotFound {
            bucket: request.bucket.clone(),
            key: request.key.clone(),
        };
        let versions = self
            .objects
            .get(&(request.bucket.clone(), request.key.clone()))
            .ok_or_else(not_found)?;
        let body = match &request.version {
            None => versions.last().map(|(_, body)| body),
            Some(version) => versions
                .iter()
                .find(|(v, _)| v.as_deref() == Some(version.as_str()))
                .map(|(_, body)| body),
        };
        body.cloned().ok_or_else(not_found)
    }

    async fn list_objects(&self, request: &ListObjects) -> Result<ListPage, RemoteError> {
        if !self.listing {
            return Err(RemoteError::ListingUnsupported);
        }
        let page = self.list_calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.listed_prefixes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request.prefix.clone());
        if self.fail_listing_page == Some(page) {
            return Err(RemoteError::transport(std::io::Error::other(format!(
                "injected listing failure on page {page}"
            ))));
        }

        let mut keys = self
            .objects
            .keys()
            .filter(|(bucket, key)| *bucket == request.bucket && key.starts_with(&request.prefix))
            .map(|(_, key)| key)
            .filter(|key| {
                request
                    .continuation_token
                    .as_ref()
                    .map_or(true, |token| key.as_str() > token.as_str())
            })
            .peekable();

        let mut objects = Vec::new();
        while objects.len() < self.page_size {
            match keys.next() {
                Some(key) => objects.push(ObjectSummary::new(key.clone())),
                None => break,
            }
        }
        let next_continuation_token = match keys.peek() {
            Some(_) => objects.last().map(|o: &ObjectSummary| o.key.clone()),
            None => None,
        };

        Ok(ListPage {
            objects,
            next_continuation_token,
        })
    }

    fn supports_listing(&self) -> bool {
        self.listing
    }
}

/// Temp directory with `(relative path, content)` files
pub fn fixture_dir(files: &[(&str, &str)]) -> TempDir {
    let dir = tempfile::tempdir().expect("create temp dir");
    write_files(dir.path(), files);
    dir
}

/// Write files under `root`, creating parent directories
pub fn write_files(root: &Path, files: &[(&str, &str)]) {
    for (name, content) in files {
        let path = root.join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create fixture dir");
        }
        std::fs::write(&path, content).expect("write fixture file");
    }
}

/// Built-in codecs plus `varfiles`, initialized
pub fn test_registry() -> Arc<Registry> {
    let mut registry = Registry::with_builtin_codecs().expect("builtin codecs");
    registry
        .register_filter(VarFilesFilter::new())
        .expect("varfiles filter");
    registry.initialize().expect("initialize registry")
}
