//! Resource importer
//!
//! Resolves a reference to content:
//! 1. parse the reference and dispatch on its scheme
//! 2. expand a pattern (local glob or concurrent remote fetch) when asked to
//! 3. read or fetch each item, decode it by file extension unless `raw`
//! 4. wrap it in an [`Envelope`] when `nofail` or `metadata` is set
//!
//! Per-item failures are recorded in the envelope under `nofail`; anything
//! reported by [`ImportError::is_fatal`] always propagates.

use crate::envelope::{Envelope, EnvelopeBuilder, Imported, RemoteLocation};
use crate::error::ImportError;
use crate::fetcher::ConcurrentFetcher;
use crate::options::ImportOptions;
use crate::reference::{Reference, RemoteRef};
use crate::remote::{GetObject, ObjectStore, Remotes};
use recode_core::{display_chain, Decoded, Registry};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Resolves import references against a registry and remote stores
#[derive(Debug, Clone)]
pub struct Importer {
    registry: Arc<Registry>,
    remotes: Remotes,
    base_dir: Option<PathBuf>,
}

impl Importer {
    /// Importer for local files only
    #[inline]
    #[must_use]
    pub fn new(registry: Arc<Registry>) -> Self {
        Self {
            registry,
            remotes: Remotes::new(),
            base_dir: None,
        }
    }

    /// Use these remote stores
    #[inline]
    #[must_use]
    pub fn with_remotes(mut self, remotes: Remotes) -> Self {
        self.remotes = remotes;
        self
    }

    /// Resolve relative local paths against `dir`
    #[inline]
    #[must_use]
    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(dir.into());
        self
    }

    /// Base directory for relative paths
    #[inline]
    #[must_use]
    pub fn base_dir(&self) -> Option<&Path> {
        self.base_dir.as_deref()
    }

    /// Import one reference
    ///
    /// # Errors
    /// - fatal errors (`UnknownScheme`, `UnsupportedOperation`, bad glob, ...)
    /// - without `nofail`, the first item failure
    pub fn import(&self, reference: &str, options: ImportOptions) -> Result<Imported, ImportError> {
        tracing::debug!(reference, ?options, "importing");
        match Reference::parse(reference)? {
            Reference::Local(path) => {
                if options.pattern {
                    self.import_local_pattern(&glob_text(self.base_dir.as_deref(), &path), options)
                } else {
                    self.import_local(&self.resolve(&path), options)
                }
            }
            Reference::Remote(remote) => {
                let store = self.remotes.store(&remote.scheme).ok_or_else(|| {
                    ImportError::UnsupportedOperation {
                        operation: "remote import without a configured store",
                        reference: reference.to_string(),
                    }
                })?;
                if options.pattern {
                    if !store.supports_listing() {
                        return Err(ImportError::UnsupportedOperation {
                            operation: "pattern import",
                            reference: reference.to_string(),
                        });
                    }
                    self.import_remote_pattern(store, &remote, reference, options)
                } else {
                    self.import_remote(store, &remote, reference, options)
                }
            }
        }
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }

    fn import_local(&self, path: &Path, options: ImportOptions) -> Result<Imported, ImportError> {
        let url = path.display().to_string();
        let outcome = std::fs::read(path)
            .map_err(|source| ImportError::Open {
                path: path.to_path_buf(),
                source,
            })
            .and_then(|bytes| self.decode_item(&url, &url, &bytes, options));
        finish(EnvelopeBuilder::new(url), outcome, options)
    }

    fn import_local_pattern(&self, text: &str, options: ImportOptions) -> Result<Imported, ImportError> {
        let matches = glob::glob(text).map_err(|source| ImportError::Pattern {
            pattern: text.to_string(),
            source,
        })?;

        let mut items = Vec::new();
        for entry in matches {
            let item = match entry {
                Ok(path) => self.import_local(&path, options),
                Err(err) => {
                    let path = err.path().to_path_buf();
                    let builder = EnvelopeBuilder::new(path.display().to_string());
                    let source = err.into_error();
                    finish(builder, Err(ImportError::Open { path, source }), options)
                }
            };
            items.push(item?);
        }
        tracing::debug!(pattern = %text, matched = items.len(), "local pattern imported");
        Ok(Imported::List(items))
    }

    fn import_remote(
        &self,
        store: &Arc<dyn ObjectStore>,
        remote: &RemoteRef,
        reference: &str,
        options: ImportOptions,
    ) -> Result<Imported, ImportError> {
        let builder = EnvelopeBuilder::new(reference).location(RemoteLocation {
            bucket: remote.bucket.clone(),
            key: remote.key.clone(),
            version: remote.version.clone(),
        });
        let request = GetObject::new(&remote.bucket, &remote.key).with_version(remote.version.clone());

        let outcome = self
            .remotes
            .block_on(store.get_object(&request))?
            .map_err(|source| ImportError::Fetch {
                url: reference.to_string(),
                source,
            })
            .and_then(|bytes| self.decode_item(reference, &remote.key, &bytes, options));
        finish(builder, outcome, options)
    }

    fn import_remote_pattern(
        &self,
        store: &Arc<dyn ObjectStore>,
        remote: &RemoteRef,
        reference: &str,
        options: ImportOptions,
    ) -> Result<Imported, ImportError> {
        let fetcher = ConcurrentFetcher::new(Arc::clone(store), self.remotes.fetcher_config().clone());
        let fetched = self
            .remotes
            .block_on(fetcher.fetch(&remote.bucket, &remote.key))?
            .map_err(|source| match source {
                crate::error::FetchError::InvalidPattern { pattern, source } => {
                    ImportError::Pattern { pattern, source }
                }
                source => ImportError::FetchPattern {
                    url: reference.to_string(),
                    source,
                },
            });

        let fetched = match fetched {
            Ok(fetched) => fetched,
            Err(err) => {
                // the whole fetch failed, so there is one envelope for the pattern
                let builder = EnvelopeBuilder::new(reference).location(RemoteLocation {
                    bucket: remote.bucket.clone(),
                    key: remote.key.clone(),
                    version: None,
                });
                return finish(builder, Err(err), options).map(|item| Imported::List(vec![item]));
            }
        };

        let mut items = Vec::with_capacity(fetched.len());
        for (key, body) in fetched {
            let url = remote.url_for(&key);
            let outcome = self.decode_item(&url, &key, &body, options);
            let builder = EnvelopeBuilder::new(&url).location(RemoteLocation {
                bucket: remote.bucket.clone(),
                key,
                version: None,
            });
            items.push(finish(builder, outcome, options)?);
        }
        tracing::debug!(reference, matched = items.len(), "remote pattern imported");
        Ok(Imported::List(items))
    }

    fn decode_item(
        &self,
        url: &str,
        name: &str,
        bytes: &[u8],
        options: ImportOptions,
    ) -> Result<Decoded, ImportError> {
        if options.raw {
            return Ok(Decoded::new(Value::String(
                String::from_utf8_lossy(bytes).into_owned(),
            )));
        }
        decode_by_extension(&self.registry, url, name, bytes)
    }
}

/// Glob text for a local pattern, relative ones joined onto `base`
///
/// Metacharacters in `base` match literally.
pub(crate) fn glob_text(base: Option<&Path>, pattern: &Path) -> String {
    match base {
        Some(base) if pattern.is_relative() => {
            let base = glob::Pattern::escape(&base.to_string_lossy());
            Path::new(&base).join(pattern).to_string_lossy().into_owned()
        }
        _ => pattern.to_string_lossy().into_owned(),
    }
}

/// Decode content with the decoder named by the extension of `name`
///
/// The extension is the text after the last `.` of the file name,
/// case-sensitive.
///
/// # Errors
/// - `ImportError::MissingExtension`, `ImportError::UnknownExtension`
/// - `ImportError::Decode` wrapping the codec error
pub fn decode_by_extension(
    registry: &Registry,
    url: &str,
    name: &str,
    bytes: &[u8],
) -> Result<Decoded, ImportError> {
    let file_name = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let extension = match file_name.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() => ext,
        _ => {
            return Err(ImportError::MissingExtension {
                url: url.to_string(),
            })
        }
    };

    let decoder = registry
        .decoder(extension)
        .ok_or_else(|| ImportError::UnknownExtension {
            extension: extension.to_string(),
            url: url.to_string(),
        })?;

    decoder
        .decode(&mut &bytes[..], &[])
        .map_err(|source| ImportError::Decode {
            url: url.to_string(),
            source,
        })
}

/// Apply `nofail` and wrapping rules to one item
fn finish(
    builder: EnvelopeBuilder,
    outcome: Result<Decoded, ImportError>,
    options: ImportOptions,
) -> Result<Imported, ImportError> {
    let envelope: Envelope = match outcome {
        Ok(decoded) => builder.body(decoded.value).metadata(decoded.metadata).build(),
        Err(err) if options.nofail && !err.is_fatal() => {
            tracing::warn!(url = builder.url(), error = %display_chain(&err), "import failed, error captured");
            builder.error(err).build()
        }
        Err(err) => return Err(err),
    };

    if options.wraps() {
        Ok(Imported::Envelope(envelope))
    } else {
        Ok(Imported::Value(envelope.into_body().unwrap_or(Value::Null)))
    }
}
