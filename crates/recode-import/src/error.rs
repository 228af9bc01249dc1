//! Error types for importing
//!
//! Provides error handling for:
//! - Reference parsing and scheme dispatch
//! - Local file access and glob expansion
//! - Remote object access and concurrent fetch
//! - Decoding imported content
//!
//! [`ImportError::is_fatal`] separates configuration mistakes, which always
//! propagate, from per-item resource failures that `nofail` may capture.

use recode_core::{BoxError, CodecError};
use std::path::PathBuf;

/// Errors reported by an object store
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    /// No object under that key (and version)
    #[error("object '{key}' not found in bucket '{bucket}'")]
    NotFound { bucket: String, key: String },

    /// Store cannot enumerate keys
    #[error("store does not support listing")]
    ListingUnsupported,

    /// Network, auth or service failure
    #[error("remote request failed")]
    Transport(#[source] BoxError),
}

impl RemoteError {
    /// Wrap a transport level failure
    pub fn transport(source: impl Into<BoxError>) -> Self {
        Self::Transport(source.into())
    }
}

/// Errors from a concurrent pattern fetch
///
/// The first failure ends the fetch; no partial result is returned.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Glob syntax error in the key pattern
    #[error("invalid key pattern '{pattern}'")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    /// Listing a page failed
    #[error("cannot list bucket '{bucket}'")]
    Listing {
        bucket: String,
        #[source]
        source: RemoteError,
    },

    /// Fetching one matched object failed
    #[error("cannot fetch '{key}' from bucket '{bucket}'")]
    Get {
        bucket: String,
        key: String,
        #[source]
        source: RemoteError,
    },

    /// Cancellation token fired
    #[error("fetch cancelled")]
    Cancelled,

    /// A worker task panicked
    #[error("fetch worker failed")]
    WorkerFailed(#[source] tokio::task::JoinError),

    /// All workers stopped while work was still queued
    #[error("worker pool closed")]
    PoolClosed,
}

/// Errors from [`crate::Importer`]
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    /// Reference text cannot be parsed
    #[error("cannot import, invalid reference '{reference}': {message}")]
    InvalidReference { reference: String, message: String },

    /// Scheme is neither local nor a known remote
    #[error("cannot import, unknown URL scheme '{scheme}' in '{reference}'")]
    UnknownScheme { scheme: String, reference: String },

    /// Operation not available for this reference
    #[error("{operation} is not supported for '{reference}'")]
    UnsupportedOperation {
        operation: &'static str,
        reference: String,
    },

    /// Unknown import option token
    #[error("invalid import option '{0}', expected one of: raw, nofail, pattern, metadata")]
    InvalidOption(String),

    /// Glob syntax error
    #[error("invalid glob pattern '{pattern}'")]
    Pattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    /// Local file cannot be opened or read
    #[error("cannot open import file '{}'", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Remote object cannot be fetched
    #[error("cannot import remote object '{url}'")]
    Fetch {
        url: String,
        #[source]
        source: RemoteError,
    },

    /// Pattern fetch failed as a whole
    #[error("cannot import objects matching '{url}'")]
    FetchPattern {
        url: String,
        #[source]
        source: FetchError,
    },

    /// No extension to pick a decoder from
    #[error("missing file extension, cannot parse '{url}'")]
    MissingExtension { url: String },

    /// Extension does not name a decoder
    #[error("unknown file extension '{extension}', cannot parse '{url}'")]
    UnknownExtension { extension: String, url: String },

    /// Decoder rejected the content
    #[error("cannot parse imported file '{url}'")]
    Decode {
        url: String,
        #[source]
        source: CodecError,
    },

    /// Async runtime for remote access cannot be started, or the caller is already on one
    #[error("cannot start runtime for remote access")]
    Runtime(#[source] std::io::Error),
}

impl ImportError {
    /// Check if the error is a configuration mistake
    ///
    /// Fatal errors are never captured by `nofail`.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::InvalidReference { .. }
                | Self::UnknownScheme { .. }
                | Self::UnsupportedOperation { .. }
                | Self::InvalidOption(_)
                | Self::Pattern { .. }
                | Self::Runtime(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recode_core::display_chain;

    #[test]
    fn fatal_classification() {
        assert!(ImportError::InvalidOption("x".into()).is_fatal());
        assert!(ImportError::UnknownScheme {
            scheme: "ftp".into(),
            reference: "ftp://x".into()
        }
        .is_fatal());
        assert!(!ImportError::MissingExtension { url: "a".into() }.is_fatal());
    }

    #[test]
    fn fetch_chain_display() {
        let err = ImportError::Fetch {
            url: "s3://b/k.json".into(),
            source: RemoteError::NotFound {
                bucket: "b".into(),
                key: "k.json".into(),
            },
        };
        assert_eq!(
            display_chain(&err),
            "cannot import remote object 's3://b/k.json': object 'k.json' not found in bucket 'b'"
        );
    }
}
