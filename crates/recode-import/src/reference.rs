//! Import reference parsing
//!
//! Accepted forms:
//! - `path`, `file://path` for local files
//! - `s3://bucket/key`, `s3://bucket/key:version`, `s3://bucket/key?versionId=version`
//!
//! A `?` only opens a query when the text after it contains `=`, so glob
//! patterns like `s3://bucket/a?.json` keep their wildcard.

use crate::error::ImportError;
use std::path::PathBuf;

/// Schemes routed to an object store
pub const REMOTE_SCHEMES: &[&str] = &["s3"];

/// Parsed import reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reference {
    /// Local filesystem path, possibly relative
    Local(PathBuf),
    /// Object in a remote store
    Remote(RemoteRef),
}

/// Remote object address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteRef {
    /// Store scheme, e.g. `s3`
    pub scheme: String,
    /// Bucket or namespace
    pub bucket: String,
    /// Object key or key pattern
    pub key: String,
    /// Object version
    pub version: Option<String>,
}

impl RemoteRef {
    /// Canonical URL of an object in the same bucket
    #[must_use]
    pub fn url_for(&self, key: &str) -> String {
        format!("{}://{}/{}", self.scheme, self.bucket, key)
    }
}

impl Reference {
    /// Parse reference text
    ///
    /// # Errors
    /// - `ImportError::UnknownScheme` for schemes other than `file` and remote ones
    /// - `ImportError::InvalidReference` for a remote reference without bucket or key
    pub fn parse(text: &str) -> Result<Self, ImportError> {
        let Some((scheme, rest)) = text.split_once("://") else {
            return Ok(Self::Local(PathBuf::from(text)));
        };

        match scheme {
            "" | "file" => Ok(Self::Local(PathBuf::from(rest))),
            s if REMOTE_SCHEMES.contains(&s) => parse_remote(s, rest, text).map(Self::Remote),
            other => Err(ImportError::UnknownScheme {
                scheme: other.to_string(),
                reference: text.to_string(),
            }),
        }
    }
}

fn parse_remote(scheme: &str, rest: &str, text: &str) -> Result<RemoteRef, ImportError> {
    let invalid = |message: &str| ImportError::InvalidReference {
        reference: text.to_string(),
        message: message.to_string(),
    };

    let (path, mut version) = match rest.rsplit_once('?') {
        Some((path, query)) if query.contains('=') => {
            let version = url::form_urlencoded::parse(query.as_bytes())
                .find(|(name, _)| name == "versionId")
                .map(|(_, value)| value.into_owned())
                .filter(|v| !v.is_empty());
            (path, version)
        }
        _ => (rest, None),
    };

    let (bucket, mut key) = path
        .split_once('/')
        .ok_or_else(|| invalid("expected bucket/key"))?;
    if bucket.is_empty() {
        return Err(invalid("empty bucket"));
    }

    if version.is_none() {
        let name_start = key.rfind('/').map_or(0, |idx| idx + 1);
        if let Some(colon) = key[name_start..].rfind(':') {
            let split = name_start + colon;
            if split + 1 < key.len() {
                version = Some(key[split + 1..].to_string());
            }
            key = &key[..split];
        }
    }
    if key.is_empty() {
        return Err(invalid("empty key"));
    }

    Ok(RemoteRef {
        scheme: scheme.to_string(),
        bucket: bucket.to_string(),
        key: key.to_string(),
        version,
    })
}
