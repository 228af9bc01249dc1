//! Import results
//!
//! An [`Envelope`] is filled stage by stage through a crate-private builder
//! and is read-only once handed out.

use crate::error::ImportError;
use recode_core::display_chain;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Where a remote item came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteLocation {
    /// Bucket name
    pub bucket: String,
    /// Object key
    pub key: String,
    /// Requested or listed version
    pub version: Option<String>,
}

/// Wrapper around one imported item
#[derive(Debug, Clone)]
pub struct Envelope {
    url: String,
    body: Option<Value>,
    metadata: Option<Value>,
    error: Option<Arc<ImportError>>,
    location: Option<RemoteLocation>,
}

impl Envelope {
    /// Reference of the item
    #[inline]
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Decoded (or raw) content, absent on error
    #[inline]
    #[must_use]
    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    /// Decoder side metadata
    #[inline]
    #[must_use]
    pub fn metadata(&self) -> Option<&Value> {
        self.metadata.as_ref()
    }

    /// Captured failure
    #[inline]
    #[must_use]
    pub fn error(&self) -> Option<&ImportError> {
        self.error.as_deref()
    }

    /// Remote origin, for remote items
    #[inline]
    #[must_use]
    pub fn location(&self) -> Option<&RemoteLocation> {
        self.location.as_ref()
    }

    /// Check if the item was imported without error
    #[inline]
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    /// Take the body out
    #[must_use]
    pub fn into_body(self) -> Option<Value> {
        self.body
    }

    /// Map representation: `url`, `body`, `metadata`, `error`, `bucket`, `key`, `version`
    ///
    /// The error is rendered as its cause chain.
    #[must_use]
    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        map.insert("url".to_string(), Value::String(self.url.clone()));
        if let Some(body) = &self.body {
            map.insert("body".to_string(), body.clone());
        }
        if let Some(metadata) = &self.metadata {
            map.insert("metadata".to_string(), metadata.clone());
        }
        if let Some(error) = &self.error {
            map.insert("error".to_string(), Value::String(display_chain(&**error)));
        }
        if let Some(location) = &self.location {
            map.insert("bucket".to_string(), Value::String(location.bucket.clone()));
            map.insert("key".to_string(), Value::String(location.key.clone()));
            map.insert(
                "version".to_string(),
                location.version.clone().map_or(Value::Null, Value::String),
            );
        }
        Value::Object(map)
    }
}

/// Incremental envelope construction
#[derive(Debug)]
pub(crate) struct EnvelopeBuilder {
    inner: Envelope,
}

impl EnvelopeBuilder {
    pub(crate) fn new(url: impl Into<String>) -> Self {
        Self {
            inner: Envelope {
                url: url.into(),
                body: None,
                metadata: None,
                error: None,
                location: None,
            },
        }
    }

    pub(crate) fn location(mut self, location: RemoteLocation) -> Self {
        self.inner.location = Some(location);
        self
    }

    pub(crate) fn body(mut self, body: Value) -> Self {
        self.inner.body = Some(body);
        self
    }

    pub(crate) fn metadata(mut self, metadata: Option<Value>) -> Self {
        self.inner.metadata = metadata;
        self
    }

    /// Record a failure; a body set earlier is dropped
    pub(crate) fn error(mut self, error: ImportError) -> Self {
        self.inner.body = None;
        self.inner.metadata = None;
        self.inner.error = Some(Arc::new(error));
        self
    }

    pub(crate) fn url(&self) -> &str {
        &self.inner.url
    }

    pub(crate) fn build(self) -> Envelope {
        self.inner
    }
}

/// Result of one import call
#[derive(Debug, Clone)]
pub enum Imported {
    /// Bare body (no `nofail`, no `metadata`)
    Value(Value),
    /// Wrapped item
    Envelope(Envelope),
    /// Pattern result, in match order
    List(Vec<Imported>),
}

impl Imported {
    /// Convert to a plain value tree
    #[must_use]
    pub fn to_value(&self) -> Value {
        match self {
            Self::Value(value) => value.clone(),
            Self::Envelope(envelope) => envelope.to_value(),
            Self::List(items) => Value::Array(items.iter().map(Self::to_value).collect()),
        }
    }

    /// Envelope, if this is one
    #[must_use]
    pub fn as_envelope(&self) -> Option<&Envelope> {
        match self {
            Self::Envelope(envelope) => Some(envelope),
            _ => None,
        }
    }

    /// Items, if this is a pattern result
    #[must_use]
    pub fn as_list(&self) -> Option<&[Imported]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn successful_envelope_value() {
        let envelope = EnvelopeBuilder::new("a.json")
            .body(json!({"x": 1}))
            .metadata(None)
            .build();

        assert!(envelope.is_ok());
        assert_eq!(envelope.to_value(), json!({"url": "a.json", "body": {"x": 1}}));
    }

    #[test]
    fn error_drops_body() {
        let envelope = EnvelopeBuilder::new("a")
            .body(json!(1))
            .error(ImportError::MissingExtension { url: "a".into() })
            .build();

        assert!(envelope.body().is_none());
        assert_eq!(
            envelope.to_value(),
            json!({"url": "a", "error": "missing file extension, cannot parse 'a'"})
        );
    }

    #[test]
    fn remote_fields() {
        let envelope = EnvelopeBuilder::new("s3://b/k.json")
            .location(RemoteLocation {
                bucket: "b".into(),
                key: "k.json".into(),
                version: Some("3".into()),
            })
            .body(json!(null))
            .build();

        let value = envelope.to_value();
        assert_eq!(value["bucket"], "b");
        assert_eq!(value["key"], "k.json");
        assert_eq!(value["version"], "3");
    }

    #[test]
    fn list_to_value() {
        let imported = Imported::List(vec![Imported::Value(json!(1)), Imported::Value(json!("two"))]);
        assert_eq!(imported.to_value(), json!([1, "two"]));
        assert_eq!(imported.as_list().map(<[Imported]>::len), Some(2));
    }
}
