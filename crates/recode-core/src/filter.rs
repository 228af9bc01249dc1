//! Filter steps between decode and encode
//!
//! Filters are opaque named transformations over the decoded value. They are
//! registered in the same [`Registry`] as codecs and applied in configuration
//! order by the recoder.

use crate::error::FilterError;
use crate::registry::Registry;
use serde_json::Value;

/// Named value → value transformation
pub trait Filter: Send + Sync + 'static {
    /// Names (aliases) this filter is registered under
    fn names(&self) -> &[&'static str];

    /// One-line description for listings
    fn description(&self) -> &str {
        ""
    }

    /// Transform the value
    ///
    /// The registry is passed so filters can decode nested content by name.
    fn apply(&self, registry: &Registry, input: Value, args: &[String]) -> Result<Value, FilterError>;
}

/// One configured filter invocation
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilterStep {
    /// Registered filter name
    pub name: String,
    /// Positional arguments
    pub args: Vec<String>,
}

impl FilterStep {
    /// Step without arguments
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
        }
    }

    /// Add positional arguments
    #[inline]
    #[must_use]
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }
}
