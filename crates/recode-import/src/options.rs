//! Import option flags

use crate::error::ImportError;
use std::str::FromStr;

/// Independent flags controlling one import call
///
/// - `raw`: skip decoding, return the content as text
/// - `nofail`: record per-item failures in the envelope instead of failing
/// - `pattern`: treat the path as a glob, return a list
/// - `metadata`: always return envelopes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ImportOptions {
    /// Return content as text
    pub raw: bool,
    /// Capture per-item errors
    pub nofail: bool,
    /// Glob expansion
    pub pattern: bool,
    /// Envelope wrapping on success
    pub metadata: bool,
}

impl ImportOptions {
    /// Parse option tokens
    ///
    /// Each token may itself be a comma separated list. Tokens are trimmed,
    /// empty ones ignored, matching is case-sensitive.
    ///
    /// # Errors
    /// - `ImportError::InvalidOption` for an unknown token
    pub fn parse<I, S>(tokens: I) -> Result<Self, ImportError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut options = Self::default();
        for token in tokens {
            for part in token.as_ref().split(',').map(str::trim) {
                match part {
                    "" => {}
                    "raw" => options.raw = true,
                    "nofail" => options.nofail = true,
                    "pattern" => options.pattern = true,
                    "metadata" => options.metadata = true,
                    other => return Err(ImportError::InvalidOption(other.to_string())),
                }
            }
        }
        Ok(options)
    }

    /// Check if results are returned as envelopes
    #[inline]
    #[must_use]
    pub fn wraps(&self) -> bool {
        self.nofail || self.metadata
    }

    /// Set `raw`
    #[inline]
    #[must_use]
    pub fn with_raw(mut self, raw: bool) -> Self {
        self.raw = raw;
        self
    }

    /// Set `nofail`
    #[inline]
    #[must_use]
    pub fn with_nofail(mut self, nofail: bool) -> Self {
        self.nofail = nofail;
        self
    }

    /// Set `pattern`
    #[inline]
    #[must_use]
    pub fn with_pattern(mut self, pattern: bool) -> Self {
        self.pattern = pattern;
        self
    }

    /// Set `metadata`
    #[inline]
    #[must_use]
    pub fn with_metadata(mut self, metadata: bool) -> Self {
        self.metadata = metadata;
        self
    }
}

impl FromStr for ImportOptions {
    type Err = ImportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse([s])
    }
}
