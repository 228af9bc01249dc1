//! Glob matching for object keys
//!
//! Same rules as the local filesystem glob: `*` and `?` stay within one path
//! segment, `[...]` character classes are supported.

use glob::{MatchOptions, Pattern, PatternError};

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

const METACHARACTERS: &[char] = &['*', '?', '[', '\\'];

/// Compiled key pattern with its listing prefix
#[derive(Debug, Clone)]
pub struct KeyPattern {
    pattern: Pattern,
    prefix: String,
}

impl KeyPattern {
    /// Compile a pattern
    ///
    /// # Errors
    /// - `PatternError` for invalid glob syntax
    pub fn new(pattern: &str) -> Result<Self, PatternError> {
        let compiled = Pattern::new(pattern)?;
        let prefix = pattern
            .find(METACHARACTERS)
            .map_or(pattern, |idx| &pattern[..idx])
            .to_string();
        Ok(Self {
            pattern: compiled,
            prefix,
        })
    }

    /// Fixed text before the first wildcard, used to narrow listings
    #[inline]
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Full pattern text
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.pattern.as_str()
    }

    /// Check a key against the whole pattern
    #[inline]
    #[must_use]
    pub fn matches(&self, key: &str) -> bool {
        self.pattern.matches_with(key, MATCH_OPTIONS)
    }
}
