//! `varfiles` filter
//!
//! Input is a map `name → file glob`; output maps every name to the decoded
//! content of its matching files. List contents are flattened into the
//! result list. A pattern that matched exactly one file equal to itself is
//! treated as a plain filename and stores that single value unwrapped.

use crate::importer::{decode_by_extension, glob_text};
use recode_core::{expect_no_args, Filter, FilterError, Map, Registry, Value};
use std::path::{Path, PathBuf};

/// Loads variable files named by glob patterns
#[derive(Debug, Clone, Default)]
pub struct VarFilesFilter {
    base_dir: Option<PathBuf>,
}

impl VarFilesFilter {
    /// Patterns resolve against the process working directory
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve relative patterns against `dir`
    #[inline]
    #[must_use]
    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(dir.into());
        self
    }

    fn load(&self, registry: &Registry, pattern: &str) -> Result<Value, FilterError> {
        let text = glob_text(self.base_dir.as_deref(), Path::new(pattern));
        let pattern = match &self.base_dir {
            Some(base) if Path::new(pattern).is_relative() => base.join(pattern),
            _ => PathBuf::from(pattern),
        };

        let files = glob::glob(&text)
            .map_err(|e| FilterError::failed(format!("invalid pattern '{text}'"), e))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| FilterError::failed(format!("cannot expand pattern '{text}'"), e))?;

        // a literal filename with glob metacharacters is indistinguishable from a pattern here
        let single_file = files.len() == 1 && files[0] == pattern;

        let mut entries = Vec::new();
        for file in &files {
            let url = file.display().to_string();
            let bytes = std::fs::read(file)
                .map_err(|e| FilterError::failed(format!("cannot read '{url}'"), e))?;
            let decoded = decode_by_extension(registry, &url, &url, &bytes)
                .map_err(|e| FilterError::failed(format!("cannot load '{url}'"), e))?;

            match decoded.value {
                Value::Array(items) if !single_file => entries.extend(items),
                other => entries.push(other),
            }
        }

        if single_file && !entries.is_empty() {
            Ok(entries.swap_remove(0))
        } else {
            Ok(Value::Array(entries))
        }
    }
}

impl Filter for VarFilesFilter {
    fn names(&self) -> &[&'static str] {
        &["varfiles", "v"]
    }

    fn description(&self) -> &str {
        "map of file patterns → map of decoded file contents"
    }

    fn apply(&self, registry: &Registry, input: Value, args: &[String]) -> Result<Value, FilterError> {
        expect_no_args("varfiles", args)?;
        let Value::Object(patterns) = input else {
            return Err(FilterError::InvalidInput(
                "varfiles expects a map of file patterns".to_string(),
            ));
        };

        let mut out = Map::with_capacity(patterns.len());
        for (name, pattern) in patterns {
            let Value::String(pattern) = pattern else {
                return Err(FilterError::InvalidInput(format!(
                    "pattern for '{name}' must be a string"
                )));
            };
            tracing::debug!(%name, %pattern, "loading var files");
            let value = self.load(registry, &pattern)?;
            out.insert(name, value);
        }
        Ok(Value::Object(out))
    }
}
