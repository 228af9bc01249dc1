//! Template rendering errors

use std::path::PathBuf;

/// Errors from rendering one template file
#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    /// Template file cannot be read
    #[error("cannot read template '{}'", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Template syntax error
    #[error("cannot parse template '{}'", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: minijinja::Error,
    },

    /// Evaluation failed, including failures of template functions
    #[error("cannot render template '{}'", path.display())]
    Render {
        path: PathBuf,
        #[source]
        source: minijinja::Error,
    },

    /// Includes nested deeper than the limit, most likely a cycle
    #[error("include depth limit {limit} exceeded at '{}'", path.display())]
    IncludeDepth { path: PathBuf, limit: usize },
}
