//! Error types for the recoding pipeline
//!
//! Provides error handling for:
//! - Codec operations (bytes ↔ value)
//! - Registry population and initialization
//! - Recoder dispatch (decode → filters → encode)
//!
//! Every wrapping variant keeps the inner error as its `source`, so callers can
//! walk the chain and look for an [`ArgumentError`] specifically.

use std::error::Error as StdError;
use std::fmt;

/// Boxed error used for third-party library failures
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// A codec or filter received positional arguments it does not accept
///
/// Kept as its own type so front ends can print usage instead of a trace.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{component}: {message}")]
pub struct ArgumentError {
    /// Codec or filter that rejected the argument
    pub component: String,
    /// Human readable explanation
    pub message: String,
}

impl ArgumentError {
    /// Create argument error with a custom message
    pub fn new(component: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            message: message.into(),
        }
    }

    /// Argument given to a component that accepts none
    pub fn unexpected(component: impl Into<String>, argument: &str) -> Self {
        Self::new(
            component,
            format!("invalid argument '{argument}', no arguments expected"),
        )
    }
}

/// Errors raised by a single codec
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// Bad positional argument
    #[error(transparent)]
    Argument(#[from] ArgumentError),

    /// Input could not be parsed
    #[error("cannot decode {format}")]
    Decode {
        format: &'static str,
        #[source]
        source: BoxError,
    },

    /// Value could not be serialized
    #[error("cannot encode {format}")]
    Encode {
        format: &'static str,
        #[source]
        source: BoxError,
    },

    /// Value shape not representable in the target format
    #[error("{format}: {message}")]
    Unsupported {
        format: &'static str,
        message: String,
    },

    /// Stream read/write failure
    #[error("io error")]
    Io(#[from] std::io::Error),

    /// Codec setup failed
    #[error("cannot initialize codec: {0}")]
    Initialize(String),

    /// Codec is registered but its collaborators are gone
    #[error("codec '{0}' is not available")]
    Unavailable(&'static str),
}

impl CodecError {
    /// Wrap a library parse error
    pub fn decode(format: &'static str, source: impl Into<BoxError>) -> Self {
        Self::Decode {
            format,
            source: source.into(),
        }
    }

    /// Wrap a library serialization error
    pub fn encode(format: &'static str, source: impl Into<BoxError>) -> Self {
        Self::Encode {
            format,
            source: source.into(),
        }
    }

    /// Value shape cannot be expressed in `format`
    pub fn unsupported(format: &'static str, message: impl Into<String>) -> Self {
        Self::Unsupported {
            format,
            message: message.into(),
        }
    }
}

/// Errors raised by a filter step
#[derive(Debug, thiserror::Error)]
pub enum FilterError {
    /// Bad positional argument
    #[error(transparent)]
    Argument(#[from] ArgumentError),

    /// Input value does not have the shape the filter expects
    #[error("invalid filter input: {0}")]
    InvalidInput(String),

    /// Filter work failed
    #[error("{message}")]
    Failed {
        message: String,
        #[source]
        source: BoxError,
    },
}

impl FilterError {
    /// Wrap a failure with context
    pub fn failed(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Failed {
            message: message.into(),
            source: source.into(),
        }
    }
}

/// Errors while populating or initializing a registry
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// Name already taken by another codec or filter
    #[error("name '{0}' is already registered")]
    DuplicateName(String),

    /// Component declared no names
    #[error("component declares no names")]
    NoNames,

    /// A codec failed its one-time initialization
    #[error("cannot initialize codec '{codec}'")]
    Initialize {
        codec: String,
        #[source]
        source: CodecError,
    },
}

/// Direction a codec is requested for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Bytes → value
    Decode,
    /// Value → bytes
    Encode,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Decode => f.write_str("decoder"),
            Self::Encode => f.write_str("encoder"),
        }
    }
}

/// Pipeline stage that failed in a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Decoder stage
    Input,
    /// Filter chain
    Filter,
    /// Encoder stage
    Output,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Input => f.write_str("input converter"),
            Self::Filter => f.write_str("filter chain"),
            Self::Output => f.write_str("output converter"),
        }
    }
}

/// Errors from the recoder
#[derive(Debug, thiserror::Error)]
pub enum RecodeError {
    /// Name not registered for the requested direction
    #[error("unknown {direction} '{name}'")]
    UnknownCodec { name: String, direction: Direction },

    /// Filter name not registered
    #[error("unknown filter '{0}'")]
    UnknownFilter(String),

    /// Decoder failed
    #[error("error while processing input data")]
    Decode {
        codec: String,
        #[source]
        source: CodecError,
    },

    /// Filter failed
    #[error("filter '{name}' failed")]
    Filter {
        name: String,
        #[source]
        source: FilterError,
    },

    /// Encoder failed
    #[error("error while processing output data")]
    Encode {
        codec: String,
        #[source]
        source: CodecError,
    },

    /// Annotates a run failure with the stage it happened in
    #[error("cannot run {stage}")]
    Stage {
        stage: Stage,
        #[source]
        source: Box<RecodeError>,
    },
}

impl RecodeError {
    /// Annotate with pipeline stage
    #[must_use]
    pub fn at_stage(self, stage: Stage) -> Self {
        Self::Stage {
            stage,
            source: Box::new(self),
        }
    }

    /// Stage annotation, if any
    #[must_use]
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Self::Stage { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    /// Innermost recoder error below stage annotations
    #[must_use]
    pub fn root(&self) -> &RecodeError {
        match self {
            Self::Stage { source, .. } => source.root(),
            other => other,
        }
    }

    /// Argument error anywhere in the cause chain
    #[must_use]
    pub fn argument_error(&self) -> Option<&ArgumentError> {
        find_argument_error(self)
    }

    /// Check if the failure was caused by a bad argument
    #[inline]
    #[must_use]
    pub fn is_argument_error(&self) -> bool {
        self.argument_error().is_some()
    }
}

/// Search a cause chain for an [`ArgumentError`]
///
/// `CodecError::Argument` and `FilterError::Argument` are transparent, so the
/// wrapping enums are checked as well as the bare type.
#[must_use]
pub fn find_argument_error<'a>(err: &'a (dyn StdError + 'static)) -> Option<&'a ArgumentError> {
    let mut current = Some(err);
    while let Some(err) = current {
        if let Some(arg) = err.downcast_ref::<ArgumentError>() {
            return Some(arg);
        }
        if let Some(CodecError::Argument(arg)) = err.downcast_ref::<CodecError>() {
            return Some(arg);
        }
        if let Some(FilterError::Argument(arg)) = err.downcast_ref::<FilterError>() {
            return Some(arg);
        }
        current = err.source();
    }
    None
}

/// Render an error and all its causes as `outer: inner: root`
#[must_use]
pub fn display_chain(err: &(dyn StdError + 'static)) -> String {
    let mut out = err.to_string();
    let mut current = err.source();
    while let Some(cause) = current {
        let text = cause.to_string();
        // transparent wrappers repeat their inner message
        if !out.ends_with(&text) {
            out.push_str(": ");
            out.push_str(&text);
        }
        current = cause.source();
    }
    out
}
