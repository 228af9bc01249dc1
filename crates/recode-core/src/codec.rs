//! Codec capability traits
//!
//! A codec is a named unit that can decode bytes into a [`Value`], encode a
//! [`Value`] into bytes, or both. Capabilities are exposed through
//! [`Codec::decoder`] and [`Codec::encoder`] so the registry can sort codecs
//! into decode and encode views at a single dispatch point.

use crate::error::{ArgumentError, CodecError};
use crate::registry::Registry;
use serde_json::Value;
use std::io::{Read, Write};
use std::sync::Arc;

/// Result of decoding one input
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Decoded {
    /// Decoded value tree (string keys only)
    pub value: Value,
    /// Decoder-specific side channel, passed unchanged to the encoder
    pub metadata: Option<Value>,
}

impl Decoded {
    /// Value without side metadata
    #[inline]
    #[must_use]
    pub fn new(value: Value) -> Self {
        Self {
            value,
            metadata: None,
        }
    }

    /// Value with side metadata
    #[inline]
    #[must_use]
    pub fn with_metadata(value: Value, metadata: Value) -> Self {
        Self {
            value,
            metadata: Some(metadata),
        }
    }
}

/// Common codec interface
///
/// Implement [`Decode`] and/or [`Encode`] and return `Some(self)` from the
/// matching accessor to advertise the capability.
pub trait Codec: Send + Sync + 'static {
    /// Names (aliases) this codec is registered under
    fn names(&self) -> &[&'static str];

    /// One-line description for listings
    fn description(&self) -> &str {
        ""
    }

    /// One-time setup, run after every codec of the registry is registered
    ///
    /// Codecs that need to call back into the registry keep a weak handle.
    fn initialize(&self, _registry: &Arc<Registry>) -> Result<(), CodecError> {
        Ok(())
    }

    /// Decode capability
    fn decoder(&self) -> Option<&dyn Decode> {
        None
    }

    /// Encode capability
    fn encoder(&self) -> Option<&dyn Encode> {
        None
    }
}

/// Bytes → value
pub trait Decode {
    /// Decode the whole input stream
    fn decode(&self, input: &mut dyn Read, args: &[String]) -> Result<Decoded, CodecError>;
}

/// Value → bytes
pub trait Encode {
    /// Encode `value` into the output stream
    fn encode(
        &self,
        output: &mut dyn Write,
        value: &Value,
        metadata: Option<&Value>,
        args: &[String],
    ) -> Result<(), CodecError>;
}

/// Reject any positional argument
pub fn expect_no_args(component: &str, args: &[String]) -> Result<(), ArgumentError> {
    match args.first() {
        Some(arg) => Err(ArgumentError::unexpected(component, arg)),
        None => Ok(()),
    }
}

/// Read a whole stream into memory
pub(crate) fn read_all(input: &mut dyn Read) -> Result<Vec<u8>, CodecError> {
    let mut buf = Vec::new();
    input.read_to_end(&mut buf)?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expect_no_args_accepts_empty() {
        assert!(expect_no_args("YAML", &[]).is_ok());
    }

    #[test]
    fn expect_no_args_names_first_argument() {
        let err = expect_no_args("YAML", &["a".to_string(), "b".to_string()]).unwrap_err();
        assert_eq!(err.component, "YAML");
        assert!(err.message.contains("'a'"));
    }

    #[test]
    fn decoded_constructors() {
        let plain = Decoded::new(Value::Bool(true));
        assert!(plain.metadata.is_none());

        let with = Decoded::with_metadata(Value::Null, Value::from("meta"));
        assert_eq!(with.metadata, Some(Value::from("meta")));
    }
}
