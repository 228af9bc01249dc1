//! Null decoder

use crate::codec::{expect_no_args, Codec, Decode, Decoded};
use crate::error::CodecError;
use serde_json::Value;
use std::io::Read;

/// Decoder that ignores its input and yields `null`
///
/// Useful with encoders that produce output on their own, like templates.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullCodec;

impl Codec for NullCodec {
    fn names(&self) -> &[&'static str] {
        &["null", "n"]
    }

    fn description(&self) -> &str {
        "ignores input, yields null"
    }

    fn decoder(&self) -> Option<&dyn Decode> {
        Some(self)
    }
}

impl Decode for NullCodec {
    fn decode(&self, _input: &mut dyn Read, args: &[String]) -> Result<Decoded, CodecError> {
        expect_no_args("null", args)?;
        Ok(Decoded::new(Value::Null))
    }
}
