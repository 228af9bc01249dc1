//! JSON codec

use crate::codec::{expect_no_args, Codec, Decode, Decoded, Encode};
use crate::error::{ArgumentError, CodecError};
use serde_json::Value;
use std::io::{Read, Write};

const FORMAT: &str = "JSON";

/// JSON decoder and encoder
///
/// Encodes compact by default; `pretty` switches to two-space indentation.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn names(&self) -> &[&'static str] {
        &["json", "j"]
    }

    fn description(&self) -> &str {
        "JSON documents (encoder argument: pretty)"
    }

    fn decoder(&self) -> Option<&dyn Decode> {
        Some(self)
    }

    fn encoder(&self) -> Option<&dyn Encode> {
        Some(self)
    }
}

impl Decode for JsonCodec {
    fn decode(&self, input: &mut dyn Read, args: &[String]) -> Result<Decoded, CodecError> {
        expect_no_args(FORMAT, args)?;
        let value: Value =
            serde_json::from_reader(input).map_err(|e| CodecError::decode(FORMAT, e))?;
        Ok(Decoded::new(value))
    }
}

impl Encode for JsonCodec {
    fn encode(
        &self,
        output: &mut dyn Write,
        value: &Value,
        _metadata: Option<&Value>,
        args: &[String],
    ) -> Result<(), CodecError> {
        let pretty = match args {
            [] => false,
            [arg] if arg == "pretty" => true,
            _ => {
                // `pretty` is only valid on its own, so a repeated one is the culprit
                let arg = args
                    .iter()
                    .find(|a| a.as_str() != "pretty")
                    .or_else(|| args.last())
                    .map_or("", String::as_str);
                return Err(ArgumentError::new(
                    FORMAT,
                    format!("invalid output argument '{arg}', supported arguments: 'pretty'"),
                )
                .into())
            }
        };

        let written = if pretty {
            serde_json::to_writer_pretty(&mut *output, value)
        } else {
            serde_json::to_writer(&mut *output, value)
        };
        written.map_err(|e| CodecError::encode(FORMAT, e))?;
        output.write_all(b"\n")?;
        Ok(())
    }
}
