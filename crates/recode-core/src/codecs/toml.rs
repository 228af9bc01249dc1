//! TOML codec

use crate::codec::{expect_no_args, read_all, Codec, Decode, Decoded, Encode};
use crate::error::CodecError;
use serde_json::{Map, Number, Value};
use std::io::{Read, Write};

const FORMAT: &str = "TOML";

/// TOML decoder and encoder
///
/// Datetimes decode to their RFC 3339 text. Encoding needs a map at the root
/// and has no representation for `null`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TomlCodec;

impl Codec for TomlCodec {
    fn names(&self) -> &[&'static str] {
        &["toml", "t"]
    }

    fn description(&self) -> &str {
        "TOML documents"
    }

    fn decoder(&self) -> Option<&dyn Decode> {
        Some(self)
    }

    fn encoder(&self) -> Option<&dyn Encode> {
        Some(self)
    }
}

impl Decode for TomlCodec {
    fn decode(&self, input: &mut dyn Read, args: &[String]) -> Result<Decoded, CodecError> {
        expect_no_args(FORMAT, args)?;
        let bytes = read_all(input)?;
        let text = std::str::from_utf8(&bytes).map_err(|e| CodecError::decode(FORMAT, e))?;
        let table: toml::Table = toml::from_str(text).map_err(|e| CodecError::decode(FORMAT, e))?;
        Ok(Decoded::new(Value::Object(convert_table(table)?)))
    }
}

impl Encode for TomlCodec {
    fn encode(
        &self,
        output: &mut dyn Write,
        value: &Value,
        _metadata: Option<&Value>,
        args: &[String],
    ) -> Result<(), CodecError> {
        expect_no_args(FORMAT, args)?;
        if !value.is_object() {
            return Err(CodecError::unsupported(FORMAT, "document root must be a map"));
        }
        if contains_null(value) {
            return Err(CodecError::unsupported(FORMAT, "null has no representation"));
        }
        let text = toml::to_string(value).map_err(|e| CodecError::encode(FORMAT, e))?;
        output.write_all(text.as_bytes())?;
        Ok(())
    }
}

fn contains_null(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Array(items) => items.iter().any(contains_null),
        Value::Object(map) => map.values().any(contains_null),
        _ => false,
    }
}

fn convert_table(table: toml::Table) -> Result<Map<String, Value>, CodecError> {
    table
        .into_iter()
        .map(|(key, value)| Ok((key, convert(value)?)))
        .collect()
}

fn convert(value: toml::Value) -> Result<Value, CodecError> {
    Ok(match value {
        toml::Value::String(s) => Value::String(s),
        toml::Value::Integer(i) => Value::Number(Number::from(i)),
        toml::Value::Float(f) => Value::Number(Number::from_f64(f).ok_or_else(|| {
            CodecError::unsupported(FORMAT, format!("float {f} is not representable"))
        })?),
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        toml::Value::Array(items) => {
            Value::Array(items.into_iter().map(convert).collect::<Result<_, _>>()?)
        }
        toml::Value::Table(table) => Value::Object(convert_table(table)?),
    })
}
