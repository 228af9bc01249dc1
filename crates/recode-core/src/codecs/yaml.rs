//! YAML codec
//!
//! YAML maps may have keys of any type, the value model only allows strings.
//! Every decoded tree goes through [`normalize_yaml`] before it leaves the
//! decoder.

use crate::codec::{expect_no_args, read_all, Codec, Decode, Decoded, Encode};
use crate::error::CodecError;
use serde::Deserialize;
use serde_json::{Map, Number, Value};
use serde_yaml::Value as YamlValue;
use std::io::{Read, Write};

const FORMAT: &str = "YAML";

/// YAML decoder and encoder
///
/// Only the first document of a multi-document stream is decoded.
#[derive(Debug, Clone, Copy, Default)]
pub struct YamlCodec;

impl Codec for YamlCodec {
    fn names(&self) -> &[&'static str] {
        &["yaml", "yml", "y"]
    }

    fn description(&self) -> &str {
        "YAML documents"
    }

    fn decoder(&self) -> Option<&dyn Decode> {
        Some(self)
    }

    fn encoder(&self) -> Option<&dyn Encode> {
        Some(self)
    }
}

impl Decode for YamlCodec {
    fn decode(&self, input: &mut dyn Read, args: &[String]) -> Result<Decoded, CodecError> {
        expect_no_args(FORMAT, args)?;
        let bytes = read_all(input)?;

        let Some(document) = serde_yaml::Deserializer::from_slice(&bytes).next() else {
            return Ok(Decoded::new(Value::Null));
        };
        let raw = YamlValue::deserialize(document).map_err(|e| CodecError::decode(FORMAT, e))?;
        Ok(Decoded::new(normalize_yaml(raw)?))
    }
}

impl Encode for YamlCodec {
    fn encode(
        &self,
        output: &mut dyn Write,
        value: &Value,
        _metadata: Option<&Value>,
        args: &[String],
    ) -> Result<(), CodecError> {
        expect_no_args(FORMAT, args)?;
        serde_yaml::to_writer(&mut *output, value).map_err(|e| CodecError::encode(FORMAT, e))
    }
}

/// Convert a YAML tree into a string-keyed value
///
/// - map keys become strings: scalars by their text, `null` as `"null"`,
///   sequences and maps as compact JSON
/// - tags are dropped, the tagged value is kept
///
/// # Errors
/// - `CodecError::Unsupported` for NaN or infinite floats
pub fn normalize_yaml(value: YamlValue) -> Result<Value, CodecError> {
    Ok(match value {
        YamlValue::Null => Value::Null,
        YamlValue::Bool(b) => Value::Bool(b),
        YamlValue::Number(n) => Value::Number(convert_number(&n)?),
        YamlValue::String(s) => Value::String(s),
        YamlValue::Sequence(items) => Value::Array(
            items
                .into_iter()
                .map(normalize_yaml)
                .collect::<Result<_, _>>()?,
        ),
        YamlValue::Mapping(mapping) => {
            let mut map = Map::with_capacity(mapping.len());
            for (key, value) in mapping {
                map.insert(key_to_string(key)?, normalize_yaml(value)?);
            }
            Value::Object(map)
        }
        YamlValue::Tagged(tagged) => normalize_yaml(tagged.value)?,
    })
}

fn convert_number(n: &serde_yaml::Number) -> Result<Number, CodecError> {
    if let Some(i) = n.as_i64() {
        return Ok(Number::from(i));
    }
    if let Some(u) = n.as_u64() {
        return Ok(Number::from(u));
    }
    n.as_f64()
        .and_then(Number::from_f64)
        .ok_or_else(|| CodecError::unsupported(FORMAT, format!("number {n} is not representable")))
}

fn key_to_string(key: YamlValue) -> Result<String, CodecError> {
    Ok(match key {
        YamlValue::String(s) => s,
        YamlValue::Null => "null".to_string(),
        YamlValue::Bool(b) => b.to_string(),
        YamlValue::Number(n) => n.to_string(),
        YamlValue::Tagged(tagged) => key_to_string(tagged.value)?,
        complex @ (YamlValue::Sequence(_) | YamlValue::Mapping(_)) => {
            normalize_yaml(complex)?.to_string()
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn decode(text: &str) -> Result<Value, CodecError> {
        YamlCodec
            .decode(&mut text.as_bytes(), &[])
            .map(|decoded| decoded.value)
    }

    #[test]
    fn decode_mapping() {
        assert_eq!(
            decode("inputs:\n  str: asd\n  n: 3\n").unwrap(),
            json!({"inputs": {"str": "asd", "n": 3}})
        );
    }

    #[test]
    fn scalar_keys_become_strings() {
        let value = decode("1: one\ntrue: yes\n~: nothing\n2.5: half\n").unwrap();
        assert_eq!(
            value,
            json!({"1": "one", "true": "yes", "null": "nothing", "2.5": "half"})
        );
    }

    #[test]
    fn nested_keys_normalized_at_every_depth() {
        let value = decode("outer:\n  - 7:\n      8: deep\n").unwrap();
        assert_eq!(value, json!({"outer": [{"7": {"8": "deep"}}]}));
    }

    #[test]
    fn complex_keys_render_as_json() {
        let value = decode("? [1, 2]\n: pair\n").unwrap();
        assert_eq!(value, json!({"[1,2]": "pair"}));
    }

    #[test]
    fn tags_are_unwrapped() {
        assert_eq!(decode("!custom {a: 1}\n").unwrap(), json!({"a": 1}));
    }

    #[test]
    fn empty_input_is_null() {
        assert_eq!(decode("").unwrap(), Value::Null);
    }

    #[test]
    fn only_first_document() {
        assert_eq!(decode("a: 1\n---\nb: 2\n").unwrap(), json!({"a": 1}));
    }

    #[test]
    fn non_finite_float_is_rejected() {
        let err = decode("x: .nan\n").unwrap_err();
        assert!(matches!(err, CodecError::Unsupported { .. }));
    }

    #[test]
    fn encode_mapping() {
        let mut out = Vec::<u8>::new();
        YamlCodec
            .encode(&mut out, &json!({"a": [1, 2]}), None, &[])
            .unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "a:\n- 1\n- 2\n");
    }
}
