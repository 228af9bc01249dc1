//! Recoding pipeline
//!
//! A run is `decode → filters → encode`, every step dispatched by name through
//! a frozen [`Registry`]. The decoder's side metadata is handed to the encoder
//! untouched.

use crate::codec::Decoded;
use crate::error::{Direction, RecodeError, Stage};
use crate::filter::FilterStep;
use crate::registry::Registry;
use serde_json::Value;
use std::io::{Read, Write};
use std::sync::Arc;

/// Names and arguments for one recoding run
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RecodeConfig {
    /// Decoder name
    pub decoder: String,
    /// Decoder positional arguments
    pub decoder_args: Vec<String>,
    /// Encoder name
    pub encoder: String,
    /// Encoder positional arguments
    pub encoder_args: Vec<String>,
    /// Filters applied in order
    pub filters: Vec<FilterStep>,
}

impl RecodeConfig {
    /// Config with decoder and encoder names, no arguments
    #[inline]
    #[must_use]
    pub fn new(decoder: impl Into<String>, encoder: impl Into<String>) -> Self {
        Self {
            decoder: decoder.into(),
            encoder: encoder.into(),
            ..Self::default()
        }
    }

    /// Set decoder arguments
    #[inline]
    #[must_use]
    pub fn with_decoder_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.decoder_args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Set encoder arguments
    #[inline]
    #[must_use]
    pub fn with_encoder_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.encoder_args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Append a filter step
    #[inline]
    #[must_use]
    pub fn with_filter(mut self, step: FilterStep) -> Self {
        self.filters.push(step);
        self
    }
}

/// Dispatches decode, filter and encode by name
#[derive(Debug, Clone)]
pub struct Recoder {
    registry: Arc<Registry>,
}

impl Recoder {
    /// Create recoder over an initialized registry
    #[inline]
    #[must_use]
    pub fn new(registry: Arc<Registry>) -> Self {
        Self { registry }
    }

    /// Shared registry
    #[inline]
    #[must_use]
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Decode the input with the configured decoder
    ///
    /// # Errors
    /// - `RecodeError::UnknownCodec` if no decoder has that name
    /// - `RecodeError::Decode` wrapping the codec failure
    pub fn decode(&self, config: &RecodeConfig, input: &mut dyn Read) -> Result<Decoded, RecodeError> {
        let decoder = self
            .registry
            .decoder(&config.decoder)
            .ok_or_else(|| RecodeError::UnknownCodec {
                name: config.decoder.clone(),
                direction: Direction::Decode,
            })?;

        tracing::debug!(decoder = %config.decoder, args = ?config.decoder_args, "decoding");
        decoder
            .decode(input, &config.decoder_args)
            .map_err(|source| RecodeError::Decode {
                codec: config.decoder.clone(),
                source,
            })
    }

    /// Apply the configured filter chain
    ///
    /// Metadata passes through unchanged.
    pub fn filter(&self, config: &RecodeConfig, decoded: Decoded) -> Result<Decoded, RecodeError> {
        let Decoded { mut value, metadata } = decoded;
        for step in &config.filters {
            let filter = self
                .registry
                .filter(&step.name)
                .ok_or_else(|| RecodeError::UnknownFilter(step.name.clone()))?;

            tracing::debug!(filter = %step.name, args = ?step.args, "applying filter");
            value = filter
                .apply(&self.registry, value, &step.args)
                .map_err(|source| RecodeError::Filter {
                    name: step.name.clone(),
                    source,
                })?;
        }
        Ok(Decoded { value, metadata })
    }

    /// Encode a value with the configured encoder
    ///
    /// # Errors
    /// - `RecodeError::UnknownCodec` if no encoder has that name
    /// - `RecodeError::Encode` wrapping the codec failure
    pub fn encode(
        &self,
        config: &RecodeConfig,
        output: &mut dyn Write,
        value: &Value,
        metadata: Option<&Value>,
    ) -> Result<(), RecodeError> {
        let encoder = self
            .registry
            .encoder(&config.encoder)
            .ok_or_else(|| RecodeError::UnknownCodec {
                name: config.encoder.clone(),
                direction: Direction::Encode,
            })?;

        tracing::debug!(encoder = %config.encoder, args = ?config.encoder_args, "encoding");
        encoder
            .encode(output, value, metadata, &config.encoder_args)
            .map_err(|source| RecodeError::Encode {
                codec: config.encoder.clone(),
                source,
            })
    }

    /// Full run: decode → filters → encode
    ///
    /// Failures are annotated with the stage they happened in. A failed stage
    /// stops the run.
    pub fn run(
        &self,
        config: &RecodeConfig,
        input: &mut dyn Read,
        output: &mut dyn Write,
    ) -> Result<(), RecodeError> {
        let decoded = self
            .decode(config, input)
            .map_err(|e| e.at_stage(Stage::Input))?;
        let decoded = self
            .filter(config, decoded)
            .map_err(|e| e.at_stage(Stage::Filter))?;
        self.encode(config, output, &decoded.value, decoded.metadata.as_ref())
            .map_err(|e| e.at_stage(Stage::Output))?;
        output.flush().map_err(|e| {
            RecodeError::Encode {
                codec: config.encoder.clone(),
                source: e.into(),
            }
            .at_stage(Stage::Output)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{Codec, Decode};
    use crate::error::{CodecError, FilterError};
    use crate::filter::Filter;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Spy(Arc<AtomicUsize>);

    impl Codec for Spy {
        fn names(&self) -> &[&'static str] {
            &["spy"]
        }

        fn decoder(&self) -> Option<&dyn Decode> {
            Some(self)
        }
    }

    impl Decode for Spy {
        fn decode(&self, _input: &mut dyn Read, _args: &[String]) -> Result<Decoded, CodecError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(Decoded::with_metadata(json!({"a": 1}), json!("side")))
        }
    }

    struct Double;

    impl Filter for Double {
        fn names(&self) -> &[&'static str] {
            &["double"]
        }

        fn apply(&self, _registry: &Registry, input: Value, _args: &[String]) -> Result<Value, FilterError> {
            match input {
                Value::Object(map) => Ok(Value::Array(vec![Value::Object(map.clone()), Value::Object(map)])),
                other => Err(FilterError::InvalidInput(format!("expected map, got {other}"))),
            }
        }
    }

    fn recoder_with_spy() -> (Recoder, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut registry = Registry::with_builtin_codecs().unwrap();
        registry.register(Spy(Arc::clone(&calls))).unwrap();
        registry.register_filter(Double).unwrap();
        (Recoder::new(registry.initialize().unwrap()), calls)
    }

    #[test]
    fn run_json_to_json() {
        let (recoder, _) = recoder_with_spy();
        let config = RecodeConfig::new("json", "json");
        let mut out = Vec::<u8>::new();

        recoder
            .run(&config, &mut br#"{"b": [1, 2]}"#.as_slice(), &mut out)
            .unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "{\"b\":[1,2]}\n");
    }

    #[test]
    fn unknown_decoder_fails_input_stage() {
        let (recoder, calls) = recoder_with_spy();
        let config = RecodeConfig::new("xml", "json");
        let mut out = Vec::<u8>::new();

        let err = recoder.run(&config, &mut b"".as_slice(), &mut out).unwrap_err();
        assert_eq!(err.stage(), Some(Stage::Input));
        assert!(matches!(
            err.root(),
            RecodeError::UnknownCodec { direction: Direction::Decode, .. }
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(out.is_empty());
    }

    #[test]
    fn decode_only_codec_is_not_an_encoder() {
        let (recoder, _) = recoder_with_spy();
        let config = RecodeConfig::new("json", "spy");
        let mut out = Vec::<u8>::new();

        let err = recoder.run(&config, &mut b"1".as_slice(), &mut out).unwrap_err();
        assert_eq!(err.stage(), Some(Stage::Output));
        assert_eq!(err.root().to_string(), "unknown encoder 'spy'");
    }

    #[test]
    fn filters_apply_in_order_and_keep_metadata() {
        let (recoder, calls) = recoder_with_spy();
        let config = RecodeConfig::new("spy", "json").with_filter(FilterStep::new("double"));

        let decoded = recoder.decode(&config, &mut b"".as_slice()).unwrap();
        let filtered = recoder.filter(&config, decoded).unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(filtered.value, json!([{"a": 1}, {"a": 1}]));
        assert_eq!(filtered.metadata, Some(json!("side")));
    }

    #[test]
    fn failing_filter_reports_filter_stage() {
        let (recoder, _) = recoder_with_spy();
        let config = RecodeConfig::new("json", "json")
            .with_filter(FilterStep::new("double"))
            .with_filter(FilterStep::new("double"));
        let mut out = Vec::<u8>::new();

        let err = recoder.run(&config, &mut b"{}".as_slice(), &mut out).unwrap_err();
        assert_eq!(err.stage(), Some(Stage::Filter));
        assert!(matches!(err.root(), RecodeError::Filter { name, .. } if name == "double"));
    }

    #[test]
    fn unknown_filter() {
        let (recoder, _) = recoder_with_spy();
        let config = RecodeConfig::new("json", "json").with_filter(FilterStep::new("nope"));

        let err = recoder
            .filter(&config, Decoded::new(Value::Null))
            .unwrap_err();
        assert_eq!(err.to_string(), "unknown filter 'nope'");
    }

    #[test]
    fn encoder_argument_error_is_found() {
        let (recoder, _) = recoder_with_spy();
        let config = RecodeConfig::new("json", "json").with_encoder_args(["compact"]);
        let mut out = Vec::<u8>::new();

        let err = recoder.run(&config, &mut b"{}".as_slice(), &mut out).unwrap_err();
        assert!(err.is_argument_error());
    }
}
