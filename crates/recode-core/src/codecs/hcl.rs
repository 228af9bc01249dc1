//! HCL codec
//!
//! Top-level attributes form the decoded value. Blocks have no place in the
//! value model, so they travel as side metadata: a list of [`HclBlock`] with
//! the same attribute/block split at every depth.

use crate::codec::{expect_no_args, read_all, Codec, Decode, Decoded, Encode};
use crate::error::CodecError;
use hcl::eval::{Context, Evaluate};
use hcl::{Attribute, Block, Body, Expression, Identifier};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::io::{Read, Write};

const FORMAT: &str = "HCL";

/// One HCL block as carried in side metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HclBlock {
    /// Block type identifier, e.g. `resource`
    #[serde(rename = "type")]
    pub kind: String,
    /// Block labels
    #[serde(default)]
    pub labels: Vec<String>,
    /// Evaluated attributes of the block body
    #[serde(default)]
    pub attributes: Map<String, Value>,
    /// Nested blocks
    #[serde(default)]
    pub blocks: Vec<HclBlock>,
}

/// HCL decoder and encoder
#[derive(Debug, Clone, Copy, Default)]
pub struct HclCodec;

impl Codec for HclCodec {
    fn names(&self) -> &[&'static str] {
        &["hcl", "h"]
    }

    fn description(&self) -> &str {
        "HCL attributes, blocks kept as metadata"
    }

    fn decoder(&self) -> Option<&dyn Decode> {
        Some(self)
    }

    fn encoder(&self) -> Option<&dyn Encode> {
        Some(self)
    }
}

impl Decode for HclCodec {
    fn decode(&self, input: &mut dyn Read, args: &[String]) -> Result<Decoded, CodecError> {
        expect_no_args(FORMAT, args)?;
        let bytes = read_all(input)?;
        let text = std::str::from_utf8(&bytes).map_err(|e| CodecError::decode(FORMAT, e))?;
        let body = hcl::parse(text).map_err(|e| CodecError::decode(FORMAT, e))?;

        let ctx = Context::new();
        let (attributes, blocks) = split_body(&body, &ctx);
        let metadata = serde_json::to_value(blocks).map_err(|e| CodecError::decode(FORMAT, e))?;
        Ok(Decoded::with_metadata(Value::Object(attributes), metadata))
    }
}

impl Encode for HclCodec {
    fn encode(
        &self,
        output: &mut dyn Write,
        value: &Value,
        metadata: Option<&Value>,
        args: &[String],
    ) -> Result<(), CodecError> {
        expect_no_args(FORMAT, args)?;
        let Value::Object(map) = value else {
            return Err(CodecError::unsupported(FORMAT, "document root must be a map"));
        };

        let mut builder = Body::builder();
        for (key, value) in map {
            builder = builder.add_attribute(attribute(key, value)?);
        }
        // metadata from other decoders is silently ignored
        let blocks = metadata
            .and_then(|meta| serde_json::from_value::<Vec<HclBlock>>(meta.clone()).ok())
            .unwrap_or_default();
        for block in &blocks {
            builder = builder.add_block(build_block(block)?);
        }

        let text = hcl::to_string(&builder.build()).map_err(|e| CodecError::encode(FORMAT, e))?;
        output.write_all(text.as_bytes())?;
        Ok(())
    }
}

fn split_body(body: &Body, ctx: &Context<'_>) -> (Map<String, Value>, Vec<HclBlock>) {
    let attributes = body
        .attributes()
        .map(|attr| (attr.key.as_str().to_string(), evaluate(&attr.expr, ctx)))
        .collect();
    let blocks = body
        .blocks()
        .map(|block| {
            let (attributes, blocks) = split_body(&block.body, ctx);
            HclBlock {
                kind: block.identifier.as_str().to_string(),
                labels: block.labels.iter().map(|l| l.as_str().to_string()).collect(),
                attributes,
                blocks,
            }
        })
        .collect();
    (attributes, blocks)
}

/// Evaluate without variables or functions; what cannot be evaluated is null
fn evaluate(expr: &Expression, ctx: &Context<'_>) -> Value {
    match expr {
        Expression::Array(items) => Value::Array(items.iter().map(|e| evaluate(e, ctx)).collect()),
        Expression::Object(object) => {
            let mut map = Map::with_capacity(object.len());
            for (key, expr) in object {
                let Ok(key) = key.evaluate(ctx) else {
                    tracing::debug!("skipping HCL object key that cannot be evaluated");
                    continue;
                };
                map.insert(key, evaluate(expr, ctx));
            }
            Value::Object(map)
        }
        other => other
            .evaluate(ctx)
            .map_or(Value::Null, |value| to_json(&value)),
    }
}

fn to_json(value: &hcl::Value) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

fn attribute(key: &str, value: &Value) -> Result<Attribute, CodecError> {
    let ident = Identifier::new(key)
        .map_err(|_| CodecError::unsupported(FORMAT, format!("'{key}' is not a valid identifier")))?;
    let expr = hcl::to_expression(value).map_err(|e| CodecError::encode(FORMAT, e))?;
    Ok(Attribute::new(ident, expr))
}

fn build_block(block: &HclBlock) -> Result<Block, CodecError> {
    let ident = Identifier::new(block.kind.as_str()).map_err(|_| {
        CodecError::unsupported(FORMAT, format!("'{}' is not a valid block type", block.kind))
    })?;

    let mut builder = Block::builder(ident);
    for label in &block.labels {
        builder = builder.add_label(label.as_str());
    }
    for (key, value) in &block.attributes {
        builder = builder.add_attribute(attribute(key, value)?);
    }
    for nested in &block.blocks {
        builder = builder.add_block(build_block(nested)?);
    }
    Ok(builder.build())
}
