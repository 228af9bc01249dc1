//! End-to-end recoding through the built-in registry

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use recode_core::{RecodeConfig, Recoder, Registry, Stage, Value};
use serde_json::json;
use std::sync::Arc;

fn recoder() -> Recoder {
    let registry: Arc<Registry> = Registry::with_builtin_codecs()
        .unwrap()
        .initialize()
        .unwrap();
    Recoder::new(registry)
}

fn recode(recoder: &Recoder, input: &[u8], decoder: &str, encoder: &str) -> Vec<u8> {
    let mut out = Vec::<u8>::new();
    recoder
        .run(&RecodeConfig::new(decoder, encoder), &mut &input[..], &mut out)
        .unwrap();
    out
}

fn arb_value() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::from),
        // halves are exact in binary, so text round trips are lossless
        (-1_000_000i32..1_000_000).prop_map(|n| Value::from(f64::from(n) + 0.5)),
        "[a-zA-Z0-9 _\\-\u{e9}\u{4e2d}]{0,12}".prop_map(Value::String),
    ];
    leaf.prop_recursive(4, 48, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
            prop::collection::btree_map("[a-z]{1,6}", inner, 0..6)
                .prop_map(|m| Value::Object(m.into_iter().collect())),
        ]
    })
}

proptest! {
    #[test]
    fn json_round_trip(value in arb_value()) {
        let recoder = recoder();
        let text = serde_json::to_vec(&value).unwrap();

        let out = recode(&recoder, &text, "json", "json");
        let back: Value = serde_json::from_slice(&out).unwrap();
        prop_assert_eq!(back, value);
    }

    #[test]
    fn json_round_trip_through_yaml(value in arb_value()) {
        let recoder = recoder();
        let text = serde_json::to_vec(&value).unwrap();

        let yaml = recode(&recoder, &text, "json", "yaml");
        let out = recode(&recoder, &yaml, "yaml", "json");
        let back: Value = serde_json::from_slice(&out).unwrap();
        prop_assert_eq!(back, value);
    }

    #[test]
    fn yaml_integer_keys_become_strings(keys in prop::collection::btree_set(0u32..10_000, 1..8)) {
        let recoder = recoder();
        let yaml: String = keys.iter().map(|k| format!("{k}:\n  {k}: v\n")).collect();

        let out = recode(&recoder, yaml.as_bytes(), "yaml", "json");
        let back: Value = serde_json::from_slice(&out).unwrap();
        let expected: serde_json::Map<String, Value> = keys
            .iter()
            .map(|k| {
                let mut inner = serde_json::Map::new();
                inner.insert(k.to_string(), json!("v"));
                (k.to_string(), Value::Object(inner))
            })
            .collect();
        prop_assert_eq!(back, Value::Object(expected));
    }
}

#[test]
fn json_to_yaml_to_json_example() {
    let recoder = recoder();

    let yaml = recode(&recoder, br#"{"inputs":{"str":"asd"}}"#, "json", "yaml");
    assert_eq!(String::from_utf8(yaml.clone()).unwrap(), "inputs:\n  str: asd\n");

    let json = recode(&recoder, &yaml, "yaml", "json");
    assert_eq!(String::from_utf8(json).unwrap(), "{\"inputs\":{\"str\":\"asd\"}}\n");
}

#[test]
fn hcl_to_json_drops_blocks() {
    let recoder = recoder();
    let out = recode(&recoder, b"a = 1\nblk { b = 2 }\n", "hcl", "json");
    assert_eq!(String::from_utf8(out).unwrap(), "{\"a\":1}\n");
}

#[test]
fn toml_to_yaml() {
    let recoder = recoder();
    let out = recode(&recoder, b"[server]\nport = 8080\n", "t", "y");
    assert_eq!(String::from_utf8(out).unwrap(), "server:\n  port: 8080\n");
}

#[test]
fn null_decoder_ignores_input() {
    let recoder = recoder();
    let out = recode(&recoder, b"not: [valid", "null", "json");
    assert_eq!(out, b"null\n");
}

#[test]
fn decode_failure_stops_the_run() {
    let recoder = recoder();
    let mut out = Vec::<u8>::new();

    let err = recoder
        .run(&RecodeConfig::new("json", "yaml"), &mut &b"{"[..], &mut out)
        .unwrap_err();
    assert_eq!(err.stage(), Some(Stage::Input));
    assert!(!err.is_argument_error());
    assert!(out.is_empty());
}
