//! Rendering through the `tpl` encoder

use pretty_assertions::assert_eq;
use recode_core::{display_chain, RecodeConfig, RecodeError, Recoder, Registry, Value};
use recode_import::VarFilesFilter;
use recode_template::TemplateCodec;
use recode_test_utils::fixture_dir;
use serde_json::json;
use std::path::Path;
use std::sync::Arc;

fn registry() -> Arc<Registry> {
    let mut registry = Registry::with_builtin_codecs().unwrap();
    registry.register_filter(VarFilesFilter::new()).unwrap();
    registry.register(TemplateCodec::new()).unwrap();
    registry.initialize().unwrap()
}

fn run(decoder: &str, template: &Path, input: &str) -> Result<String, RecodeError> {
    let config = RecodeConfig::new(decoder, "tpl")
        .with_encoder_args([template.to_string_lossy().into_owned()]);
    let mut out = Vec::<u8>::new();
    Recoder::new(registry()).run(&config, &mut input.as_bytes(), &mut out)?;
    Ok(String::from_utf8(out).unwrap())
}

fn render(template: &Path, input: &Value) -> Result<String, RecodeError> {
    run("json", template, &input.to_string())
}

#[test]
fn input_is_bound() {
    let dir = fixture_dir(&[("t.tpl", "name: {{ input.name }}\n")]);
    let out = render(&dir.path().join("t.tpl"), &json!({"name": "app"})).unwrap();
    assert_eq!(out, "name: app\n");
}

#[test]
fn codec_functions() {
    let dir = fixture_dir(&[(
        "t.tpl",
        r#"{{ decode_yaml("a: [1, 2]").a[1] }}|{{ encode_json(input) }}"#,
    )]);
    let out = render(&dir.path().join("t.tpl"), &json!({"k": "v"})).unwrap();
    assert_eq!(out, "2|{\"k\":\"v\"}\n");
}

#[test]
fn codec_function_failure_is_reported() {
    let dir = fixture_dir(&[("t.tpl", r#"{{ decode_json("{") }}"#)]);
    let err = render(&dir.path().join("t.tpl"), &json!(null)).unwrap_err();
    let chain = display_chain(&err);
    assert!(chain.contains("error while decoding json"), "{chain}");
    assert!(chain.contains("cannot render template"), "{chain}");
}

#[test]
fn import_resolves_next_to_template() {
    let dir = fixture_dir(&[
        (
            "tpl/main.tpl",
            concat!(
                r#"{{ import("vars.yaml").greeting }} "#,
                r#"{% for item in import("data/*.json", "pattern") %}{{ item.n }};{% endfor %}"#,
                r#"{% set r = import("missing.json", "nofail") %}{% if r.error %} missing{% endif %}"#,
            ),
        ),
        ("tpl/vars.yaml", "greeting: hello\n"),
        ("tpl/data/1.json", "{\"n\": 1}"),
        ("tpl/data/2.json", "{\"n\": 2}"),
    ]);

    let out = render(&dir.path().join("tpl/main.tpl"), &json!({})).unwrap();
    assert_eq!(out, "hello 1;2; missing");
}

#[test]
fn import_rejects_unknown_option() {
    let dir = fixture_dir(&[("t.tpl", r#"{{ import("x.json", "fast") }}"#)]);
    let err = render(&dir.path().join("t.tpl"), &json!({})).unwrap_err();
    assert!(display_chain(&err).contains("invalid import option 'fast'"));
}

#[test]
fn include_is_relative_to_including_template() {
    let dir = fixture_dir(&[
        (
            "main.tpl",
            r#"[{{ include("parts/item.tpl", {"name": "x"}) }}][{{ include("parts/item.tpl") }}]"#,
        ),
        ("parts/item.tpl", r#"{{ input.name }}{{ include("suffix.tpl") }}"#),
        ("parts/suffix.tpl", "!"),
    ]);

    let out = render(&dir.path().join("main.tpl"), &json!({"name": "main"})).unwrap();
    assert_eq!(out, "[x!][main!]");
}

#[test]
fn include_cycle_hits_depth_limit() {
    let dir = fixture_dir(&[("loop.tpl", r#"{{ include("loop.tpl") }}"#)]);
    let template = dir.path().join("loop.tpl");

    // nested renders need more stack than the default test thread has
    let chain = std::thread::Builder::new()
        .stack_size(32 * 1024 * 1024)
        .spawn(move || display_chain(&render(&template, &json!({})).unwrap_err()))
        .unwrap()
        .join()
        .unwrap();
    assert!(chain.contains("include depth limit 32 exceeded"), "{chain}");
}

#[test]
fn metadata_reaches_template() {
    let dir = fixture_dir(&[(
        "t.tpl",
        "{{ input.a }}{% for b in metadata() %} {{ b.type }}/{{ b.labels[0] }}={{ b.attributes.port }}{% endfor %}",
    )]);
    let out = run(
        "hcl",
        &dir.path().join("t.tpl"),
        "a = 1\nsvc \"web\" {\n  port = 80\n}\n",
    )
    .unwrap();
    assert_eq!(out, "1 svc/web=80");
}

#[test]
fn missing_template() {
    let dir = fixture_dir(&[]);
    let err = render(&dir.path().join("none.tpl"), &json!({})).unwrap_err();
    assert!(display_chain(&err).contains("cannot read template"));
}
