//! Import through local files and the in-memory remote store

use pretty_assertions::assert_eq;
use recode_import::{FetcherConfig, ImportError, ImportOptions, Imported, Importer, Remotes};
use recode_test_utils::{fixture_dir, test_registry, MemoryStore};
use serde_json::json;
use std::sync::Arc;

fn remote_importer(store: MemoryStore) -> (Importer, Arc<MemoryStore>) {
    let store = store.shared();
    let remotes = Remotes::new()
        .with_store("s3", store.clone())
        .with_fetcher_config(FetcherConfig::default().with_workers(4));
    (Importer::new(test_registry()).with_remotes(remotes), store)
}

fn mixed_dir() -> tempfile::TempDir {
    fixture_dir(&[
        ("a.json", "{\"a\": 1}"),
        ("b.json", "{not json"),
        ("c.yaml", "c: 3\n"),
        ("d.txt", "plain"),
    ])
}

#[test]
fn nofail_pattern_returns_every_item() {
    let dir = mixed_dir();
    let imported = Importer::new(test_registry())
        .with_base_dir(dir.path())
        .import("*", ImportOptions::parse(["pattern,nofail"]).unwrap())
        .unwrap();

    let items = imported.as_list().unwrap();
    assert_eq!(items.len(), 4);

    let envelopes: Vec<_> = items.iter().map(|i| i.as_envelope().unwrap()).collect();
    let failed: Vec<_> = envelopes.iter().filter(|e| !e.is_ok()).collect();
    assert_eq!(failed.len(), 2);
    assert!(failed.iter().all(|e| e.body().is_none()));
    assert!(matches!(failed[0].error(), Some(ImportError::Decode { .. })));
    assert!(matches!(failed[1].error(), Some(ImportError::UnknownExtension { .. })));

    assert_eq!(envelopes[0].body(), Some(&json!({"a": 1})));
    assert_eq!(envelopes[2].body(), Some(&json!({"c": 3})));
}

#[test]
fn pattern_without_nofail_stops_at_first_failure() {
    let dir = mixed_dir();
    let err = Importer::new(test_registry())
        .with_base_dir(dir.path())
        .import("*", ImportOptions::default().with_pattern(true))
        .unwrap_err();

    match err {
        ImportError::Decode { url, .. } => assert!(url.ends_with("b.json")),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn plain_pattern_returns_bodies() {
    let dir = fixture_dir(&[("x/1.json", "1"), ("x/2.yaml", "2"), ("y/3.json", "3")]);
    let imported = Importer::new(test_registry())
        .with_base_dir(dir.path())
        .import("x/*", ImportOptions::default().with_pattern(true))
        .unwrap();

    assert_eq!(imported.to_value(), json!([1, 2]));
}

#[test]
fn pattern_under_base_dir_with_metacharacters() {
    let dir = fixture_dir(&[("conf[1]/a.json", "{\"a\": 1}"), ("conf1/b.json", "2")]);
    let importer = Importer::new(test_registry()).with_base_dir(dir.path().join("conf[1]"));

    let single = importer.import("a.json", ImportOptions::default()).unwrap();
    assert_eq!(single.to_value(), json!({"a": 1}));

    let matched = importer
        .import("*.json", ImportOptions::default().with_pattern(true))
        .unwrap();
    assert_eq!(matched.to_value(), json!([{"a": 1}]));
}

#[test]
fn invalid_glob_is_fatal() {
    let err = Importer::new(test_registry())
        .import("[", ImportOptions::parse(["pattern", "nofail"]).unwrap())
        .unwrap_err();
    assert!(matches!(err, ImportError::Pattern { .. }));
}

#[test]
fn missing_local_file_under_nofail() {
    let dir = fixture_dir(&[]);
    let imported = Importer::new(test_registry())
        .with_base_dir(dir.path())
        .import("gone.json", ImportOptions::default().with_nofail(true))
        .unwrap();

    let envelope = imported.as_envelope().unwrap();
    assert!(matches!(envelope.error(), Some(ImportError::Open { .. })));
    assert!(envelope.to_value()["error"].as_str().unwrap().contains("gone.json"));
}

#[test]
fn remote_single_object() {
    let (importer, store) = remote_importer(
        MemoryStore::new().with_object("bucket", "conf/app.yaml", "name: app\n"),
    );

    let imported = importer
        .import("s3://bucket/conf/app.yaml", ImportOptions::default())
        .unwrap();
    assert_eq!(imported.to_value(), json!({"name": "app"}));
    assert_eq!(store.get_calls(), 1);
}

#[test]
fn remote_version_is_requested() {
    let (importer, _) = remote_importer(
        MemoryStore::new()
            .with_versioned_object("bucket", "v.json", Some("1"), "\"old\"")
            .with_versioned_object("bucket", "v.json", Some("2"), "\"new\""),
    );

    let latest = importer
        .import("s3://bucket/v.json", ImportOptions::default())
        .unwrap();
    assert_eq!(latest.to_value(), json!("new"));

    let old = importer
        .import("s3://bucket/v.json?versionId=1", ImportOptions::default().with_metadata(true))
        .unwrap();
    let value = old.to_value();
    assert_eq!(value["body"], "old");
    assert_eq!(value["version"], "1");
    assert_eq!(value["key"], "v.json");

    let suffixed = importer
        .import("s3://bucket/v.json:1", ImportOptions::default())
        .unwrap();
    assert_eq!(suffixed.to_value(), json!("old"));
}

#[test]
fn remote_missing_object_under_nofail() {
    let (importer, _) = remote_importer(MemoryStore::new());
    let imported = importer
        .import("s3://bucket/none.json", ImportOptions::default().with_nofail(true))
        .unwrap();

    let envelope = imported.as_envelope().unwrap();
    assert!(matches!(envelope.error(), Some(ImportError::Fetch { .. })));
    assert_eq!(envelope.location().unwrap().key, "none.json");
}

#[test]
fn remote_pattern_in_key_order() {
    let (importer, store) = remote_importer(
        MemoryStore::new()
            .with_page_size(1)
            .with_object("bucket", "vars/b.json", "{\"b\": 2}")
            .with_object("bucket", "vars/a.json", "{\"a\": 1}")
            .with_object("bucket", "other/c.json", "{}"),
    );

    let imported = importer
        .import("s3://bucket/vars/*.json", ImportOptions::parse(["pattern,metadata"]).unwrap())
        .unwrap();
    let value = imported.to_value();

    assert_eq!(value[0]["url"], "s3://bucket/vars/a.json");
    assert_eq!(value[0]["body"], json!({"a": 1}));
    assert_eq!(value[1]["key"], "vars/b.json");
    assert_eq!(value.as_array().unwrap().len(), 2);
    assert!(store.listed_prefixes().iter().all(|p| p == "vars/"));
}

#[test]
fn remote_pattern_nofail_records_decode_failures_per_item() {
    let (importer, store) = remote_importer(
        MemoryStore::new()
            .with_page_size(2)
            .with_object("bucket", "in/a.json", "{\"a\": 1}")
            .with_object("bucket", "in/b.json", "{broken")
            .with_object("bucket", "in/c.txt", "plain")
            .with_object("bucket", "in/d.yaml", "d: 4\n"),
    );

    let imported = importer
        .import("s3://bucket/in/*", ImportOptions::parse(["pattern,nofail"]).unwrap())
        .unwrap();
    let envelopes: Vec<_> = imported
        .as_list()
        .unwrap()
        .iter()
        .map(|i| i.as_envelope().unwrap())
        .collect();
    assert_eq!(envelopes.len(), 4);
    assert_eq!(store.get_calls(), 4);

    let failed: Vec<_> = envelopes.iter().filter(|e| !e.is_ok()).collect();
    assert_eq!(failed.len(), 2);
    assert!(failed.iter().all(|e| e.body().is_none()));
    assert!(matches!(failed[0].error(), Some(ImportError::Decode { .. })));
    assert!(matches!(failed[1].error(), Some(ImportError::UnknownExtension { .. })));
    assert_eq!(failed[1].location().unwrap().key, "in/c.txt");

    assert_eq!(envelopes[0].body(), Some(&json!({"a": 1})));
    assert_eq!(envelopes[3].body(), Some(&json!({"d": 4})));
    assert_eq!(envelopes[3].url(), "s3://bucket/in/d.yaml");
}

#[tokio::test]
async fn remote_import_inside_runtime_is_refused() {
    let (importer, store) = remote_importer(MemoryStore::new().with_object("bucket", "a.json", "1"));

    let err = importer
        .import("s3://bucket/a.json", ImportOptions::default().with_nofail(true))
        .unwrap_err();
    assert!(matches!(err, ImportError::Runtime(_)));
    assert!(err.is_fatal());
    assert_eq!(store.get_calls(), 0);
}

#[test]
fn remote_pattern_failure_under_nofail_is_one_envelope() {
    let (importer, _) = remote_importer(
        MemoryStore::new()
            .with_object("bucket", "a.json", "1")
            .with_object("bucket", "b.json", "2")
            .fail_get("b.json"),
    );

    let imported = importer
        .import("s3://bucket/*.json", ImportOptions::parse(["pattern", "nofail"]).unwrap())
        .unwrap();
    let items = imported.as_list().unwrap();
    assert_eq!(items.len(), 1);

    let envelope = items[0].as_envelope().unwrap();
    assert!(matches!(envelope.error(), Some(ImportError::FetchPattern { .. })));
    assert!(envelope.body().is_none());
}

#[test]
fn remote_pattern_failure_propagates_without_nofail() {
    let (importer, _) = remote_importer(
        MemoryStore::new()
            .with_object("bucket", "a.json", "1")
            .fail_listing_at(1),
    );

    let err = importer
        .import("s3://bucket/*.json", ImportOptions::default().with_pattern(true))
        .unwrap_err();
    assert!(matches!(err, ImportError::FetchPattern { .. }));
}

#[test]
fn pattern_needs_listing_support() {
    let (importer, store) = remote_importer(
        MemoryStore::new()
            .with_object("bucket", "a.json", "1")
            .without_listing(),
    );

    let err = importer
        .import("s3://bucket/*.json", ImportOptions::parse(["pattern,nofail"]).unwrap())
        .unwrap_err();
    assert!(matches!(err, ImportError::UnsupportedOperation { .. }));
    assert_eq!(store.list_calls(), 0);

    let single = importer
        .import("s3://bucket/a.json", ImportOptions::default())
        .unwrap();
    assert!(matches!(single, Imported::Value(ref v) if *v == json!(1)));
}
