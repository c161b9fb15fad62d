//! Integration tests for catalog loading against the shipped documents
//!
//! The unit tests in `catalog::store` use a permissive schema; these load
//! the real `models/` catalog and schema pair.

use harmonia_se::catalog::CatalogStore;

const CATALOG: &str = include_str!("../models/instrument_catalog.json");
const SCHEMA: &str = include_str!("../models/instrument_catalog.schema.json");

#[test]
fn test_shipped_catalog_loads_cleanly() {
    let store = CatalogStore::new();
    let report = store.load(CATALOG, SCHEMA).unwrap();
    assert!(report.valid, "errors: {:?}", report.errors);

    let snapshot = store.snapshot().unwrap();
    assert_eq!(snapshot.version, "1.2.0");
    assert_eq!(snapshot.instruments.len(), 15);
}

#[test]
fn test_shipped_catalog_queries() {
    let store = CatalogStore::new();
    store.load(CATALOG, SCHEMA).unwrap();

    let violin = store.get_instrument("violin").unwrap();
    assert_eq!(violin.category, "strings");
    assert_eq!(violin.polyphony_limit, Some(4));
    assert_eq!(violin.range.as_deref(), Some("G3-A7"));

    let strings = store.instruments_by_category("strings");
    assert_eq!(strings.len(), 2);

    let fallbacks = store.fallback_instruments("piano");
    let ids: Vec<&str> = fallbacks.iter().map(|i| i.id.as_str()).collect();
    assert_eq!(ids, vec!["organ", "synth_pad"]);
}

#[test]
fn test_undeclared_category_fails_semantic_validation() {
    // Remove "brass" from the declared categories while trumpet still uses it
    let mut doc: serde_json::Value = serde_json::from_str(CATALOG).unwrap();
    let categories = doc["categories"].as_array_mut().unwrap();
    categories.retain(|c| c != "brass");

    let store = CatalogStore::new();
    let report = store.load(&doc.to_string(), SCHEMA).unwrap();
    assert!(!report.valid);
    assert!(report
        .errors
        .iter()
        .any(|e| e == "Instrument trumpet has unknown category: brass"));
    assert!(!store.is_loaded());
}

#[test]
fn test_schema_rejects_missing_required_fields() {
    let mut doc: serde_json::Value = serde_json::from_str(CATALOG).unwrap();
    doc.as_object_mut().unwrap().remove("version");
    doc["instruments"][0]
        .as_object_mut()
        .unwrap()
        .remove("name");

    let store = CatalogStore::new();
    let report = store.load(&doc.to_string(), SCHEMA).unwrap();
    assert!(!report.valid);
    // Both violations are reported together
    assert!(report.errors.len() >= 2, "errors: {:?}", report.errors);
}

#[test]
fn test_schema_rejects_zero_polyphony_limit() {
    let mut doc: serde_json::Value = serde_json::from_str(CATALOG).unwrap();
    doc["instruments"][0]["polyphony_limit"] = serde_json::json!(0);

    let store = CatalogStore::new();
    let report = store.load(&doc.to_string(), SCHEMA).unwrap();
    assert!(!report.valid);
}

#[test]
fn test_schema_rejects_unknown_properties() {
    let mut doc: serde_json::Value = serde_json::from_str(CATALOG).unwrap();
    doc["instruments"][0]["loudness"] = serde_json::json!(11);

    let store = CatalogStore::new();
    let report = store.load(&doc.to_string(), SCHEMA).unwrap();
    assert!(!report.valid);
}

#[test]
fn test_failed_reload_keeps_serving_shipped_catalog() {
    let store = CatalogStore::new();
    store.load(CATALOG, SCHEMA).unwrap();

    let mut doc: serde_json::Value = serde_json::from_str(CATALOG).unwrap();
    doc["instruments"][0]["id"] = serde_json::json!("violin");
    // Duplicate "violin" id now exists; reload must fail and keep v1.2.0
    let report = store.load(&doc.to_string(), SCHEMA).unwrap();
    assert!(!report.valid);

    assert_eq!(store.snapshot().unwrap().version, "1.2.0");
    assert!(store.get_instrument("piano").is_some());
}
