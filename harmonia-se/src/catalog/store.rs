//! Catalog loading, validation, and query API
//!
//! `CatalogStore` holds the current catalog behind a poison-free lock and
//! replaces it atomically on a successful load; a failed load leaves the
//! prior catalog untouched, so no partial-catalog state is ever observable.

use crate::catalog::types::{Instrument, InstrumentCatalog, ValidationReport};
use crate::error::{Error, Result};
use parking_lot::RwLock;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{error, info};

/// Loads, validates, and serves the instrument catalog
#[derive(Default)]
pub struct CatalogStore {
    catalog: RwLock<Option<Arc<InstrumentCatalog>>>,
}

impl CatalogStore {
    /// Store with no catalog loaded; queries return empty results until
    /// [`CatalogStore::load`] succeeds
    pub fn new() -> Self {
        Self::default()
    }

    /// Load and validate a catalog document against a schema document
    ///
    /// Validation runs in two stages:
    /// 1. Structural validation against the JSON Schema
    /// 2. Semantic checks beyond the schema: fallback targets must exist,
    ///    categories must be declared, ids must be unique
    ///
    /// All violations of a stage are collected and returned together. The
    /// held catalog is replaced only when both stages pass; otherwise the
    /// prior state is left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedInput`] when either document cannot be
    /// parsed at all (prior state also untouched).
    pub fn load(&self, catalog_json: &str, schema_json: &str) -> Result<ValidationReport> {
        let schema: serde_json::Value = serde_json::from_str(schema_json)
            .map_err(|e| Error::MalformedInput(format!("Schema parse error: {}", e)))?;
        let validator = jsonschema::validator_for(&schema)
            .map_err(|e| Error::MalformedInput(format!("Invalid schema: {}", e)))?;

        let document: serde_json::Value = serde_json::from_str(catalog_json)
            .map_err(|e| Error::MalformedInput(format!("Catalog parse error: {}", e)))?;

        let schema_errors: Vec<String> = validator
            .iter_errors(&document)
            .map(|err| format!("{}: {}", err.instance_path, err))
            .collect();
        if !schema_errors.is_empty() {
            error!(
                errors = schema_errors.len(),
                "Instrument catalog schema validation failed"
            );
            return Ok(ValidationReport::invalid(schema_errors));
        }

        let catalog: InstrumentCatalog = serde_json::from_value(document)
            .map_err(|e| Error::MalformedInput(format!("Catalog deserialize error: {}", e)))?;

        let semantic_errors = validate_semantics(&catalog);
        if !semantic_errors.is_empty() {
            error!(
                errors = semantic_errors.len(),
                "Instrument catalog semantic validation failed"
            );
            return Ok(ValidationReport::invalid(semantic_errors));
        }

        info!(
            version = %catalog.version,
            instruments = catalog.instruments.len(),
            "Loaded instrument catalog"
        );
        *self.catalog.write() = Some(Arc::new(catalog));
        Ok(ValidationReport::ok())
    }

    /// The currently held catalog, if one has been loaded
    ///
    /// Callers that need a coherent view across several lookups (the
    /// resolver) take one snapshot and work against it; a concurrent reload
    /// cannot affect them.
    pub fn snapshot(&self) -> Option<Arc<InstrumentCatalog>> {
        self.catalog.read().clone()
    }

    /// Whether a catalog is currently loaded
    pub fn is_loaded(&self) -> bool {
        self.catalog.read().is_some()
    }

    /// Find an instrument by id
    pub fn get_instrument(&self, id: &str) -> Option<Instrument> {
        self.snapshot()?.instrument(id).cloned()
    }

    /// All instruments in a category (empty when unloaded or unknown)
    pub fn instruments_by_category(&self, category: &str) -> Vec<Instrument> {
        self.snapshot()
            .map(|catalog| catalog.by_category(category).cloned().collect())
            .unwrap_or_default()
    }

    /// Resolve an instrument's own declared fallback rules to instruments
    ///
    /// Unresolvable entries are silently dropped; post-validation there
    /// should be none.
    pub fn fallback_instruments(&self, id: &str) -> Vec<Instrument> {
        let Some(catalog) = self.snapshot() else {
            return Vec::new();
        };
        let Some(instrument) = catalog.instrument(id) else {
            return Vec::new();
        };
        instrument
            .fallback_rules
            .iter()
            .filter_map(|fallback_id| catalog.instrument(fallback_id))
            .cloned()
            .collect()
    }

    /// Check that every id exists in the catalog, reporting all unknowns
    pub fn validate_instrument_ids(&self, ids: &[String]) -> ValidationReport {
        let Some(catalog) = self.snapshot() else {
            return ValidationReport::invalid(vec!["Instrument catalog not loaded".to_string()]);
        };

        let valid_ids: HashSet<&str> = catalog.instruments.iter().map(|i| i.id.as_str()).collect();
        let errors: Vec<String> = ids
            .iter()
            .filter(|id| !valid_ids.contains(id.as_str()))
            .map(|id| format!("Unknown instrument ID: {}", id))
            .collect();

        if errors.is_empty() {
            ValidationReport::ok()
        } else {
            ValidationReport::invalid(errors)
        }
    }
}

/// Semantic validation beyond the JSON Schema, collecting all violations
fn validate_semantics(catalog: &InstrumentCatalog) -> Vec<String> {
    let mut errors = Vec::new();

    let ids: HashSet<&str> = catalog.instruments.iter().map(|i| i.id.as_str()).collect();

    for instrument in &catalog.instruments {
        for fallback_id in &instrument.fallback_rules {
            if !ids.contains(fallback_id.as_str()) {
                errors.push(format!(
                    "Instrument {} has invalid fallback rule: {}",
                    instrument.id, fallback_id
                ));
            }
        }

        if !catalog.categories.contains(&instrument.category) {
            errors.push(format!(
                "Instrument {} has unknown category: {}",
                instrument.id, instrument.category
            ));
        }
    }

    let mut seen = HashSet::new();
    for instrument in &catalog.instruments {
        if !seen.insert(instrument.id.as_str()) {
            errors.push(format!("Duplicate instrument ID: {}", instrument.id));
        }
    }

    errors
}
