//! Fallback resolution for requested instruments
//!
//! Maps every requested instrument id to the instrument actually used for
//! export. Substitution happens in two situations: the requested id is not
//! in the catalog (availability fallback), or the chosen instrument is
//! already at its polyphony limit within the batch (polyphony relief).
//! Resolution is total: it never fails, and degraded outcomes (no candidate
//! found) still produce a usable resolution.

use crate::catalog::{CatalogStore, Instrument, InstrumentCatalog};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Sentinel id emitted when the catalog holds no instruments at all
pub const DEFAULT_SILENCE_ID: &str = "default_silence";

/// Mapping from one requested instrument to the instrument actually used
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// The id as requested by the caller
    pub requested: String,
    /// The id actually exported
    pub effective: String,
    /// Whether any substitution occurred
    pub fallback_used: bool,
}

/// Resolves requested instrument ids against the catalog
///
/// Polyphony usage is scoped to one `resolve` call; limits are per export
/// batch, never global across calls.
pub struct FallbackResolver<'a> {
    store: &'a CatalogStore,
}

impl<'a> FallbackResolver<'a> {
    pub fn new(store: &'a CatalogStore) -> Self {
        Self { store }
    }

    /// Resolve requested ids, strictly in input order
    ///
    /// Order matters: duplicate requests accumulate polyphony usage, so a
    /// later duplicate can fall back even though earlier ones resolved
    /// unchanged. Returns exactly one [`Resolution`] per request.
    pub fn resolve(&self, requested: &[String], use_fallbacks: bool) -> Vec<Resolution> {
        // One snapshot for the whole call; a concurrent reload cannot give
        // two requests inconsistent views.
        let snapshot = self.store.snapshot();
        let catalog = snapshot.as_deref();
        let mut usage: HashMap<String, u32> = HashMap::new();

        requested
            .iter()
            .map(|id| resolve_one(catalog, id, use_fallbacks, &mut usage))
            .collect()
    }
}

fn resolve_one(
    catalog: Option<&InstrumentCatalog>,
    requested: &str,
    use_fallbacks: bool,
    usage: &mut HashMap<String, u32>,
) -> Resolution {
    let found = catalog.and_then(|c| c.instrument(requested));

    let (mut instrument, mut fallback_used) = match found {
        Some(inst) => (inst, false),
        // Caller opted out of substitution; unknown ids are expected to be
        // rejected by request validation, not here.
        None if !use_fallbacks => {
            return Resolution {
                requested: requested.to_string(),
                effective: requested.to_string(),
                fallback_used: false,
            };
        }
        None => match catalog.and_then(|c| find_substitute(c, requested)) {
            Some(inst) => {
                debug!(
                    requested,
                    substitute = %inst.id,
                    "Requested instrument not in catalog, substituting"
                );
                (inst, true)
            }
            None => {
                debug!(requested, "Catalog holds no instruments, using silence sentinel");
                return Resolution {
                    requested: requested.to_string(),
                    effective: DEFAULT_SILENCE_ID.to_string(),
                    fallback_used: true,
                };
            }
        },
    };

    if at_limit(instrument, usage) {
        match catalog.and_then(|c| find_relief(c, instrument, usage)) {
            Some(relief) => {
                debug!(
                    saturated = %instrument.id,
                    relief = %relief.id,
                    "Polyphony limit reached, substituting"
                );
                instrument = relief;
                fallback_used = true;
            }
            None => {
                // The limit is advisory; the batch proceeds over-limit.
                warn!(
                    instrument = %instrument.id,
                    "Polyphony limit exceeded with no relief candidate, proceeding"
                );
            }
        }
    }

    // Unlimited instruments are never tracked, which bounds the map size.
    if instrument.polyphony_limit.is_some() {
        *usage.entry(instrument.id.clone()).or_insert(0) += 1;
    }

    Resolution {
        requested: requested.to_string(),
        effective: instrument.id.clone(),
        fallback_used,
    }
}

fn at_limit(instrument: &Instrument, usage: &HashMap<String, u32>) -> bool {
    match instrument.polyphony_limit {
        Some(limit) => usage.get(&instrument.id).copied().unwrap_or(0) >= limit,
        None => false,
    }
}

/// Substitute for an id missing from the catalog, in priority order:
/// an instrument naming the missing id in its own fallback rules, then the
/// category guessed from the id's leading underscore segment, then the
/// first catalog entry.
fn find_substitute<'c>(catalog: &'c InstrumentCatalog, missing: &str) -> Option<&'c Instrument> {
    if let Some(inst) = catalog
        .instruments
        .iter()
        .find(|i| i.fallback_rules.iter().any(|f| f == missing))
    {
        return Some(inst);
    }

    // "guitar_acoustic" -> "guitar"; documented heuristic, fragile for ids
    // that do not follow the category_name convention
    if let Some(category) = missing.split('_').next() {
        if let Some(inst) = catalog.instruments.iter().find(|i| i.category == category) {
            return Some(inst);
        }
    }

    catalog.instruments.first()
}

/// Relief for a polyphony-saturated instrument: its own declared fallbacks
/// first (priority order), then other instruments of the same category,
/// picking the first with headroom under its own limit (or no limit).
fn find_relief<'c>(
    catalog: &'c InstrumentCatalog,
    saturated: &Instrument,
    usage: &HashMap<String, u32>,
) -> Option<&'c Instrument> {
    for fallback_id in &saturated.fallback_rules {
        if let Some(candidate) = catalog.instrument(fallback_id) {
            if !at_limit(candidate, usage) {
                return Some(candidate);
            }
        }
    }

    catalog
        .instruments
        .iter()
        .find(|candidate| candidate.category == saturated.category && !at_limit(candidate, usage))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const ANY_SCHEMA: &str = r#"{"type": "object"}"#;

    fn load_store(instruments: serde_json::Value, categories: serde_json::Value) -> CatalogStore {
        let store = CatalogStore::new();
        let doc = json!({
            "version": "1.0.0",
            "generated_at": "2025-11-18T09:24:00Z",
            "categories": categories,
            "instruments": instruments
        })
        .to_string();
        let report = store.load(&doc, ANY_SCHEMA).unwrap();
        assert!(report.valid, "fixture catalog invalid: {:?}", report.errors);
        store
    }

    fn strings_store() -> CatalogStore {
        load_store(
            json!([
                {
                    "id": "violin",
                    "name": "Violin",
                    "category": "strings",
                    "presets": [],
                    "fallback_rules": ["viola"],
                    "polyphony_limit": 4
                },
                {"id": "viola", "name": "Viola", "category": "strings", "presets": []},
                {"id": "piano", "name": "Piano", "category": "keys", "presets": []}
            ]),
            json!(["strings", "keys"]),
        )
    }

    fn ids(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_known_ids_resolve_unchanged_in_order() {
        let store = strings_store();
        let resolver = FallbackResolver::new(&store);

        let resolutions = resolver.resolve(&ids(&["piano", "violin"]), true);
        assert_eq!(resolutions.len(), 2);
        assert_eq!(resolutions[0].requested, "piano");
        assert_eq!(resolutions[0].effective, "piano");
        assert!(!resolutions[0].fallback_used);
        assert_eq!(resolutions[1].effective, "violin");
    }

    #[test]
    fn test_missing_id_uses_category_heuristic() {
        // "drums_808" is unknown; its leading segment maps to the "drums"
        // category and the first instrument there is picked.
        let store = load_store(
            json!([
                {"id": "synth_pad", "name": "Synth Pad", "category": "synth", "presets": []},
                {"id": "drums_acoustic", "name": "Drums", "category": "drums", "presets": []},
                {"id": "drums_brush", "name": "Brush Kit", "category": "drums", "presets": []}
            ]),
            json!(["synth", "drums"]),
        );
        let resolver = FallbackResolver::new(&store);
        let res = resolver.resolve(&ids(&["drums_808"]), true);
        assert_eq!(res[0].effective, "drums_acoustic");
        assert!(res[0].fallback_used);
    }

    #[test]
    fn test_missing_id_falls_back_to_first_catalog_entry() {
        // "tuba_rare": no instrument declares it and no "tuba" category
        // exists, so the first catalog entry is the last resort.
        let store = strings_store();
        let resolver = FallbackResolver::new(&store);
        let res = resolver.resolve(&ids(&["tuba_rare"]), true);
        assert_eq!(res[0].requested, "tuba_rare");
        assert_eq!(res[0].effective, "violin");
        assert!(res[0].fallback_used);
    }

    #[test]
    fn test_empty_catalog_uses_silence_sentinel() {
        let store = load_store(json!([]), json!(["strings"]));
        let resolver = FallbackResolver::new(&store);
        let res = resolver.resolve(&ids(&["violin"]), true);
        assert_eq!(res[0].effective, DEFAULT_SILENCE_ID);
        assert!(res[0].fallback_used);
    }

    #[test]
    fn test_unloaded_store_uses_silence_sentinel() {
        let store = CatalogStore::new();
        let resolver = FallbackResolver::new(&store);
        let res = resolver.resolve(&ids(&["violin"]), true);
        assert_eq!(res[0].effective, DEFAULT_SILENCE_ID);
        assert!(res[0].fallback_used);
    }

    #[test]
    fn test_no_fallbacks_passes_unknown_id_through() {
        let store = strings_store();
        let resolver = FallbackResolver::new(&store);
        let res = resolver.resolve(&ids(&["tuba_rare"]), false);
        assert_eq!(res[0].effective, "tuba_rare");
        assert!(!res[0].fallback_used);
    }

    #[test]
    fn test_polyphony_limit_triggers_relief_on_fifth_request() {
        let store = strings_store();
        let resolver = FallbackResolver::new(&store);

        let res = resolver.resolve(&ids(&["violin"; 5]), true);
        assert_eq!(res.len(), 5);
        for r in &res[..4] {
            assert_eq!(r.effective, "violin");
            assert!(!r.fallback_used);
        }
        assert_eq!(res[4].effective, "viola");
        assert!(res[4].fallback_used);
    }

    #[test]
    fn test_polyphony_relief_prefers_own_fallbacks_over_category() {
        let store = load_store(
            json!([
                {
                    "id": "violin",
                    "name": "Violin",
                    "category": "strings",
                    "presets": [],
                    "fallback_rules": ["cello"],
                    "polyphony_limit": 1
                },
                {"id": "viola", "name": "Viola", "category": "strings", "presets": []},
                {"id": "cello", "name": "Cello", "category": "strings", "presets": []}
            ]),
            json!(["strings"]),
        );
        let resolver = FallbackResolver::new(&store);
        let res = resolver.resolve(&ids(&["violin", "violin"]), true);
        // Own declared fallback (cello) beats the earlier category match (viola)
        assert_eq!(res[1].effective, "cello");
        assert!(res[1].fallback_used);
    }

    #[test]
    fn test_polyphony_relief_skips_saturated_fallbacks() {
        let store = load_store(
            json!([
                {
                    "id": "violin",
                    "name": "Violin",
                    "category": "strings",
                    "presets": [],
                    "fallback_rules": ["cello"],
                    "polyphony_limit": 1
                },
                {
                    "id": "cello",
                    "name": "Cello",
                    "category": "strings",
                    "presets": [],
                    "polyphony_limit": 1
                },
                {"id": "viola", "name": "Viola", "category": "strings", "presets": []}
            ]),
            json!(["strings"]),
        );
        let resolver = FallbackResolver::new(&store);
        let res = resolver.resolve(&ids(&["violin", "cello", "violin"]), true);
        // violin and cello are both saturated by the first two requests;
        // relief falls through to the category scan and lands on viola.
        assert_eq!(res[2].effective, "viola");
        assert!(res[2].fallback_used);
    }

    #[test]
    fn test_over_limit_proceeds_when_no_relief_exists() {
        let store = load_store(
            json!([
                {
                    "id": "drums",
                    "name": "Drums",
                    "category": "percussion",
                    "presets": [],
                    "polyphony_limit": 1
                }
            ]),
            json!(["percussion"]),
        );
        let resolver = FallbackResolver::new(&store);
        let res = resolver.resolve(&ids(&["drums", "drums", "drums"]), true);
        assert_eq!(res.len(), 3);
        // No candidate exists; the batch proceeds over-limit, never rejects
        for r in &res {
            assert_eq!(r.effective, "drums");
        }
        assert!(!res[0].fallback_used);
    }

    #[test]
    fn test_usage_is_scoped_per_call() {
        let store = strings_store();
        let resolver = FallbackResolver::new(&store);

        for _ in 0..3 {
            let res = resolver.resolve(&ids(&["violin"; 4]), true);
            // A fresh call starts from zero usage; all four fit the limit
            assert!(res.iter().all(|r| r.effective == "violin"));
        }
    }

    #[test]
    fn test_unlimited_instruments_are_not_tracked() {
        let store = strings_store();
        let resolver = FallbackResolver::new(&store);
        let res = resolver.resolve(&ids(&["piano"; 10]), true);
        assert!(res.iter().all(|r| r.effective == "piano" && !r.fallback_used));
    }
}
