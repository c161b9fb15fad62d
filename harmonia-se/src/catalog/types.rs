//! Catalog data contracts
//!
//! These types are only ever constructed from documents that passed both
//! validation stages; downstream code never operates on unvalidated shapes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One instrument known to the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instrument {
    /// Unique identifier, e.g. `guitar_acoustic`
    pub id: String,
    /// Display name
    pub name: String,
    /// Must be one of the catalog's declared categories
    pub category: String,
    /// Preset names, in preference order (may be empty)
    #[serde(default)]
    pub presets: Vec<String>,
    /// Instrument ids to try, in priority order, when this instrument is
    /// named as a substitute target
    #[serde(default)]
    pub fallback_rules: Vec<String>,
    /// Sample asset names backing this instrument
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sample_references: Option<Vec<String>>,
    /// Maximum simultaneous uses within one export batch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub polyphony_limit: Option<u32>,
    /// Playable range, descriptive (e.g. "G3-A7")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<String>,
}

/// The validated set of known instruments and their substitution rules
///
/// Instrument order is document order; "first in catalog" semantics in the
/// resolver depend on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentCatalog {
    pub version: String,
    pub generated_at: DateTime<Utc>,
    #[serde(default)]
    pub description: String,
    /// Allowed category names
    pub categories: Vec<String>,
    pub instruments: Vec<Instrument>,
}

impl InstrumentCatalog {
    /// Find an instrument by id
    pub fn instrument(&self, id: &str) -> Option<&Instrument> {
        self.instruments.iter().find(|inst| inst.id == id)
    }

    /// All instruments in a category, in document order
    pub fn by_category<'a>(&'a self, category: &'a str) -> impl Iterator<Item = &'a Instrument> {
        self.instruments
            .iter()
            .filter(move |inst| inst.category == category)
    }
}

/// Outcome of a validation pass
///
/// Errors are always fully enumerated, never truncated to the first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<String>,
}

impl ValidationReport {
    /// A passing report with no errors
    pub fn ok() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
        }
    }

    /// A failing report carrying every collected violation
    pub fn invalid(errors: Vec<String>) -> Self {
        Self {
            valid: false,
            errors,
        }
    }
}
