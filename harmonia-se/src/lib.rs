//! # Harmonia Stem Export (harmonia-se)
//!
//! Instrument catalog and stem export engine for Harmonia:
//! - Loads and validates a declarative catalog of instruments and their
//!   substitution rules ([`catalog::CatalogStore`])
//! - Resolves requested instrument lists against the catalog, substituting
//!   fallbacks for unknown or polyphony-saturated instruments
//!   ([`resolver::FallbackResolver`])
//! - Exports one audio artifact per resolved instrument concurrently,
//!   aggregating per-item successes, errors, and substitution warnings
//!   ([`export::StemExporter`])
//!
//! Audio synthesis is a pluggable concern behind
//! [`export::audio::AudioPayloadGenerator`]; the built-in generator produces
//! placeholder payloads.

pub mod catalog;
pub mod error;
pub mod export;
pub mod options;
pub mod resolver;

pub use catalog::{CatalogStore, Instrument, InstrumentCatalog, ValidationReport};
pub use error::{Error, Result};
pub use export::{ExportFormat, ExportedStem, StemExportRequest, StemExportResult, StemExporter};
pub use resolver::{FallbackResolver, Resolution};
