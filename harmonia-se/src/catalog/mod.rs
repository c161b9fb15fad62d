//! Instrument catalog: data model, two-stage validation, and lookups
//!
//! The catalog is a structured document (JSON in practice) validated in two
//! stages before anything downstream sees it: structural validation against
//! a JSON Schema, then semantic checks the schema cannot express (unique
//! ids, declared categories, resolvable fallback targets). Only a fully
//! valid document ever replaces the held catalog.

mod store;
mod types;

pub use store::CatalogStore;
pub use types::{Instrument, InstrumentCatalog, ValidationReport};
