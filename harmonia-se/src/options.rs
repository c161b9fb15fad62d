//! Pre-flight validation of export requests
//!
//! Runs before any I/O happens and collects every violation rather than
//! stopping at the first, so one correction pass suffices for the caller.

use crate::catalog::{CatalogStore, ValidationReport};
use crate::export::StemExportRequest;

/// Validates export requests against the catalog
pub struct OptionsValidator<'a> {
    catalog: &'a CatalogStore,
}

impl<'a> OptionsValidator<'a> {
    pub fn new(catalog: &'a CatalogStore) -> Self {
        Self { catalog }
    }

    /// Validate one request, reporting all violations together
    ///
    /// Unknown instrument ids are only violations when `use_fallbacks` is
    /// false; with fallbacks enabled they are deferred to the resolver,
    /// which substitutes them. Format validity is enforced by the
    /// [`crate::export::ExportFormat`] type at construction time.
    pub fn validate(&self, request: &StemExportRequest) -> ValidationReport {
        let mut errors = Vec::new();

        if request.instruments.is_empty() {
            errors.push("At least one instrument must be specified".to_string());
        } else if !request.use_fallbacks {
            let report = self.catalog.validate_instrument_ids(&request.instruments);
            errors.extend(report.errors);
        }

        if request.output_dir.as_os_str().is_empty() {
            errors.push("Output directory must be specified".to_string());
        }

        if request.sample_rate == Some(0) {
            errors.push("Sample rate must be greater than zero".to_string());
        }

        if errors.is_empty() {
            ValidationReport::ok()
        } else {
            ValidationReport::invalid(errors)
        }
    }
}
