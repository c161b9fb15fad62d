//! Stem export orchestration
//!
//! [`StemExporter`] is the engine's top-level entry point: it gates requests
//! through `OptionsValidator`, resolves instruments through
//! `FallbackResolver`, then runs one export task per resolution and folds
//! the outcomes into a single [`StemExportResult`]. Export is
//! unit-of-work-per-instrument: one failed item never aborts its siblings.

pub mod audio;
pub mod sink;

use crate::catalog::CatalogStore;
use crate::error::{Error, Result};
use crate::options::OptionsValidator;
use crate::resolver::{FallbackResolver, Resolution};
use audio::{AudioPayloadGenerator, PlaceholderAudioGenerator, DEFAULT_SAMPLE_RATE};
use serde::{Deserialize, Serialize};
use sink::{ArtifactSink, FilesystemSink};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Supported stem audio formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Wav,
    Mp3,
}

impl ExportFormat {
    /// File extension for this format
    pub fn extension(self) -> &'static str {
        match self {
            Self::Wav => "wav",
            Self::Mp3 => "mp3",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "wav" => Ok(Self::Wav),
            "mp3" => Ok(Self::Mp3),
            other => Err(Error::InvalidRequest(vec![format!(
                "Format must be wav or mp3 (got: {})",
                other
            )])),
        }
    }
}

/// One stem export request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StemExportRequest {
    /// Output audio format
    pub format: ExportFormat,
    /// Requested instrument ids, in order; duplicates are meaningful (two
    /// entries of one id ask for two simultaneous voices)
    pub instruments: Vec<String>,
    /// Directory the stems are written into
    pub output_dir: PathBuf,
    /// Substitute fallback instruments for unknown or saturated ids
    #[serde(default = "default_use_fallbacks")]
    pub use_fallbacks: bool,
    /// Sample rate in Hz (defaults to 44100)
    #[serde(default)]
    pub sample_rate: Option<u32>,
}

fn default_use_fallbacks() -> bool {
    true
}

/// One successfully exported stem
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportedStem {
    /// The instrument id as requested (not the substitute); callers
    /// correlate results to their request through this field
    pub instrument: String,
    pub file_path: PathBuf,
    pub format: ExportFormat,
    /// Size in bytes read back from the sink
    pub size: u64,
    pub fallback_used: bool,
}

/// Aggregate outcome of one export batch
///
/// `success` is true iff `errors` is empty. Partial success is normal:
/// callers must inspect both `stems` and `errors`, not `success` alone.
/// `stems` and `errors` follow task completion order, not request order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StemExportResult {
    pub success: bool,
    pub stems: Vec<ExportedStem>,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl StemExportResult {
    /// The abort shape: a fatal fault before or during orchestration
    fn aborted(message: String) -> Self {
        Self {
            success: false,
            stems: Vec::new(),
            errors: vec![message],
            warnings: Vec::new(),
        }
    }
}

enum ItemOutcome {
    Exported(ExportedStem),
    Failed(String),
}

/// Orchestrates concurrent per-instrument stem export
pub struct StemExporter {
    catalog: Arc<CatalogStore>,
    generator: Arc<dyn AudioPayloadGenerator>,
    sink: Arc<dyn ArtifactSink>,
}

impl StemExporter {
    /// Exporter with the built-in placeholder generator and filesystem sink
    pub fn new(catalog: Arc<CatalogStore>) -> Self {
        Self::with_parts(
            catalog,
            Arc::new(PlaceholderAudioGenerator),
            Arc::new(FilesystemSink),
        )
    }

    /// Exporter with caller-supplied generator and sink
    pub fn with_parts(
        catalog: Arc<CatalogStore>,
        generator: Arc<dyn AudioPayloadGenerator>,
        sink: Arc<dyn ArtifactSink>,
    ) -> Self {
        Self {
            catalog,
            generator,
            sink,
        }
    }

    /// Export one stem per requested instrument
    ///
    /// Pre-flight violations are returned as [`Error::InvalidRequest`]
    /// carrying every violation; the export never starts. Once started, the
    /// call always completes with a [`StemExportResult`]: per-item failures
    /// land in `errors` without affecting siblings, and a fatal fault
    /// (unusable output target, task panic) produces the abort shape with an
    /// empty `stems` list.
    pub async fn export_stems(&self, request: &StemExportRequest) -> Result<StemExportResult> {
        let report = OptionsValidator::new(&self.catalog).validate(request);
        if !report.valid {
            return Err(Error::InvalidRequest(report.errors));
        }

        let batch_id = Uuid::new_v4();
        info!(
            %batch_id,
            format = %request.format,
            instruments = request.instruments.len(),
            output_dir = %request.output_dir.display(),
            "Starting stem export"
        );

        let result = match self.run_batch(batch_id, request).await {
            Ok(result) => result,
            Err(e) => {
                error!(%batch_id, error = %e, "Stem export aborted");
                StemExportResult::aborted(format!("Export failed: {}", e))
            }
        };

        info!(
            %batch_id,
            success = result.success,
            stems = result.stems.len(),
            errors = result.errors.len(),
            "Stem export finished"
        );
        Ok(result)
    }

    async fn run_batch(&self, batch_id: Uuid, request: &StemExportRequest) -> Result<StemExportResult> {
        self.sink.prepare_target(&request.output_dir).await?;

        // Resolution runs to completion before any task spawns; polyphony
        // accounting depends on sequential request order.
        let resolutions =
            FallbackResolver::new(&self.catalog).resolve(&request.instruments, request.use_fallbacks);
        let warnings = substitution_warnings(&resolutions);

        let sample_rate = request.sample_rate.unwrap_or(DEFAULT_SAMPLE_RATE);
        let mut tasks = JoinSet::new();
        for resolution in resolutions {
            let generator = Arc::clone(&self.generator);
            let sink = Arc::clone(&self.sink);
            let output_dir = request.output_dir.clone();
            let format = request.format;
            tasks.spawn(async move {
                export_item(generator, sink, output_dir, resolution, format, sample_rate).await
            });
        }

        let mut stems = Vec::new();
        let mut errors = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            // A panicked task is an orchestration fault, not an item failure
            let outcome =
                joined.map_err(|e| Error::Internal(format!("export task failed: {}", e)))?;
            match outcome {
                ItemOutcome::Exported(stem) => stems.push(stem),
                ItemOutcome::Failed(message) => {
                    warn!(%batch_id, %message, "Stem export item failed");
                    errors.push(message);
                }
            }
        }

        Ok(StemExportResult {
            success: errors.is_empty(),
            stems,
            errors,
            warnings,
        })
    }
}

/// Export one resolved instrument: generate, write, read back size
async fn export_item(
    generator: Arc<dyn AudioPayloadGenerator>,
    sink: Arc<dyn ArtifactSink>,
    output_dir: PathBuf,
    resolution: Resolution,
    format: ExportFormat,
    sample_rate: u32,
) -> ItemOutcome {
    let file_name = format!(
        "{}.{}",
        sanitize_file_stem(&resolution.effective),
        format.extension()
    );
    let file_path = output_dir.join(file_name);

    let attempt = async {
        let payload = generator.generate(&resolution.effective, format, sample_rate)?;
        sink.write(&file_path, &payload).await?;
        let size = sink.size(&file_path).await?;
        Ok::<u64, Error>(size)
    };

    match attempt.await {
        Ok(size) => ItemOutcome::Exported(ExportedStem {
            instrument: resolution.requested,
            file_path,
            format,
            size,
            fallback_used: resolution.fallback_used,
        }),
        // Errors name the instrument the caller asked for, not the substitute
        Err(e) => ItemOutcome::Failed(format!(
            "Failed to export stem for {}: {}",
            resolution.requested, e
        )),
    }
}

/// Non-alphanumeric id characters are replaced so file names stay safe
fn sanitize_file_stem(id: &str) -> String {
    id.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

/// Zero or one aggregated note listing every requested -> substituted pair
fn substitution_warnings(resolutions: &[Resolution]) -> Vec<String> {
    let pairs: Vec<String> = resolutions
        .iter()
        .filter(|r| r.fallback_used)
        .map(|r| format!("{} -> {}", r.requested, r.effective))
        .collect();

    if pairs.is_empty() {
        Vec::new()
    } else {
        vec![format!("Fallback instruments used: {}", pairs.join(", "))]
    }
}
