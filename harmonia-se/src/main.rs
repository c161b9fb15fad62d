//! Stem Export (harmonia-se) - Main entry point
//!
//! Admin/CLI front end for the instrument catalog and stem export engine:
//! loads and validates a catalog, exports one stem per requested instrument,
//! and prints the structured result as JSON. The exit code reflects the
//! export outcome.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use harmonia_common::config::{load_toml_config, resolve_output_root, TomlConfig};
use harmonia_se::catalog::CatalogStore;
use harmonia_se::export::{ExportFormat, StemExportRequest, StemExporter};

/// Command-line arguments for harmonia-se
#[derive(Parser, Debug)]
#[command(name = "harmonia-se")]
#[command(about = "Instrument catalog & stem export engine for Harmonia")]
#[command(version)]
struct Args {
    /// Instrument ids to export, in order (duplicates allowed)
    #[arg(required = true)]
    instruments: Vec<String>,

    /// Path to the instrument catalog document
    #[arg(long, env = "HARMONIA_CATALOG")]
    catalog: Option<PathBuf>,

    /// Path to the catalog JSON Schema
    #[arg(long, env = "HARMONIA_CATALOG_SCHEMA")]
    schema: Option<PathBuf>,

    /// Output directory for exported stems
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Stem format: wav or mp3
    #[arg(short, long, default_value = "wav")]
    format: String,

    /// Sample rate in Hz
    #[arg(long)]
    sample_rate: Option<u32>,

    /// Disable fallback substitution (unknown ids become hard errors)
    #[arg(long)]
    no_fallbacks: bool,

    /// Path to TOML bootstrap config
    #[arg(long, env = "HARMONIA_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "harmonia_se=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let toml_config: Option<TomlConfig> = match &args.config {
        Some(path) => Some(
            load_toml_config(path).with_context(|| format!("Failed to load config {:?}", path))?,
        ),
        None => None,
    };

    let catalog_path = args
        .catalog
        .clone()
        .or_else(|| toml_config.as_ref().and_then(|c| c.catalog_path.clone()))
        .unwrap_or_else(|| PathBuf::from("models/instrument_catalog.json"));
    let schema_path = args
        .schema
        .clone()
        .or_else(|| toml_config.as_ref().and_then(|c| c.schema_path.clone()))
        .unwrap_or_else(|| PathBuf::from("models/instrument_catalog.schema.json"));

    // Priority: CLI > HARMONIA_OUTPUT_ROOT > TOML > OS default
    let output_dir = resolve_output_root(
        args.output_dir.as_deref(),
        "HARMONIA_OUTPUT_ROOT",
        toml_config.as_ref(),
    );

    let catalog_json = tokio::fs::read_to_string(&catalog_path)
        .await
        .with_context(|| format!("Failed to read catalog {:?}", catalog_path))?;
    let schema_json = tokio::fs::read_to_string(&schema_path)
        .await
        .with_context(|| format!("Failed to read schema {:?}", schema_path))?;

    let store = Arc::new(CatalogStore::new());
    let report = store
        .load(&catalog_json, &schema_json)
        .context("Failed to load instrument catalog")?;
    if !report.valid {
        for error in &report.errors {
            eprintln!("catalog: {}", error);
        }
        bail!(
            "Instrument catalog failed validation ({} errors)",
            report.errors.len()
        );
    }
    info!(catalog = %catalog_path.display(), "Catalog ready");

    let format: ExportFormat = args.format.parse()?;
    let request = StemExportRequest {
        format,
        instruments: args.instruments,
        output_dir,
        use_fallbacks: !args.no_fallbacks,
        sample_rate: args.sample_rate,
    };

    let exporter = StemExporter::new(Arc::clone(&store));
    let result = exporter.export_stems(&request).await?;

    println!("{}", serde_json::to_string_pretty(&result)?);

    Ok(if result.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
