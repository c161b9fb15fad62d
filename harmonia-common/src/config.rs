//! Bootstrap configuration loading and output root resolution
//!
//! Harmonia services read a small TOML bootstrap file at startup. Runtime
//! behavior (catalog contents, export requests) arrives through the API, so
//! the TOML layer stays minimal: paths and logging only.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Bootstrap configuration loaded from TOML file
///
/// These settings cannot change during runtime; a service restart picks up
/// edits to the TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Root folder for exported artifacts (optional)
    ///
    /// If not specified, resolution falls through to environment variable
    /// and OS-dependent default.
    #[serde(default)]
    pub output_root: Option<PathBuf>,

    /// Path to the instrument catalog document (optional)
    #[serde(default)]
    pub catalog_path: Option<PathBuf>,

    /// Path to the instrument catalog JSON Schema (optional)
    #[serde(default)]
    pub schema_path: Option<PathBuf>,

    /// Logging configuration (optional)
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Read and parse a TOML bootstrap configuration file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Failed to read config file {:?}: {}", path, e)))?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Failed to parse TOML {:?}: {}", path, e)))
}

/// Serialize and write a TOML bootstrap configuration file
pub fn write_toml_config(config: &TomlConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("Failed to serialize TOML: {}", e)))?;
    std::fs::write(path, content)?;
    Ok(())
}

/// Output root resolution priority order:
/// 1. Command-line argument (highest priority)
/// 2. Environment variable
/// 3. TOML config file
/// 4. OS-dependent compiled default (fallback)
pub fn resolve_output_root(
    cli_arg: Option<&Path>,
    env_var_name: &str,
    toml_config: Option<&TomlConfig>,
) -> PathBuf {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(env_var_name) {
        if !path.is_empty() {
            return PathBuf::from(path);
        }
    }

    // Priority 3: TOML config file
    if let Some(config) = toml_config {
        if let Some(root) = &config.output_root {
            return root.clone();
        }
    }

    // Priority 4: OS-dependent compiled default
    get_default_output_root()
}

/// Get OS-dependent default output root folder
pub fn get_default_output_root() -> PathBuf {
    if cfg!(target_os = "linux") {
        // ~/.local/share/harmonia/exports
        dirs::data_local_dir()
            .map(|d| d.join("harmonia").join("exports"))
            .unwrap_or_else(|| PathBuf::from("/var/lib/harmonia/exports"))
    } else if cfg!(target_os = "macos") {
        // ~/Library/Application Support/harmonia/exports
        dirs::data_dir()
            .map(|d| d.join("harmonia").join("exports"))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/harmonia/exports"))
    } else if cfg!(target_os = "windows") {
        // %LOCALAPPDATA%\harmonia\exports
        dirs::data_local_dir()
            .map(|d| d.join("harmonia").join("exports"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\harmonia\\exports"))
    } else {
        PathBuf::from("./harmonia_exports")
    }
}
