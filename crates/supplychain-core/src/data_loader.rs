//! Chain configuration loading from JSON, TOML and RON.
//!
//! Feature-gated behind `data-loader`. The format is picked from the file
//! extension; loaded configs are validated before they are returned.

use std::path::{Path, PathBuf};

use crate::config::{ChainConfig, ConfigError};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can occur while loading a chain configuration.
#[derive(Debug, thiserror::Error)]
pub enum DataLoadError {
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("RON parse error: {0}")]
    Ron(#[from] ron::error::SpannedError),
    #[error("unsupported format for file: {0}")]
    UnsupportedFormat(PathBuf),
    #[error("invalid chain configuration: {0}")]
    Invalid(#[from] ConfigError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Supported configuration formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Toml,
    Ron,
}

/// Detect the format of a file based on its extension.
pub fn detect_format(path: &Path) -> Result<Format, DataLoadError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => Ok(Format::Json),
        Some("toml") => Ok(Format::Toml),
        Some("ron") => Ok(Format::Ron),
        _ => Err(DataLoadError::UnsupportedFormat(path.to_path_buf())),
    }
}

// ---------------------------------------------------------------------------
// Loading functions
// ---------------------------------------------------------------------------

/// Parse and validate a config in the given format. Missing fields take
/// their [`ChainConfig::default`] values.
pub fn load_config_str(text: &str, format: Format) -> Result<ChainConfig, DataLoadError> {
    let config: ChainConfig = match format {
        Format::Json => serde_json::from_str(text)?,
        Format::Toml => toml::from_str(text)?,
        Format::Ron => ron::from_str(text)?,
    };
    config.validate()?;
    Ok(config)
}

/// Read, parse and validate a config file.
pub fn load_config_file(path: &Path) -> Result<ChainConfig, DataLoadError> {
    let format = detect_format(path)?;
    let text = std::fs::read_to_string(path)?;
    load_config_str(&text, format)
}
