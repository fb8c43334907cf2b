//! File-based configuration loading

use std::fs;
use std::path::Path;

use super::model::FoundryConfig;
use crate::error::{FoundryError, FoundryResult};

/// Load configuration from a file
///
/// The format follows the extension: `.toml`, `.yaml`/`.yml`, anything else
/// is JSON. A missing file yields the default configuration.
pub fn load_from_file(path: &Path) -> FoundryResult<FoundryConfig> {
    if !path.exists() {
        tracing::debug!("Config file {} not found, using defaults", path.display());
        return Ok(FoundryConfig::default());
    }

    let content = fs::read_to_string(path).map_err(|e| {
        FoundryError::config_with_context(
            format!("Failed to read config file: {}", e),
            format!("Reading configuration from '{}'", path.display()),
        )
    })?;

    let config = match path.extension().and_then(|s| s.to_str()) {
        Some("toml") => toml::from_str(&content).map_err(|e| {
            FoundryError::config_with_context(
                format!("Failed to parse TOML config: {}", e),
                format!("Deserializing TOML configuration from '{}'", path.display()),
            )
        })?,
        Some("yaml") | Some("yml") => serde_yaml::from_str(&content).map_err(|e| {
            FoundryError::config_with_context(
                format!("Failed to parse YAML config: {}", e),
                format!("Deserializing YAML configuration from '{}'", path.display()),
            )
        })?,
        _ => serde_json::from_str(&content).map_err(|e| {
            FoundryError::config_with_context(
                format!("Failed to parse JSON config: {}", e),
                format!("Deserializing JSON configuration from '{}'", path.display()),
            )
        })?,
    };

    Ok(config)
}
