//! Layered configuration loader

use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::file_loader::load_from_file;
use super::model::FoundryConfig;
use crate::error::{FoundryError, FoundryResult};

type EnvLookup = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Source of configuration data
#[derive(Clone)]
pub enum ConfigSource {
    File(PathBuf),
    /// `FOUNDRY_*` variables read through the given lookup
    Environment(EnvLookup),
    Default,
}

impl std::fmt::Debug for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::File(path) => f.debug_tuple("File").field(path).finish(),
            Self::Environment(_) => f.write_str("Environment"),
            Self::Default => f.write_str("Default"),
        }
    }
}

/// Configuration loader with support for multiple sources
#[derive(Debug, Default)]
pub struct ConfigLoader {
    sources: Vec<ConfigSource>,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_source(mut self, source: ConfigSource) -> Self {
        self.sources.push(source);
        self
    }

    pub fn with_file<P: AsRef<Path>>(self, path: P) -> Self {
        self.add_source(ConfigSource::File(path.as_ref().to_path_buf()))
    }

    /// Add the process environment
    pub fn with_env(self) -> Self {
        self.with_env_lookup(|name| std::env::var(name).ok())
    }

    /// Add environment variables read through `lookup`
    pub fn with_env_lookup<F>(self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        self.add_source(ConfigSource::Environment(Arc::new(lookup)))
    }

    pub fn with_defaults(self) -> Self {
        self.add_source(ConfigSource::Default)
    }

    /// Load configuration from all sources
    pub fn load(self) -> FoundryResult<FoundryConfig> {
        let mut config = FoundryConfig::default();

        for source in &self.sources {
            match source {
                ConfigSource::File(path) => {
                    tracing::debug!("Loading config from file: {}", path.display());
                    config.merge(load_from_file(path)?);
                }
                ConfigSource::Environment(lookup) => {
                    tracing::debug!("Loading config from environment");
                    apply_env(&mut config, lookup.as_ref())?;
                }
                ConfigSource::Default => {
                    tracing::debug!("Loading default config");
                    config.merge(FoundryConfig::default());
                }
            }
        }

        config.validate()?;
        Ok(config)
    }
}

/// Environment variables override single fields rather than whole sections
fn apply_env(config: &mut FoundryConfig, lookup: &(dyn Fn(&str) -> Option<String> + Send + Sync)) -> FoundryResult<()> {
    if let Some(level) = lookup("FOUNDRY_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Some(format) = lookup("FOUNDRY_LOG_FORMAT") {
        config.logging.format = format.parse()?;
    }
    if let Some(kind) = lookup("FOUNDRY_DISPLAY") {
        config.display.kind = kind.parse()?;
    }
    if let Some(no_exit) = lookup("FOUNDRY_NO_EXIT") {
        config.display.no_exit = parse_flag("FOUNDRY_NO_EXIT", &no_exit)?;
    }
    Ok(())
}

fn parse_flag(name: &str, value: &str) -> FoundryResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(FoundryError::config(format!("Invalid {} value: {}", name, value))),
    }
}
