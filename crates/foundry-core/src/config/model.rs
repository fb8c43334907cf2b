use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{FoundryError, FoundryResult};
use crate::sandbox::SandboxConfig;
use crate::supervisor::DEFAULT_CANCEL_DELAY;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FoundryConfig {
    pub logging: LoggingConfig,
    pub display: DisplayConfig,
    /// Sandboxes by name
    pub sandboxes: HashMap<String, SandboxConfig>,
    pub unit_tests: UnitTestDefaults,
}

impl FoundryConfig {
    /// Merge with another config; `other` wins where it says something
    pub fn merge(&mut self, other: FoundryConfig) {
        self.logging.merge(other.logging);
        self.display = other.display;
        self.sandboxes.extend(other.sandboxes);
        self.unit_tests = other.unit_tests;
    }

    pub fn validate(&self) -> FoundryResult<()> {
        tracing_subscriber::EnvFilter::try_new(&self.logging.level).map_err(|e| {
            FoundryError::config_with_context(
                format!("Invalid log level '{}': {}", self.logging.level, e),
                "Validating logging configuration",
            )
        })?;

        for (name, sandbox) in &self.sandboxes {
            if sandbox.image.trim().is_empty() {
                return Err(FoundryError::config_with_context(
                    format!("Sandbox '{}' has no image", name),
                    "Validating sandbox configuration",
                ));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Compact,
    Json,
}

impl FromStr for LogFormat {
    type Err = FoundryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "compact" => Ok(Self::Compact),
            "json" => Ok(Self::Json),
            other => Err(FoundryError::config(format!(
                "Unknown log format '{}' (expected pretty, compact or json)",
                other
            ))),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level or `EnvFilter` directive (trace, debug, info, warn, error)
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl LoggingConfig {
    pub fn merge(&mut self, other: LoggingConfig) {
        if !other.level.is_empty() {
            self.level = other.level;
        }
        self.format = other.format;
    }
}

/// Which display runs the session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayKind {
    #[default]
    Full,
    Plain,
}

impl fmt::Display for DisplayKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Full => f.write_str("full"),
            Self::Plain => f.write_str("plain"),
        }
    }
}

impl FromStr for DisplayKind {
    type Err = FoundryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "full" => Ok(Self::Full),
            "plain" => Ok(Self::Plain),
            other => Err(FoundryError::config(format!(
                "Unknown display '{}' (expected full or plain)",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub kind: DisplayKind,
    /// Keep the session open after the pipeline completes
    pub no_exit: bool,
    #[serde(with = "humantime_serde")]
    pub cancel_delay: Duration,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            kind: DisplayKind::default(),
            no_exit: false,
            cancel_delay: DEFAULT_CANCEL_DELAY,
        }
    }
}

/// Defaults for the unit test action when a run does not override them
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnitTestDefaults {
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
    pub stream_logs: bool,
}

impl Default for UnitTestDefaults {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(300),
            stream_logs: false,
        }
    }
}
