//! Core error types and extension traits

use thiserror::Error;

/// Result type alias for Dataset Foundry operations
pub type FoundryResult<T> = Result<T, FoundryError>;

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error
    fn context<C: std::fmt::Display>(self, context: C) -> FoundryResult<T>;

    /// Add context lazily (only evaluated on error)
    fn with_context<C: std::fmt::Display, F: FnOnce() -> C>(self, f: F) -> FoundryResult<T>;
}

impl<T, E: std::fmt::Display> ResultExt<T> for Result<T, E> {
    fn context<C: std::fmt::Display>(self, context: C) -> FoundryResult<T> {
        self.map_err(|e| FoundryError::other(format!("{}: {}", context, e)))
    }

    fn with_context<C: std::fmt::Display, F: FnOnce() -> C>(self, f: F) -> FoundryResult<T> {
        self.map_err(|e| FoundryError::other(format!("{}: {}", f(), e)))
    }
}

/// Extension trait for adding context to Option types
pub trait OptionExt<T> {
    /// Convert Option to Result with context message
    fn context<C: std::fmt::Display>(self, context: C) -> FoundryResult<T>;

    /// Convert Option to Result with lazy context message
    fn with_context<C: std::fmt::Display, F: FnOnce() -> C>(self, f: F) -> FoundryResult<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn context<C: std::fmt::Display>(self, context: C) -> FoundryResult<T> {
        self.ok_or_else(|| FoundryError::other(context.to_string()))
    }

    fn with_context<C: std::fmt::Display, F: FnOnce() -> C>(self, f: F) -> FoundryResult<T> {
        self.ok_or_else(|| FoundryError::other(f().to_string()))
    }
}

/// Main error type for Dataset Foundry
#[derive(Error, Debug, Clone)]
pub enum FoundryError {
    /// Configuration related errors. Raised before any execution happens.
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        context: Option<String>,
    },

    /// The sandbox driver could not run the command at all
    #[error("Sandbox error: {message}")]
    Sandbox {
        message: String,
        sandbox: Option<String>,
        context: Option<String>,
    },

    /// IO errors
    #[error("IO error: {message}")]
    Io {
        message: String,
        path: Option<String>,
        context: Option<String>,
    },

    /// JSON serialization/deserialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        context: Option<String>,
    },

    /// Invalid input errors
    #[error("Invalid input: {message}")]
    InvalidInput {
        message: String,
        field: Option<String>,
        context: Option<String>,
    },

    /// An item action failed
    #[error("Action error: {action}: {message}")]
    Action {
        action: String,
        message: String,
        context: Option<String>,
    },

    /// Cooperative cancellation. Never a failure.
    #[error("Task was cancelled")]
    Cancelled,

    /// Generic error with context
    #[error("Error: {message}")]
    Other {
        message: String,
        context: Option<String>,
    },
}

impl FoundryError {
    /// Short, stable code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Config { .. } => "FOUNDRY_CONFIG",
            Self::Sandbox { .. } => "FOUNDRY_SANDBOX",
            Self::Io { .. } => "FOUNDRY_IO",
            Self::Json { .. } => "FOUNDRY_JSON",
            Self::InvalidInput { .. } => "FOUNDRY_INVALID_INPUT",
            Self::Action { .. } => "FOUNDRY_ACTION",
            Self::Cancelled => "FOUNDRY_CANCELLED",
            Self::Other { .. } => "FOUNDRY_OTHER",
        }
    }

    /// Optional context attached to the error
    pub fn context(&self) -> Option<&str> {
        match self {
            Self::Config { context, .. }
            | Self::Sandbox { context, .. }
            | Self::Io { context, .. }
            | Self::Json { context, .. }
            | Self::InvalidInput { context, .. }
            | Self::Action { context, .. }
            | Self::Other { context, .. } => context.as_deref(),
            Self::Cancelled => None,
        }
    }

    /// True when this error only records that the user asked to stop
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// True for configuration errors, which halt the run outright
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config { .. })
    }
}

impl From<std::io::Error> for FoundryError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: err.to_string(),
            path: None,
            context: None,
        }
    }
}

impl From<serde_json::Error> for FoundryError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json {
            message: err.to_string(),
            context: None,
        }
    }
}

impl From<anyhow::Error> for FoundryError {
    fn from(err: anyhow::Error) -> Self {
        Self::other(format!("{:#}", err))
    }
}
