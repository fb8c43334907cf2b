//! Constructor methods for FoundryError

use super::types::FoundryError;

impl FoundryError {
    /// Create a new configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            context: None,
        }
    }

    /// Create a configuration error with context
    pub fn config_with_context(message: impl Into<String>, context: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            context: Some(context.into()),
        }
    }

    /// Create a sandbox driver error
    pub fn sandbox(message: impl Into<String>) -> Self {
        Self::Sandbox {
            message: message.into(),
            sandbox: None,
            context: None,
        }
    }

    /// Create a sandbox driver error naming the sandbox
    pub fn sandbox_named(message: impl Into<String>, sandbox: impl Into<String>) -> Self {
        Self::Sandbox {
            message: message.into(),
            sandbox: Some(sandbox.into()),
            context: None,
        }
    }

    /// Create an IO error for a path
    pub fn io_with_path(message: impl Into<String>, path: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
            path: Some(path.into()),
            context: None,
        }
    }

    /// Create an invalid input error
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
            field: None,
            context: None,
        }
    }

    /// Create an invalid input error for a field
    pub fn invalid_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
            field: Some(field.into()),
            context: None,
        }
    }

    /// Create an action error
    pub fn action(action: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Action {
            action: action.into(),
            message: message.into(),
            context: None,
        }
    }

    /// Create a generic error
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
            context: None,
        }
    }
}
