//! Sandboxed test execution
//!
//! A sandbox run produces one interleaved stdout/stderr pair that may carry a
//! marker-delimited setup phase ahead of the test run. [`split_stream`] finds
//! that phase in a single stream and [`reconcile`] turns a whole run into a
//! setup result and a test result.

mod config;
mod docker;
mod markers;
mod reconcile;

pub use config::SandboxConfig;
pub use docker::{DockerSandboxProvider, DockerSandboxRunner, build_entrypoint};
pub use markers::{SETUP_END_PATTERN, SETUP_START, SetupCode, StreamSplit, split_stream};
pub use reconcile::{PhaseResults, reconcile};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::error::{FoundryError, FoundryResult};

/// Exit code reported when the sandbox timeout expires
pub const TIMEOUT_EXIT_CODE: i32 = 124;

/// Raw outcome of one sandbox run, covering both setup and test phases
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SandboxResult {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl SandboxResult {
    pub fn new(exit_code: i32, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            exit_code,
            stdout: stdout.into(),
            stderr: stderr.into(),
        }
    }
}

/// Everything a sandbox needs to run one command against a workspace
#[derive(Debug, Clone)]
pub struct SandboxRequest {
    pub target_file: String,
    pub workspace_dir: PathBuf,
    pub command: Vec<String>,
    pub timeout: Duration,
    pub stream_logs: bool,
    /// Observed while waiting on the sandboxed process
    pub cancel: CancellationToken,
}

/// Errors raised by sandbox drivers. A failing command is not an error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SandboxError {
    /// No sandbox is configured under this name
    #[error("Unknown sandbox: {0}")]
    UnknownSandbox(String),

    /// Process spawn failed
    #[error("Failed to spawn sandboxed process: {0}")]
    SpawnFailed(String),

    /// The run was cancelled; resources were released before returning
    #[error("Sandbox run cancelled")]
    Cancelled,

    /// Internal error
    #[error("Sandbox internal error: {0}")]
    Internal(String),
}

impl From<SandboxError> for FoundryError {
    fn from(err: SandboxError) -> Self {
        match err {
            SandboxError::Cancelled => FoundryError::Cancelled,
            SandboxError::UnknownSandbox(name) => {
                FoundryError::config(format!("Unknown sandbox: {}", name))
            }
            other => FoundryError::sandbox(other.to_string()),
        }
    }
}

/// Runs a command inside an isolated environment
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SandboxRunner: Send + Sync {
    /// Run the request to completion, timeout or cancellation.
    ///
    /// Implementations must release everything they started before returning,
    /// whichever way the run ends.
    async fn run(&self, request: SandboxRequest) -> Result<SandboxResult, SandboxError>;
}

/// Resolves sandbox names to runners
pub trait SandboxProvider: Send + Sync {
    fn runner(&self, name: &str) -> FoundryResult<Arc<dyn SandboxRunner>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sandbox_error_conversion() {
        let err: FoundryError = SandboxError::Cancelled.into();
        assert!(err.is_cancelled());

        let err: FoundryError = SandboxError::UnknownSandbox("py311".into()).into();
        assert!(err.is_config());
        assert!(err.to_string().contains("py311"));

        let err: FoundryError = SandboxError::SpawnFailed("docker not found".into()).into();
        assert_eq!(err.error_code(), "FOUNDRY_SANDBOX");
    }
}
