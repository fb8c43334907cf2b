//! Running tests directly on the host

use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::parser::{PytestReportParser, TestReportParser};
use crate::error::{FoundryError, FoundryResult};
use crate::types::{CommandResult, UnitTestResult};

/// Runs a test file without a sandbox; no setup phase exists on this path
#[async_trait]
pub trait LocalTestRunner: Send + Sync {
    /// Returns [`FoundryError::Cancelled`] once `cancel` fires, after the
    /// test process has been killed.
    async fn run_tests(
        &self,
        path: &Path,
        cancel: &CancellationToken,
    ) -> FoundryResult<UnitTestResult>;
}

/// Runs `python -m pytest -v <file>` from the file's directory
#[derive(Debug, Clone)]
pub struct PytestRunner {
    python: String,
}

impl PytestRunner {
    pub fn new() -> Self {
        Self {
            python: "python".to_string(),
        }
    }

    pub fn with_python(mut self, python: impl Into<String>) -> Self {
        self.python = python.into();
        self
    }

    /// Working directory and command line for `path`.
    ///
    /// The test file is named relative to its own directory, which becomes
    /// the working directory.
    fn invocation<'a>(&self, path: &'a Path) -> (Option<&'a Path>, Vec<String>) {
        let dir = path.parent().filter(|dir| !dir.as_os_str().is_empty());
        let target = match (dir, path.file_name()) {
            (Some(_), Some(name)) => Path::new(name),
            _ => path,
        };
        let command = vec![
            self.python.clone(),
            "-m".to_string(),
            "pytest".to_string(),
            "-v".to_string(),
            target.display().to_string(),
        ];
        (dir, command)
    }
}

impl Default for PytestRunner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LocalTestRunner for PytestRunner {
    async fn run_tests(
        &self,
        path: &Path,
        cancel: &CancellationToken,
    ) -> FoundryResult<UnitTestResult> {
        let (dir, command) = self.invocation(path);
        info!(path = %path.display(), "Running tests locally");

        let mut cmd = Command::new(&command[0]);
        cmd.args(&command[1..])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = dir {
            cmd.current_dir(dir);
        }

        let output = tokio::select! {
            _ = cancel.cancelled() => {
                info!(path = %path.display(), "Local test run cancelled");
                return Err(FoundryError::Cancelled);
            }
            output = cmd.output() => output,
        };
        let output = output.map_err(|e| {
            FoundryError::io_with_path(
                format!("Failed to run {}: {}", self.python, e),
                path.display().to_string(),
            )
        })?;

        let result = CommandResult::new(
            command,
            output.status.code(),
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr),
        );
        Ok(PytestReportParser.parse(result))
    }
}
