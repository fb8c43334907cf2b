use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of running one command, or one phase of a sandboxed run.
///
/// `returncode` is `None` when the command never completed (or, for the test
/// phase, never started). It must never be read as success.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandResult {
    pub command: Vec<String>,
    pub returncode: Option<i32>,
    pub stdout: String,
    #[serde(default)]
    pub stderr: String,
}

impl CommandResult {
    pub fn new(
        command: Vec<String>,
        returncode: Option<i32>,
        stdout: impl Into<String>,
        stderr: impl Into<String>,
    ) -> Self {
        Self {
            command,
            returncode,
            stdout: stdout.into(),
            stderr: stderr.into(),
        }
    }

    /// True iff the return code is exactly zero
    pub fn success(&self) -> bool {
        self.returncode == Some(0)
    }
}

impl fmt::Display for CommandResult {
    /// `SUCCESS` or `FAILED (code: .., stderr: ..)`. With DEBUG logging enabled
    /// the code and stdout are shown for successful runs as well.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let debugging = tracing::enabled!(tracing::Level::DEBUG);
        let include_error = debugging || !self.success();

        f.write_str(if self.success() { "SUCCESS" } else { "FAILED" })?;
        if !include_error {
            return Ok(());
        }

        match self.returncode {
            Some(code) => write!(f, " (code: {}", code)?,
            None => f.write_str(" (code: none")?,
        }
        if !self.stderr.is_empty() {
            write!(f, ", stderr: {}", self.stderr)?;
        }
        if debugging && !self.stdout.is_empty() {
            write!(f, ", stdout: {}", self.stdout)?;
        }
        f.write_str(")")
    }
}
