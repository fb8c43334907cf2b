use serde::{Deserialize, Serialize};
use std::fmt;

use super::CommandResult;

/// Test-phase outcome: a command result plus pass/fail counts.
///
/// The counts only mean something when `returncode` is present. A result with
/// no return code and zero counts is the "tests never ran" shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitTestResult {
    pub command: Vec<String>,
    pub returncode: Option<i32>,
    pub stdout: String,
    #[serde(default)]
    pub stderr: String,
    pub num_passed: u32,
    pub num_failed: u32,
}

impl UnitTestResult {
    /// Attach pass/fail counts to a finished command
    pub fn from_command(result: CommandResult, num_passed: u32, num_failed: u32) -> Self {
        Self {
            command: result.command,
            returncode: result.returncode,
            stdout: result.stdout,
            stderr: result.stderr,
            num_passed,
            num_failed,
        }
    }

    /// Result for a test phase that never started
    pub fn not_run(command: Vec<String>, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            command,
            returncode: None,
            stdout: stdout.into(),
            stderr: stderr.into(),
            num_passed: 0,
            num_failed: 0,
        }
    }

    pub fn success(&self) -> bool {
        self.returncode == Some(0)
    }

    /// Whether the test runner actually executed
    pub fn ran(&self) -> bool {
        self.returncode.is_some()
    }

    pub fn num_tests(&self) -> u32 {
        self.num_passed + self.num_failed
    }

    pub fn as_command_result(&self) -> CommandResult {
        CommandResult {
            command: self.command.clone(),
            returncode: self.returncode,
            stdout: self.stdout.clone(),
            stderr: self.stderr.clone(),
        }
    }
}

impl fmt::Display for UnitTestResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.ran() {
            return write!(f, "NOT RUN {}", self.as_command_result());
        }
        write!(
            f,
            "{} passed, {} failed: {}",
            self.num_passed,
            self.num_failed,
            self.as_command_result()
        )
    }
}
