//! Reconciliation of one sandbox run into setup and test results

use super::SandboxResult;
use super::markers::{SetupCode, split_stream};
use crate::types::CommandResult;

/// Setup and test phase results derived from a single sandbox run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseResults {
    pub test: CommandResult,
    pub setup: CommandResult,
}

impl PhaseResults {
    /// Whether a setup phase was observed (or the run's failure was attributed to it)
    pub fn setup_detected(&self) -> bool {
        self.setup.returncode.is_some()
    }

    /// Whether the test phase produced a usable return code
    pub fn tests_ran(&self) -> bool {
        self.test.returncode.is_some()
    }
}

/// Derive the setup and test results from a sandbox run.
///
/// A setup code found on stdout takes precedence over one found on stderr.
/// When setup never finished, or neither stream has any test output, the test
/// phase is considered not to have run: its return code is absent and the
/// run's exit code is attributed to setup.
pub fn reconcile(sandbox: &SandboxResult) -> PhaseResults {
    let out = split_stream(&sandbox.stdout);
    let err = split_stream(&sandbox.stderr);

    let mut setup_code = out.setup_code.or(err.setup_code).map(SetupCode::as_i32);
    let mut test_code = Some(sandbox.exit_code);

    let incomplete = out.setup_code.or(err.setup_code) == Some(SetupCode::Incomplete);
    if incomplete || (out.test.is_empty() && err.test.is_empty()) {
        tracing::debug!(
            exit_code = sandbox.exit_code,
            incomplete,
            "Test phase did not run; attributing exit code to setup"
        );
        setup_code = Some(sandbox.exit_code);
        test_code = None;
    }

    PhaseResults {
        test: CommandResult::new(Vec::new(), test_code, out.test, err.test),
        setup: CommandResult::new(Vec::new(), setup_code, out.setup, err.setup),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setup_then_tests() {
        let phases = reconcile(&SandboxResult::new(
            0,
            "::setup:start::\nbuilding\n::setup:end:0::\n1 passed",
            "",
        ));
        assert_eq!(phases.setup.returncode, Some(0));
        assert_eq!(phases.setup.stdout, "building");
        assert_eq!(phases.test.returncode, Some(0));
        assert_eq!(phases.test.stdout, "1 passed");
        assert!(phases.setup_detected());
    }

    #[test]
    fn test_setup_crash_promoted() {
        let phases = reconcile(&SandboxResult::new(137, "::setup:start::\ninstalling deps...", ""));
        assert_eq!(phases.setup.returncode, Some(137));
        assert_eq!(phases.setup.stdout, "installing deps...");
        assert_eq!(phases.test.returncode, None);
        assert_eq!(phases.test.stdout, "");
        assert!(!phases.tests_ran());
    }

    #[test]
    fn test_no_markers() {
        let phases = reconcile(&SandboxResult::new(1, "3 passed, 1 failed", ""));
        assert_eq!(phases.setup.returncode, None);
        assert_eq!(phases.setup.stdout, "");
        assert_eq!(phases.test.returncode, Some(1));
        assert_eq!(phases.test.stdout, "3 passed, 1 failed");
        assert!(!phases.setup_detected());
    }

    #[test]
    fn test_empty_test_output_attributed_to_setup() {
        // Setup reported success but nothing followed on either stream
        let phases = reconcile(&SandboxResult::new(
            3,
            "::setup:start::\nok\n::setup:end:0::\n",
            "::setup:start::\nwarn\n::setup:end:5::\n",
        ));
        assert_eq!(phases.setup.returncode, Some(3));
        assert_eq!(phases.test.returncode, None);
    }

    #[test]
    fn test_stdout_setup_code_wins() {
        let phases = reconcile(&SandboxResult::new(
            0,
            "::setup:start::\na\n::setup:end:4::\nout",
            "::setup:start::\nb\n::setup:end:9::\nerr",
        ));
        assert_eq!(phases.setup.returncode, Some(4));
        assert_eq!(phases.setup.stdout, "a");
        assert_eq!(phases.setup.stderr, "b");
        assert_eq!(phases.test.stdout, "out");
        assert_eq!(phases.test.stderr, "err");
    }

    #[test]
    fn test_stderr_setup_code_used_when_stdout_has_none() {
        let phases = reconcile(&SandboxResult::new(
            1,
            "collected 2 items\n1 passed, 1 failed",
            "::setup:start::\nwarming cache\n::setup:end:0::\n",
        ));
        assert_eq!(phases.setup.returncode, Some(0));
        assert_eq!(phases.setup.stderr, "warming cache");
        assert_eq!(phases.test.returncode, Some(1));
    }

    #[test]
    fn test_incomplete_on_stderr_promotes() {
        let phases = reconcile(&SandboxResult::new(
            2,
            "some test output",
            "::setup:start::\nsegfault",
        ));
        assert_eq!(phases.setup.returncode, Some(2));
        assert_eq!(phases.test.returncode, None);
        assert_eq!(phases.test.stdout, "some test output");
    }

    #[test]
    fn test_silent_run_indistinguishable_from_setup_crash() {
        let phases = reconcile(&SandboxResult::new(0, "", ""));
        assert_eq!(phases.setup.returncode, Some(0));
        assert_eq!(phases.test.returncode, None);
    }

    #[test]
    fn test_timeout_exit_code_is_just_a_failure() {
        let phases = reconcile(&SandboxResult::new(
            crate::sandbox::TIMEOUT_EXIT_CODE,
            "test_slow.py::test_a PASSED",
            "timed out",
        ));
        assert_eq!(phases.test.returncode, Some(124));
    }
}
