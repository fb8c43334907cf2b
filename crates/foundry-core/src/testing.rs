//! Shared fixtures for unit tests

use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::dataset::{Context, Services};
use crate::error::{FoundryError, FoundryResult};
use crate::sandbox::{SandboxProvider, SandboxRunner};
use crate::types::UnitTestResult;
use crate::unit_tests::{LocalTestRunner, PytestReportParser};

pub(crate) struct NoSandboxes;

impl SandboxProvider for NoSandboxes {
    fn runner(&self, name: &str) -> FoundryResult<Arc<dyn SandboxRunner>> {
        Err(FoundryError::config(format!("Unknown sandbox '{}'", name)))
    }
}

/// Returns a canned result and remembers the last path it was asked to run
#[derive(Default)]
pub(crate) struct CannedLocalRunner {
    pub last_path: parking_lot::Mutex<Option<std::path::PathBuf>>,
}

#[async_trait]
impl LocalTestRunner for CannedLocalRunner {
    async fn run_tests(
        &self,
        path: &Path,
        _cancel: &CancellationToken,
    ) -> FoundryResult<UnitTestResult> {
        *self.last_path.lock() = Some(path.to_path_buf());
        Ok(UnitTestResult {
            command: vec!["python".into(), "-m".into(), "pytest".into(), "-v".into()],
            returncode: Some(0),
            stdout: "2 passed".into(),
            stderr: String::new(),
            num_passed: 2,
            num_failed: 0,
        })
    }
}

pub(crate) fn services_with(
    sandboxes: Arc<dyn SandboxProvider>,
    local_runner: Arc<dyn LocalTestRunner>,
) -> Services {
    Services {
        sandboxes,
        local_runner,
        report_parser: Arc::new(PytestReportParser),
    }
}

pub(crate) fn test_context() -> Context {
    Context::new(
        "/data/input",
        services_with(Arc::new(NoSandboxes), Arc::new(CannedLocalRunner::default())),
    )
}
