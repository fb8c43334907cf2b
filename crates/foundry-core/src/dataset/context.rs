use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::sandbox::SandboxProvider;
use crate::unit_tests::{LocalTestRunner, TestReportParser};

/// Collaborators actions call out to
#[derive(Clone)]
pub struct Services {
    pub sandboxes: Arc<dyn SandboxProvider>,
    pub local_runner: Arc<dyn LocalTestRunner>,
    pub report_parser: Arc<dyn TestReportParser>,
}

impl std::fmt::Debug for Services {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Services").finish_non_exhaustive()
    }
}

/// Shared state for one pipeline run
#[derive(Debug, Clone)]
pub struct Context {
    input_dir: PathBuf,
    output_dir: PathBuf,
    values: Map<String, Value>,
    cancel: CancellationToken,
    services: Services,
}

impl Context {
    pub fn new(input_dir: impl Into<PathBuf>, services: Services) -> Self {
        let input_dir = input_dir.into();
        Self {
            output_dir: input_dir.clone(),
            input_dir,
            values: Map::new(),
            cancel: CancellationToken::new(),
            services,
        }
    }

    pub fn with_output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.output_dir = output_dir.into();
        self
    }

    pub fn with_value(mut self, key: impl Into<String>, value: Value) -> Self {
        self.values.insert(key.into(), value);
        self
    }

    /// Replace the cancellation token, typically with the pipeline's own
    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn input_dir(&self) -> &Path {
        &self.input_dir
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Look up a context value; `input_dir` and `output_dir` are built in
    pub fn value(&self, name: &str) -> Option<Value> {
        match name {
            "input_dir" => Some(Value::String(self.input_dir.display().to_string())),
            "output_dir" => Some(Value::String(self.output_dir.display().to_string())),
            _ => self.values.get(name).cloned(),
        }
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn services(&self) -> &Services {
        &self.services
    }
}
