//! Displays: the user-facing shells a pipeline session runs in
//!
//! - [`PlainDisplay`] logs to stderr and returns when the pipeline finishes
//! - [`FullDisplay`] renders pipeline progress and a console view of the log

mod full;
mod plain;
mod surface;

pub use full::FullDisplay;
pub use plain::PlainDisplay;
pub use surface::{Progress, TerminalSurface};

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use crate::config::{DisplayConfig, DisplayKind, LogFormat};
use crate::error::{FoundryError, FoundryResult};
use crate::pipeline::{Pipeline, PipelineParams};
use crate::supervisor::SessionOutcome;

/// A shell a pipeline session runs in
#[async_trait]
pub trait Display: Send + Sync {
    /// Install the global tracing subscriber for this display
    fn setup_logging(&self, level: &str) -> FoundryResult<()>;

    /// Sender for quit requests, e.g. from a signal handler
    fn quit_handle(&self) -> mpsc::Sender<()>;

    /// Run one session. A display runs at most one session.
    async fn run_pipeline(
        &self,
        pipeline: Arc<dyn Pipeline>,
        params: PipelineParams,
    ) -> FoundryResult<SessionOutcome>;
}

/// Create the display selected by `config`
pub fn create_display(config: &DisplayConfig, format: LogFormat) -> Box<dyn Display> {
    match config.kind {
        DisplayKind::Full => Box::new(FullDisplay::new(config.clone())),
        DisplayKind::Plain => Box::new(PlainDisplay::new(config.clone()).with_format(format)),
    }
}

/// `RUST_LOG` when set, otherwise `level`
pub(crate) fn env_filter(level: &str) -> FoundryResult<EnvFilter> {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .map_err(|e| FoundryError::config(format!("Invalid log level '{}': {}", level, e)))
}

/// Quit request channel owned by a display
#[derive(Debug)]
pub(crate) struct QuitChannel {
    sender: mpsc::Sender<()>,
    receiver: Mutex<Option<mpsc::Receiver<()>>>,
}

impl QuitChannel {
    pub(crate) fn new() -> Self {
        let (sender, receiver) = mpsc::channel(8);
        Self {
            sender,
            receiver: Mutex::new(Some(receiver)),
        }
    }

    pub(crate) fn sender(&self) -> mpsc::Sender<()> {
        self.sender.clone()
    }

    pub(crate) fn take_receiver(&self) -> FoundryResult<mpsc::Receiver<()>> {
        self.receiver
            .lock()
            .take()
            .ok_or_else(|| FoundryError::invalid_input("Display session already started"))
    }
}

/// Whether the session stays open after completion: `no_exit` in the run
/// parameters wins over the display configuration
pub(crate) fn keep_open(params: &PipelineParams, config: &DisplayConfig) -> bool {
    params
        .get("no_exit")
        .and_then(serde_json::Value::as_bool)
        .unwrap_or(config.no_exit)
}
