use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use super::{Display, QuitChannel, env_filter};
use crate::config::{DisplayConfig, LogFormat};
use crate::error::FoundryResult;
use crate::events::EventBus;
use crate::pipeline::{Pipeline, PipelineParams};
use crate::supervisor::{LogSurface, PipelineSupervisor, SessionOutcome, SupervisorOptions};

/// Logs to stderr and returns as soon as the pipeline finishes
#[derive(Debug)]
pub struct PlainDisplay {
    config: DisplayConfig,
    format: LogFormat,
    quit: QuitChannel,
}

impl PlainDisplay {
    pub fn new(config: DisplayConfig) -> Self {
        Self {
            config,
            format: LogFormat::default(),
            quit: QuitChannel::new(),
        }
    }

    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }
}

#[async_trait]
impl Display for PlainDisplay {
    fn setup_logging(&self, level: &str) -> FoundryResult<()> {
        let filter = env_filter(level)?;
        let builder = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr);

        let installed = match self.format {
            LogFormat::Pretty => builder.pretty().try_init(),
            LogFormat::Compact => builder.compact().try_init(),
            LogFormat::Json => builder.json().try_init(),
        };
        if let Err(e) = installed {
            tracing::debug!("Logging already initialised: {}", e);
        }
        Ok(())
    }

    fn quit_handle(&self) -> mpsc::Sender<()> {
        self.quit.sender()
    }

    async fn run_pipeline(
        &self,
        pipeline: Arc<dyn Pipeline>,
        params: PipelineParams,
    ) -> FoundryResult<SessionOutcome> {
        let quit = self.quit.take_receiver()?;
        tracing::debug!(display = "plain", kind = %self.config.kind, "Starting session");

        // Nothing needs to render before cancellation
        let supervisor = PipelineSupervisor::new(
            Arc::new(LogSurface),
            SupervisorOptions {
                keep_open: false,
                cancel_delay: Duration::ZERO,
            },
        );
        Ok(supervisor
            .run(pipeline, params, EventBus::default(), quit)
            .await)
    }
}
