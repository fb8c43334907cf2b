use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use super::surface::TerminalSurface;
use super::{Display, QuitChannel, env_filter, keep_open};
use crate::config::DisplayConfig;
use crate::console::ConsoleLog;
use crate::error::FoundryResult;
use crate::events::{EventBus, FilteredSubscriber, PipelineEvent};
use crate::pipeline::{Pipeline, PipelineParams};
use crate::supervisor::{PipelineSupervisor, SessionOutcome, SupervisorOptions};

const RENDER_INTERVAL: Duration = Duration::from_millis(50);

/// Interactive display with a pipeline view and a console view.
///
/// Log output goes to the session's [`ConsoleLog`] rather than straight to
/// the terminal; the console view shows it. The view switches to the
/// pipeline when it starts and to the console when the user quits.
pub struct FullDisplay {
    config: DisplayConfig,
    console: ConsoleLog,
    quit: QuitChannel,
    surface: Arc<TerminalSurface>,
}

impl FullDisplay {
    pub fn new(config: DisplayConfig) -> Self {
        let console = ConsoleLog::new();
        let surface = Arc::new(TerminalSurface::new(console.clone()));
        Self::with_surface(config, console, surface)
    }

    pub fn with_surface(config: DisplayConfig, console: ConsoleLog, surface: Arc<TerminalSurface>) -> Self {
        Self {
            config,
            console,
            quit: QuitChannel::new(),
            surface,
        }
    }

    pub fn console(&self) -> &ConsoleLog {
        &self.console
    }
}

/// Follow pipeline events until the session's bus closes, redrawing periodically
async fn render_loop(surface: Arc<TerminalSurface>, mut events: FilteredSubscriber) {
    let mut tick = tokio::time::interval(RENDER_INTERVAL);
    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(event) => {
                    if matches!(event, PipelineEvent::PipelineStarted { .. }) {
                        surface.pipeline_started();
                    }
                    surface.record(&event);
                }
                Err(_) => break,
            },
            _ = tick.tick() => surface.render(),
        }
    }
}

#[async_trait]
impl Display for FullDisplay {
    fn setup_logging(&self, level: &str) -> FoundryResult<()> {
        let filter = env_filter(level)?;
        let console = self.console.clone();
        let installed = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(move || console.writer())
            .try_init();
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
        let options = SupervisorOptions {
            keep_open: keep_open(&params, &self.config),
            cancel_delay: self.config.cancel_delay,
        };

        let events = EventBus::default();
        let subscriber = FilteredSubscriber::new(
            &events,
            vec!["pipeline_started", "item_started", "item_finished"],
        );
        let renderer = tokio::spawn(render_loop(self.surface.clone(), subscriber));

        let supervisor = PipelineSupervisor::new(self.surface.clone(), options);
        let outcome = supervisor.run(pipeline, params, events, quit).await;

        // The bus is gone once the session is over, which ends the renderer
        if let Err(e) = renderer.await {
            tracing::warn!("Renderer stopped abnormally: {}", e);
        }
        self.surface.render();
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::surface::tests::SharedBuffer;
    use crate::error::FoundryError;
    use crate::pipeline::PipelineReport;
    use crate::supervisor::{CLEANUP_NOTICE, SupervisorState};
    use serde_json::json;
    use tokio_util::sync::CancellationToken;

    struct OneItem {
        wait_for_cancel: bool,
    }

    #[async_trait]
    impl Pipeline for OneItem {
        fn name(&self) -> &str {
            "one_item"
        }

        async fn run(
            &self,
            _params: &PipelineParams,
            events: &EventBus,
            cancel: CancellationToken,
        ) -> FoundryResult<PipelineReport> {
            events.publish(PipelineEvent::pipeline_started("one_item"));
            events.publish(PipelineEvent::item_started("a"));
            if self.wait_for_cancel {
                cancel.cancelled().await;
                return Err(FoundryError::Cancelled);
            }
            events.publish(PipelineEvent::item_finished("a", true));
            Ok(PipelineReport {
                name: "one_item".into(),
                items: 1,
                failures: vec![],
            })
        }
    }

    fn display(config: DisplayConfig) -> (FullDisplay, SharedBuffer) {
        let console = ConsoleLog::new();
        let out = SharedBuffer::default();
        let surface = Arc::new(TerminalSurface::with_output(console.clone(), Box::new(out.clone())));
        (FullDisplay::with_surface(config, console, surface), out)
    }

    #[tokio::test(start_paused = true)]
    async fn test_completed_run_shows_pipeline_view() {
        let (display, out) = display(DisplayConfig::default());

        let outcome = display
            .run_pipeline(Arc::new(OneItem { wait_for_cancel: false }), PipelineParams::new())
            .await
            .unwrap();

        assert_eq!(outcome.final_state, SupervisorState::Completed);
        assert_eq!(outcome.report.unwrap().items, 1);
        assert!(out.text().contains("== Pipeline =="));
    }

    #[tokio::test(start_paused = true)]
    async fn test_quit_switches_to_console_with_notice() {
        let (display, out) = display(DisplayConfig::default());
        display.console().append("INFO running tests");
        display.quit_handle().send(()).await.unwrap();

        let outcome = display
            .run_pipeline(Arc::new(OneItem { wait_for_cancel: true }), PipelineParams::new())
            .await
            .unwrap();

        assert!(outcome.cancelled);
        assert_eq!(outcome.final_state, SupervisorState::Exited);
        let text = out.text();
        assert!(text.contains(CLEANUP_NOTICE));
        assert!(text.contains("== Console =="));
        assert!(text.contains("INFO running tests"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_exit_param_keeps_session_open() {
        let (display, _out) = display(DisplayConfig::default());
        let quit = display.quit_handle();
        let mut params = PipelineParams::new();
        params.insert("no_exit".into(), json!(true));

        let session = display.run_pipeline(Arc::new(OneItem { wait_for_cancel: false }), params);
        tokio::pin!(session);
        assert!(
            tokio::time::timeout(Duration::from_secs(5), &mut session)
                .await
                .is_err()
        );

        quit.send(()).await.unwrap();
        let outcome = session.await.unwrap();
        assert_eq!(outcome.final_state, SupervisorState::Exited);
        assert!(!outcome.cancelled);
    }
}
