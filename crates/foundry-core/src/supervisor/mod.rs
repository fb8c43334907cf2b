//! Supervision of one interactive pipeline session
//!
//! The pipeline runs as a background task. Quit requests arrive over an mpsc
//! channel; the first one while running shows a cleanup notice, waits a short
//! delay so the notice can render, then signals cancellation and waits for the
//! task to unwind. Later quit requests are ignored until the session exits.

mod state;


pub use state::{
    CLEANUP_NOTICE, DEFAULT_CANCEL_DELAY, Effect, SupervisorEvent, SupervisorMachine, SupervisorOptions,
    SupervisorState, View, transition,
};

use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinHandle};
use tokio::time::Sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::error::{FoundryError, FoundryResult};
use crate::events::EventBus;
use crate::pipeline::{Pipeline, PipelineParams, PipelineReport};

/// Where the session shows itself to the user
pub trait SessionSurface: Send + Sync {
    fn show_notice(&self, notice: &str);

    fn select_view(&self, view: View);
}

/// How a session ended
#[derive(Debug)]
pub struct SessionOutcome {
    pub final_state: SupervisorState,
    /// The pipeline stopped because the user asked it to
    pub cancelled: bool,
    pub report: Option<PipelineReport>,
    /// A pipeline failure; cancellation is never reported here
    pub error: Option<FoundryError>,
}

impl SessionOutcome {
    /// Convert into the pipeline's own result
    pub fn into_result(self) -> FoundryResult<Option<PipelineReport>> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self.report),
        }
    }
}

enum Wake {
    Quit,
    QuitClosed,
    DelayElapsed,
    Finished(Result<FoundryResult<PipelineReport>, JoinError>),
    Stalled,
}

/// Drives [`SupervisorMachine`] for one pipeline run
pub struct PipelineSupervisor {
    surface: Arc<dyn SessionSurface>,
    options: SupervisorOptions,
}

impl PipelineSupervisor {
    pub fn new(surface: Arc<dyn SessionSurface>, options: SupervisorOptions) -> Self {
        Self { surface, options }
    }

    /// Run the session until it exits.
    ///
    /// Returns only after the pipeline task has finished, so any cleanup the
    /// pipeline performs on cancellation is complete by then.
    pub async fn run(
        &self,
        pipeline: Arc<dyn Pipeline>,
        params: PipelineParams,
        events: EventBus,
        mut quit: mpsc::Receiver<()>,
    ) -> SessionOutcome {
        let mut machine = SupervisorMachine::new(self.options);
        let cancel = CancellationToken::new();
        let mut task: Option<JoinHandle<FoundryResult<PipelineReport>>> = None;
        let mut delay: Option<Pin<Box<Sleep>>> = None;
        let mut quit_open = true;

        let mut outcome = SessionOutcome {
            final_state: SupervisorState::Idle,
            cancelled: false,
            report: None,
            error: None,
        };

        let mut effects = machine.handle(SupervisorEvent::Start);
        loop {
            let mut exit = false;
            for effect in effects.drain(..) {
                match effect {
                    Effect::SpawnPipeline => {
                        let pipeline = pipeline.clone();
                        let params = params.clone();
                        let events = events.clone();
                        let cancel = cancel.clone();
                        info!(pipeline = pipeline.name(), "Starting pipeline task");
                        task = Some(tokio::spawn(async move {
                            pipeline.run(&params, &events, cancel).await
                        }));
                    }
                    Effect::ShowNotice(notice) => self.surface.show_notice(notice),
                    Effect::SelectView(view) => self.surface.select_view(view),
                    Effect::ScheduleCancel(after) => delay = Some(Box::pin(tokio::time::sleep(after))),
                    Effect::SignalCancel => {
                        debug!("Signalling pipeline cancellation");
                        cancel.cancel();
                    }
                    Effect::Exit => exit = true,
                }
            }
            if exit {
                break;
            }

            let wake = tokio::select! {
                joined = join(&mut task), if task.is_some() => Wake::Finished(joined),
                _ = wait(&mut delay), if delay.is_some() => Wake::DelayElapsed,
                request = quit.recv(), if quit_open => match request {
                    Some(()) => Wake::Quit,
                    None => Wake::QuitClosed,
                },
                else => Wake::Stalled,
            };

            effects = match wake {
                Wake::Quit => {
                    info!(state = %machine.state(), "Quit requested");
                    machine.handle(SupervisorEvent::QuitRequested)
                }
                Wake::QuitClosed => {
                    debug!("Quit source closed");
                    quit_open = false;
                    Vec::new()
                }
                Wake::DelayElapsed => {
                    delay = None;
                    machine.handle(SupervisorEvent::CancelDelayElapsed)
                }
                Wake::Finished(joined) => {
                    task = None;
                    delay = None;
                    record(&mut outcome, joined);
                    machine.handle(SupervisorEvent::TaskFinished)
                }
                // Nothing left to wait for: the task is done and no more quit requests can come
                Wake::Stalled if machine.state() == SupervisorState::Completed => {
                    machine.handle(SupervisorEvent::QuitRequested)
                }
                Wake::Stalled => break,
            };
        }

        outcome.final_state = machine.state();
        outcome
    }
}

async fn join(
    task: &mut Option<JoinHandle<FoundryResult<PipelineReport>>>,
) -> Result<FoundryResult<PipelineReport>, JoinError> {
    match task.as_mut() {
        Some(handle) => handle.await,
        None => std::future::pending().await,
    }
}

async fn wait(delay: &mut Option<Pin<Box<Sleep>>>) {
    match delay.as_mut() {
        Some(sleep) => sleep.as_mut().await,
        None => std::future::pending().await,
    }
}

fn record(outcome: &mut SessionOutcome, joined: Result<FoundryResult<PipelineReport>, JoinError>) {
    match joined {
        Ok(Ok(report)) => outcome.report = Some(report),
        Ok(Err(e)) if e.is_cancelled() => {
            info!("Pipeline cancelled");
            outcome.cancelled = true;
        }
        Ok(Err(e)) => {
            error!("Pipeline failed: {}", e);
            outcome.error = Some(e);
        }
        Err(e) => {
            error!("Pipeline task aborted: {}", e);
            outcome.error = Some(FoundryError::other(format!("Pipeline task aborted: {}", e)));
        }
    }
}

/// A surface that only logs
#[derive(Debug, Default)]
pub struct LogSurface;

impl SessionSurface for LogSurface {
    fn show_notice(&self, notice: &str) {
        tracing::warn!("{}", notice);
    }

    fn select_view(&self, _view: View) {}
}
