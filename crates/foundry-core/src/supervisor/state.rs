//! Session lifecycle as a pure state machine
//!
//! ```text
//! Idle -> Running -> Completed
//!                 -> CancelRequested -> CleaningUp -> Exited
//! ```
//!
//! [`transition`] performs no I/O. The driver in the parent module turns the
//! returned [`Effect`]s into actions.

use std::fmt;
use std::time::Duration;

/// Shown while a cancelled pipeline unwinds
pub const CLEANUP_NOTICE: &str =
    "Shutting down sandbox containers... Please wait for cleanup to complete.";

/// Default pause between showing the notice and signalling cancellation
pub const DEFAULT_CANCEL_DELAY: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorState {
    Idle,
    Running,
    Completed,
    CancelRequested,
    CleaningUp,
    Exited,
}

impl fmt::Display for SupervisorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::CancelRequested => "cancel_requested",
            Self::CleaningUp => "cleaning_up",
            Self::Exited => "exited",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorEvent {
    Start,
    QuitRequested,
    CancelDelayElapsed,
    /// The pipeline task returned, however it ended
    TaskFinished,
}

/// Which view the session surface shows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Pipeline,
    Console,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    SpawnPipeline,
    ShowNotice(&'static str),
    SelectView(View),
    ScheduleCancel(Duration),
    SignalCancel,
    Exit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SupervisorOptions {
    /// Stay open after the pipeline completes until the user quits
    pub keep_open: bool,
    pub cancel_delay: Duration,
}

impl Default for SupervisorOptions {
    fn default() -> Self {
        Self {
            keep_open: false,
            cancel_delay: DEFAULT_CANCEL_DELAY,
        }
    }
}

/// Compute the next state and the effects to perform.
///
/// Events that make no sense in a state leave it unchanged with no effects;
/// this is what makes repeated quit requests idempotent.
pub fn transition(
    state: SupervisorState,
    event: SupervisorEvent,
    options: &SupervisorOptions,
) -> (SupervisorState, Vec<Effect>) {
    use SupervisorEvent as Ev;
    use SupervisorState as St;

    match (state, event) {
        (St::Idle, Ev::Start) => (St::Running, vec![Effect::SpawnPipeline]),
        (St::Idle, Ev::QuitRequested) => (St::Exited, vec![Effect::Exit]),

        (St::Running, Ev::TaskFinished) if options.keep_open => (St::Completed, vec![]),
        (St::Running, Ev::TaskFinished) => (St::Completed, vec![Effect::Exit]),
        (St::Running, Ev::QuitRequested) => (
            St::CancelRequested,
            vec![
                Effect::ShowNotice(CLEANUP_NOTICE),
                Effect::SelectView(View::Console),
                Effect::ScheduleCancel(options.cancel_delay),
            ],
        ),

        (St::Completed, Ev::QuitRequested) => (St::Exited, vec![Effect::Exit]),

        (St::CancelRequested, Ev::CancelDelayElapsed) => (St::CleaningUp, vec![Effect::SignalCancel]),
        // Finished on its own before cancellation was signalled
        (St::CancelRequested, Ev::TaskFinished) => (St::Exited, vec![Effect::Exit]),

        (St::CleaningUp, Ev::TaskFinished) => (St::Exited, vec![Effect::Exit]),

        (St::Exited, Ev::QuitRequested) => (St::Exited, vec![Effect::Exit]),

        (state, _) => (state, vec![]),
    }
}

/// A [`transition`] driver that remembers the current state
#[derive(Debug, Clone)]
pub struct SupervisorMachine {
    state: SupervisorState,
    options: SupervisorOptions,
}

impl SupervisorMachine {
    pub fn new(options: SupervisorOptions) -> Self {
        Self {
            state: SupervisorState::Idle,
            options,
        }
    }

    pub fn state(&self) -> SupervisorState {
        self.state
    }

    pub fn handle(&mut self, event: SupervisorEvent) -> Vec<Effect> {
        let (next, effects) = transition(self.state, event, &self.options);
        if next != self.state {
            tracing::debug!(from = %self.state, to = %next, ?event, "Supervisor transition");
        }
        self.state = next;
        effects
    }
}
