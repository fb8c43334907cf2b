//! Terminal rendering for the full display

use console::style;
use parking_lot::Mutex;
use std::io::{self, Write};

use crate::console::ConsoleLog;
use crate::events::PipelineEvent;
use crate::supervisor::{SessionSurface, View};

/// Item counts shown in the pipeline view
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Progress {
    pub started: usize,
    pub finished: usize,
    pub failed: usize,
}

impl Progress {
    pub fn running(&self) -> usize {
        self.started.saturating_sub(self.finished)
    }
}

struct SurfaceState {
    view: Option<View>,
    cursor: usize,
    progress: Progress,
    rendered: Option<Progress>,
    out: Box<dyn Write + Send>,
}

/// Renders the current view to a terminal stream.
///
/// The pipeline view shows item progress; the console view replays the
/// [`ConsoleLog`]. Nothing is drawn until a view is selected.
pub struct TerminalSurface {
    console: ConsoleLog,
    state: Mutex<SurfaceState>,
}

impl TerminalSurface {
    /// Surface drawing to stderr
    pub fn new(console: ConsoleLog) -> Self {
        Self::with_output(console, Box::new(io::stderr()))
    }

    pub fn with_output(console: ConsoleLog, out: Box<dyn Write + Send>) -> Self {
        Self {
            console,
            state: Mutex::new(SurfaceState {
                view: None,
                cursor: 0,
                progress: Progress::default(),
                rendered: None,
                out,
            }),
        }
    }

    pub fn view(&self) -> Option<View> {
        self.state.lock().view
    }

    pub fn progress(&self) -> Progress {
        self.state.lock().progress
    }

    /// Fold a pipeline event into the progress counts
    pub fn record(&self, event: &PipelineEvent) {
        let mut state = self.state.lock();
        match event {
            PipelineEvent::PipelineStarted { .. } => state.progress = Progress::default(),
            PipelineEvent::ItemStarted { .. } => state.progress.started += 1,
            PipelineEvent::ItemFinished { success, .. } => {
                state.progress.finished += 1;
                if !success {
                    state.progress.failed += 1;
                }
            }
            PipelineEvent::PipelineFinished { .. } => {}
        }
    }

    /// Show the pipeline view unless the user already moved to the console
    pub fn pipeline_started(&self) {
        if self.view() != Some(View::Console) {
            self.select_view(View::Pipeline);
        }
    }

    /// Draw whatever changed since the last render
    pub fn render(&self) {
        let mut state = self.state.lock();
        // Terminal write failures have nowhere better to go
        let _ = match state.view {
            None => Ok(()),
            Some(View::Pipeline) => self.render_progress(&mut state),
            Some(View::Console) => self.render_console(&mut state),
        };
    }

    fn render_progress(&self, state: &mut SurfaceState) -> io::Result<()> {
        if state.rendered == Some(state.progress) {
            return Ok(());
        }
        let progress = state.progress;
        state.rendered = Some(progress);

        let failed = if progress.failed > 0 {
            style(format!("{} failed", progress.failed)).red().to_string()
        } else {
            style("0 failed".to_string()).green().to_string()
        };
        writeln!(
            state.out,
            "{} {} finished, {} running, {}",
            style("items:").bold(),
            progress.finished,
            progress.running(),
            failed
        )?;
        state.out.flush()
    }

    fn render_console(&self, state: &mut SurfaceState) -> io::Result<()> {
        let (lines, cursor) = self.console.lines_since(state.cursor);
        state.cursor = cursor;
        for line in lines {
            writeln!(state.out, "{}", line)?;
        }
        state.out.flush()
    }
}

impl SessionSurface for TerminalSurface {
    fn show_notice(&self, notice: &str) {
        let mut state = self.state.lock();
        let _ = writeln!(state.out, "{}", style(notice).yellow().bold());
        let _ = state.out.flush();
    }

    fn select_view(&self, view: View) {
        {
            let mut state = self.state.lock();
            if state.view == Some(view) {
                return;
            }
            state.view = Some(view);
            state.rendered = None;
            let title = match view {
                View::Pipeline => "Pipeline",
                View::Console => "Console",
            };
            let _ = writeln!(state.out, "{}", style(format!("== {} ==", title)).cyan().bold());
        }
        self.render();
    }
}
