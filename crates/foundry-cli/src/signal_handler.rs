//! Ctrl+C handling: each SIGINT becomes a quit request for the display

use futures::stream::StreamExt;
use signal_hook::consts::SIGINT;
use signal_hook_tokio::{Handle, Signals};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Forwards SIGINT to a quit channel until dropped
pub struct SigintForwarder {
    handle: Handle,
    task: JoinHandle<()>,
}

impl SigintForwarder {
    pub fn start(quit: mpsc::Sender<()>) -> anyhow::Result<Self> {
        let mut signals = Signals::new([SIGINT])?;
        let handle = signals.handle();

        let task = tokio::spawn(async move {
            while let Some(signal) = signals.next().await {
                if signal == SIGINT {
                    tracing::debug!("SIGINT received, requesting quit");
                    if quit.send(()).await.is_err() {
                        break;
                    }
                }
            }
        });

        Ok(Self { handle, task })
    }
}

impl Drop for SigintForwarder {
    fn drop(&mut self) {
        self.handle.close();
        self.task.abort();
    }
}
