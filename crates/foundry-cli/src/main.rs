//! Dataset Foundry CLI
//!
//! ```bash
//! foundry run-tests --dataset items.json --filename '{test_file}' --sandbox python
//! foundry split captured_stdout.txt --stderr captured_stderr.txt --exit-code 1
//! ```
//!
//! Logging is installed by the selected display, not here, so that the full
//! display can route it into its console view.

mod args;
mod commands;
mod router;
mod signal_handler;

use clap::Parser;

pub use args::{Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    router::route(cli).await
}
