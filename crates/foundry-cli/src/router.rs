//! Command routing

use crate::args::{Cli, Commands};
use crate::commands;

pub async fn route(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::RunTests(args) => commands::run_tests::execute(args).await,
        Commands::Split(args) => commands::split::execute(args),
    }
}
