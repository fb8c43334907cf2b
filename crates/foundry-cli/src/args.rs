//! CLI argument definitions using clap

use clap::{Args, Parser, Subcommand, ValueEnum};
use foundry_core::config::DisplayKind;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "foundry")]
#[command(about = "Dataset Foundry - run dataset unit tests in sandboxes")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a test file for every item of a dataset
    RunTests(RunTestsArgs),

    /// Split captured sandbox output into setup and test phases
    Split(SplitArgs),
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayArg {
    Full,
    Plain,
}

impl From<DisplayArg> for DisplayKind {
    fn from(arg: DisplayArg) -> Self {
        match arg {
            DisplayArg::Full => DisplayKind::Full,
            DisplayArg::Plain => DisplayKind::Plain,
        }
    }
}

/// Parameters accept a literal or `{key}` to read from the item or context
/// (`{test_file}`, `{item.meta.file}`, `{context.input_dir}`).
#[derive(Args, Debug, Clone)]
pub struct RunTestsArgs {
    /// JSON array of dataset items, each with an `id`
    #[arg(long)]
    pub dataset: PathBuf,

    /// Test file to run, relative to --dir
    #[arg(long)]
    pub filename: String,

    /// Directory holding the test file [default: {context.input_dir}]
    #[arg(long)]
    pub dir: Option<String>,

    /// Input directory for the run [default: the dataset's directory]
    #[arg(long)]
    pub input_dir: Option<PathBuf>,

    /// Item key for the test result
    #[arg(long, default_value = "test_result")]
    pub property: String,

    /// Item key for the setup result
    #[arg(long, default_value = "setup_result")]
    pub setup_property: String,

    /// Never publish a setup result
    #[arg(long, conflicts_with = "setup_property")]
    pub no_setup_result: bool,

    /// Named sandbox to run in; runs locally when omitted
    #[arg(long)]
    pub sandbox: Option<String>,

    /// Stream sandbox output to the log as it arrives
    #[arg(long)]
    pub stream_logs: bool,

    /// Test timeout in seconds [default: from config, 300]
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Items processed at once
    #[arg(long, default_value_t = 4)]
    pub concurrency: usize,

    #[arg(long, value_enum)]
    pub display: Option<DisplayArg>,

    /// Keep the display open after the run completes
    #[arg(long)]
    pub no_exit: bool,

    /// Configuration file (JSON, TOML or YAML)
    #[arg(long, env = "FOUNDRY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log level or filter directive
    #[arg(long)]
    pub log_level: Option<String>,

    /// Write items and the run report to this JSON file
    #[arg(long)]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct SplitArgs {
    /// Captured stdout of a sandbox run
    pub stdout: PathBuf,

    /// Captured stderr of the same run
    #[arg(long)]
    pub stderr: Option<PathBuf>,

    /// Exit code of the run; when given, print the reconciled results
    #[arg(long)]
    pub exit_code: Option<i32>,
}
