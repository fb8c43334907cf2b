//! Dataset Foundry Core Library
//!
//! This crate runs unit tests for dataset items, locally or inside sandbox
//! containers, splits sandbox output into setup and test results, and
//! supervises pipeline sessions so cancellation always waits for cleanup.

pub mod actions;
pub mod config;
pub mod console;
pub mod dataset;
pub mod display;
pub mod error;
pub mod events;
pub mod pipeline;
pub mod sandbox;
pub mod supervisor;
pub mod types;
pub mod unit_tests;

#[cfg(test)]
pub(crate) mod testing;

// Re-export commonly used types
pub use actions::{ItemAction, RunUnitTests};
pub use config::{ConfigLoader, DisplayKind, FoundryConfig};
pub use dataset::{Context, Dataset, DatasetItem, Param, Services};
pub use display::{Display, FullDisplay, PlainDisplay, create_display};
pub use error::{FoundryError, FoundryResult};
pub use events::{EventBus, PipelineEvent};
pub use pipeline::{ItemPipeline, Pipeline, PipelineParams, PipelineReport};
pub use sandbox::{SandboxProvider, SandboxRequest, SandboxResult, SandboxRunner, reconcile, split_stream};
pub use supervisor::{PipelineSupervisor, SessionOutcome, SupervisorState};
pub use types::{CommandResult, UnitTestResult};
