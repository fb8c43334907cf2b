//! Error types for Dataset Foundry
//!
//! Only configuration problems and infrastructure failures travel as errors.
//! Setup failures, marker protocol violations and failing tests are data and
//! are reported through `CommandResult` / `UnitTestResult` instead.

mod constructors;
mod types;

pub use types::{FoundryError, FoundryResult, OptionExt, ResultExt};
