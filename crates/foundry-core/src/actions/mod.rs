//! Item actions: units of work a pipeline applies to each dataset item


pub use run_unit_tests::RunUnitTests;

use async_trait::async_trait;

use crate::dataset::{Context, DatasetItem};
use crate::error::FoundryResult;

/// Work applied to one dataset item.
///
/// Actions hold no per-run state and may run concurrently for different items.
#[async_trait]
pub trait ItemAction: Send + Sync {
    /// Identity recorded as the producer of anything this action publishes
    fn name(&self) -> &str;

    async fn run(&self, item: &DatasetItem, context: &Context) -> FoundryResult<()>;
}
