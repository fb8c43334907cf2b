//! Dataset items, the execution context and parameter resolution

mod context;
mod item;
mod params;

pub use context::{Context, Services};
pub use item::{Dataset, DatasetItem, ItemUpdate};
pub use params::{Param, ParamValue};
