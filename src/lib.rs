//! Dataset Foundry
//!
//! Re-exports the core library; see `foundry_core` for the API.

pub use foundry_core::*;
