//! Configuration loading
//!
//! Sources are applied in the order they are added, later ones overriding
//! earlier ones:
//! - Default configuration
//! - Configuration files (JSON, TOML, YAML)
//! - Environment variables (`FOUNDRY_*`)

mod file_loader;
mod loader;
mod model;

pub use file_loader::load_from_file;
pub use loader::{ConfigLoader, ConfigSource};
pub use model::{DisplayConfig, DisplayKind, FoundryConfig, LogFormat, LoggingConfig, UnitTestDefaults};
