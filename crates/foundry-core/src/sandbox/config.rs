//! Named sandbox definitions

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// How to launch one named sandbox
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SandboxConfig {
    /// Container image to run
    pub image: String,

    /// Shell commands making up the setup phase. Run before the test command
    /// and delimited with setup markers; no markers are emitted when empty.
    #[serde(default)]
    pub setup: Vec<String>,

    /// Mount point of the workspace inside the container
    #[serde(default = "default_workdir")]
    pub workdir: String,

    /// Environment variables to set in the container
    #[serde(default)]
    pub env: HashMap<String, String>,

    /// Allow network access
    #[serde(default)]
    pub network: bool,
}

fn default_workdir() -> String {
    "/workspace".to_string()
}

impl SandboxConfig {
    pub fn new(image: impl Into<String>) -> Self {
        Self {
            image: image.into(),
            setup: Vec::new(),
            workdir: default_workdir(),
            env: HashMap::new(),
            network: false,
        }
    }

    /// Add a setup-phase command
    pub fn with_setup(mut self, command: impl Into<String>) -> Self {
        self.setup.push(command.into());
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn with_network(mut self, network: bool) -> Self {
        self.network = network;
        self
    }
}
