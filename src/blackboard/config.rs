//! Blackboard configuration.
//!
//! # Example YAML
//!
//! ```yaml
//! create_on_set: false
//! max_depth: 16
//! ```

use serde::{Deserialize, Serialize};

use super::error::Result;

/// Behaviour switches shared by a root blackboard and all of its children.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlackboardConfig {
    /// When true, `set` on an unknown key creates the entry in the scope that
    /// ends the remapping chain. When false it fails with `NotFound`.
    #[serde(default = "default_create_on_set")]
    pub create_on_set: bool,
    /// Maximum nesting depth of child blackboards. The root has depth 0.
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

fn default_create_on_set() -> bool {
    true
}

fn default_max_depth() -> usize {
    64
}

impl Default for BlackboardConfig {
    fn default() -> Self {
        Self {
            create_on_set: default_create_on_set(),
            max_depth: default_max_depth(),
        }
    }
}

impl BlackboardConfig {
    /// Parse a config from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Parse a config from a YAML file on disk.
    pub fn from_yaml_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Builder: reject writes to undeclared keys.
    pub fn strict(mut self) -> Self {
        self.create_on_set = false;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}
