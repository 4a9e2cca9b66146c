//! Blackboard errors.

use thiserror::Error;

/// Errors returned by blackboard operations.
///
/// None of these are fatal inside the blackboard. `NotFound` in particular is
/// routine: the node producing a variable may simply not have run yet.
#[derive(Debug, Error)]
pub enum BlackboardError {
    /// The key is absent locally and along the whole remapping chain.
    #[error("Key [{key}] not found")]
    NotFound { key: String },

    /// The key exists but nothing has been written to it yet.
    #[error("Key [{key}] is declared but empty")]
    Empty { key: String },

    /// The stored value cannot be converted to the requested type.
    #[error("Key [{key}] holds a value of type {stored}, which cannot be converted to {requested}")]
    TypeMismatch {
        key: String,
        stored: &'static str,
        requested: &'static str,
    },

    /// Two declarations for the same key assert incompatible concrete types.
    #[error("Key [{key}] already declared as {existing}, cannot redeclare as {requested}")]
    ConflictingDeclaration {
        key: String,
        existing: &'static str,
        requested: &'static str,
    },

    /// A child scope would be nested deeper than the configured maximum.
    #[error("Blackboard nesting depth {depth} exceeds the maximum of {max}")]
    DepthExceeded { depth: usize, max: usize },

    /// YAML parsing of a configuration failed.
    #[error("Config error: {0}")]
    Config(#[from] serde_yaml::Error),

    /// File I/O error while loading a configuration.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BlackboardError {
    /// Whether the caller may reasonably retry on a later tick.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::Empty { .. })
    }
}

/// Result alias for blackboard operations.
pub type Result<T> = std::result::Result<T, BlackboardError>;
