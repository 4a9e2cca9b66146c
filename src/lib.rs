//! # Behavior Blackboard
//!
//! The shared-state substrate of a behavior execution engine: a keyed store
//! of typed values that nests per subtree instance, with explicit port
//! remapping between a subtree and its caller.
//!
//! The engine that ticks nodes, the declaration of node ports and the parsing
//! of tree definitions live outside this crate. They interact with it through
//! [`Blackboard`] and [`PortInfo`].

pub mod blackboard;

pub use blackboard::{
    AnyValue, Blackboard, BlackboardConfig, BlackboardError, ConversionService, PortDirection,
    PortInfo, TypeConverter, TypeInfo,
};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
