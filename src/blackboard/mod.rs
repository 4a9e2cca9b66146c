//! Blackboard — hierarchical shared variables for behavior execution.
//!
//! Nodes of an execution tree read and write named variables through a
//! [`Blackboard`]. Subtrees get their own child blackboard whose keys can be
//! remapped onto the parent's, so one subtree definition can be wired to
//! different variables at each call site.
//!
//! # Type Erasure
//!
//! Values are native Rust values stored as [`AnyValue`]. No serialization
//! occurs. A read that asks for a different type than the one stored goes
//! through the blackboard's [`ConversionService`].
//!
//! # Port Metadata
//!
//! Every key accumulates a [`PortInfo`] from all declarations made for it.
//! Declarations on a remapped key are forwarded to the parent so the
//! blackboard that actually stores the value knows its type.
//!
//! # Thread Safety
//!
//! A blackboard is shared as `Arc<Blackboard>` and may be used from any
//! number of threads. See [`scope`] for the locking rules.

pub mod any_value;
pub mod config;
pub mod converter;
pub mod entry;
pub mod error;
pub mod port_info;
pub mod scope;

pub use any_value::AnyValue;
pub use config::BlackboardConfig;
pub use converter::{ConversionError, ConversionService, TypeConverter};
pub use entry::Entry;
pub use error::{BlackboardError, Result};
pub use port_info::{PortConflict, PortDirection, PortInfo, TypeInfo};
pub use scope::{Blackboard, EntryRef};
