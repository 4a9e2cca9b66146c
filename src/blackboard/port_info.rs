//! Port metadata — declared type and direction for a blackboard key.
//!
//! Nodes declare the ports they read and write. Several nodes may declare the
//! same key, so a [`PortInfo`] is accumulated by merging: facts are added,
//! never taken away.

use std::any::{Any, TypeId};
use std::fmt;

/// Runtime type tag used for type-erased values.
#[derive(Clone, Copy)]
pub struct TypeInfo {
    id: TypeId,
    name: &'static str,
}

impl TypeInfo {
    /// Tag for type `T`.
    pub fn of<T: Any>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Full type name, as reported by `std::any::type_name`.
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is<T: Any>(&self) -> bool {
        self.id == TypeId::of::<T>()
    }
}

impl PartialEq for TypeInfo {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeInfo {}

impl std::hash::Hash for TypeInfo {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl fmt::Display for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Which way data flows through a port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortDirection {
    /// The node reads the key.
    Input,
    /// The node writes the key.
    Output,
    /// The node both reads and writes the key.
    InOut,
}

impl PortDirection {
    /// Union of two directions.
    pub fn combine(self, other: PortDirection) -> PortDirection {
        if self == other {
            self
        } else {
            PortDirection::InOut
        }
    }

    pub fn is_input(self) -> bool {
        matches!(self, PortDirection::Input | PortDirection::InOut)
    }

    pub fn is_output(self) -> bool {
        matches!(self, PortDirection::Output | PortDirection::InOut)
    }
}

/// Two declarations disagree about the concrete type of a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortConflict {
    pub existing: TypeInfo,
    pub requested: TypeInfo,
}

/// Accumulated metadata for one key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PortInfo {
    /// Known direction, if any declaration mentioned one.
    pub direction: Option<PortDirection>,
    /// Concrete declared type. Once set it is never cleared.
    pub type_info: Option<TypeInfo>,
    /// Human-readable description of the port.
    pub description: Option<String>,
    /// Default value in its textual form.
    pub default_value: Option<String>,
}

impl PortInfo {
    /// Metadata carrying only a direction.
    pub fn new(direction: PortDirection) -> Self {
        Self {
            direction: Some(direction),
            ..Self::default()
        }
    }

    /// Metadata with a direction and a concrete type.
    pub fn typed<T: Any>(direction: PortDirection) -> Self {
        Self {
            direction: Some(direction),
            type_info: Some(TypeInfo::of::<T>()),
            ..Self::default()
        }
    }

    /// Metadata carrying only a concrete type.
    pub fn of_type(type_info: TypeInfo) -> Self {
        Self {
            type_info: Some(type_info),
            ..Self::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_default_value(mut self, default_value: impl Into<String>) -> Self {
        self.default_value = Some(default_value.into());
        self
    }

    /// Merge `other` into `self`.
    ///
    /// Unknown fields are filled in from `other` and directions are combined.
    /// A differing concrete type is a conflict, in which case `self` is left
    /// untouched.
    pub fn merge(&mut self, other: &PortInfo) -> Result<(), PortConflict> {
        if let (Some(existing), Some(requested)) = (self.type_info, other.type_info) {
            if existing != requested {
                return Err(PortConflict {
                    existing,
                    requested,
                });
            }
        }

        if self.type_info.is_none() {
            self.type_info = other.type_info;
        }
        self.direction = match (self.direction, other.direction) {
            (Some(a), Some(b)) => Some(a.combine(b)),
            (a, b) => a.or(b),
        };
        if self.description.is_none() {
            self.description = other.description.clone();
        }
        if self.default_value.is_none() {
            self.default_value = other.default_value.clone();
        }
        Ok(())
    }
}
