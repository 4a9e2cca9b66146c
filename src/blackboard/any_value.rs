//! Type-erased blackboard value.
//!
//! Nodes share native Rust values through the blackboard without any
//! serialization. The value is reference-counted so that reads hand out a
//! cheap clone while the entry keeps its own copy.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use super::port_info::TypeInfo;

/// A value of any `Send + Sync + 'static` type, tagged with its [`TypeInfo`].
///
/// # Example
///
/// ```
/// use behavior_blackboard::blackboard::AnyValue;
///
/// let value = AnyValue::new(42i32);
/// assert!(value.is::<i32>());
/// assert_eq!(value.downcast::<i32>(), Some(42));
/// assert_eq!(value.downcast::<String>(), None);
/// ```
#[derive(Clone)]
pub struct AnyValue {
    value: Arc<dyn Any + Send + Sync>,
    type_info: TypeInfo,
}

impl AnyValue {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            value: Arc::new(value),
            type_info: TypeInfo::of::<T>(),
        }
    }

    /// Runtime type of the held value.
    pub fn type_info(&self) -> TypeInfo {
        self.type_info
    }

    /// Check if this holds a value of type `T`.
    pub fn is<T: Any>(&self) -> bool {
        self.type_info.is::<T>()
    }

    /// Borrow the held value as `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }

    /// Clone the held value out as `T`.
    pub fn downcast<T: Any + Clone>(&self) -> Option<T> {
        self.downcast_ref::<T>().cloned()
    }
}

impl fmt::Debug for AnyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnyValue")
            .field("type", &self.type_info)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Pose {
        x: f64,
        y: f64,
    }

    #[test]
    fn test_any_value_new_and_downcast() {
        let value = AnyValue::new(Pose { x: 1.0, y: 2.5 });
        assert!(value.is::<Pose>());
        assert!(!value.is::<i32>());
        assert_eq!(value.downcast_ref::<Pose>().unwrap().y, 2.5);
        assert_eq!(value.downcast::<Pose>(), Some(Pose { x: 1.0, y: 2.5 }));
    }

    #[test]
    fn test_any_value_wrong_type() {
        let value = AnyValue::new(42i32);
        assert!(value.downcast_ref::<String>().is_none());
        assert_eq!(value.type_info(), TypeInfo::of::<i32>());
    }

    #[test]
    fn test_any_value_clone_shares_payload() {
        let value = AnyValue::new(vec![1u8, 2, 3]);
        let copy = value.clone();
        assert_eq!(copy.downcast::<Vec<u8>>(), Some(vec![1, 2, 3]));
        assert_eq!(value.downcast_ref::<Vec<u8>>().unwrap().len(), 3);
    }
}
