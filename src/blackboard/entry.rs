//! Blackboard entry — a single named slot.

use std::sync::Arc;

use super::any_value::AnyValue;
use super::converter::ConversionService;
use super::error::{BlackboardError, Result};
use super::port_info::{PortInfo, TypeInfo};

/// One slot of a blackboard: the current value plus the port metadata merged
/// from every declaration of its key.
///
/// The entry does not know its own key; callers pass it in for diagnostics.
#[derive(Debug, Clone)]
pub struct Entry {
    port_info: PortInfo,
    value: Option<AnyValue>,
    converter: Arc<dyn ConversionService>,
    /// Incremented on every successful write.
    sequence_id: u64,
    /// Epoch millis of the last write.
    stamp: Option<i64>,
}

impl Entry {
    /// Create an empty entry seeded with `port_info`.
    pub fn new(port_info: PortInfo, converter: Arc<dyn ConversionService>) -> Self {
        Self {
            port_info,
            value: None,
            converter,
            sequence_id: 0,
            stamp: None,
        }
    }

    /// Merge another declaration into this entry's metadata.
    pub fn declare(&mut self, key: &str, info: &PortInfo) -> Result<()> {
        self.port_info.merge(info).map_err(|conflict| {
            log::warn!(
                "Conflicting declaration for [{}]: {} vs {}",
                key,
                conflict.existing,
                conflict.requested
            );
            BlackboardError::ConflictingDeclaration {
                key: key.to_string(),
                existing: conflict.existing.name(),
                requested: conflict.requested.name(),
            }
        })
    }

    /// Replace the held value.
    ///
    /// The first write to an untyped entry fixes its type. Later writes of a
    /// different type are converted to the declared type; if that fails the
    /// previous value is kept.
    pub fn write(&mut self, key: &str, value: AnyValue) -> Result<()> {
        let declared = self.port_info.type_info;
        let value = match declared {
            None => {
                self.port_info.type_info = Some(value.type_info());
                value
            }
            Some(declared) if declared == value.type_info() => value,
            Some(declared) => self.converter.convert(&value, &declared).map_err(|_| {
                BlackboardError::TypeMismatch {
                    key: key.to_string(),
                    stored: value.type_info().name(),
                    requested: declared.name(),
                }
            })?,
        };

        self.value = Some(value);
        self.sequence_id += 1;
        self.stamp = Some(chrono::Utc::now().timestamp_millis());
        Ok(())
    }

    /// Read the value as `requested`, converting if the stored type differs.
    pub fn read(&self, key: &str, requested: &TypeInfo) -> Result<AnyValue> {
        let value = self.value.as_ref().ok_or_else(|| BlackboardError::Empty {
            key: key.to_string(),
        })?;
        if value.type_info() == *requested {
            return Ok(value.clone());
        }
        self.converter
            .convert(value, requested)
            .map_err(|e| BlackboardError::TypeMismatch {
                key: key.to_string(),
                stored: e.from.name(),
                requested: e.to.name(),
            })
    }

    pub fn port_info(&self) -> &PortInfo {
        &self.port_info
    }

    /// The raw held value, without conversion.
    pub fn value(&self) -> Option<&AnyValue> {
        self.value.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_none()
    }

    pub fn sequence_id(&self) -> u64 {
        self.sequence_id
    }

    pub fn stamp(&self) -> Option<i64> {
        self.stamp
    }

    /// Declared type, or the stored value's type when nothing was declared.
    pub fn effective_type(&self) -> Option<TypeInfo> {
        self.port_info
            .type_info
            .or_else(|| self.value.as_ref().map(AnyValue::type_info))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blackboard::converter::TypeConverter;
    use crate::blackboard::port_info::PortDirection;

    fn entry(info: PortInfo) -> Entry {
        Entry::new(info, Arc::new(TypeConverter::with_defaults()))
    }

    #[test]
    fn test_entry_starts_empty() {
        let e = entry(PortInfo::new(PortDirection::Input));
        assert!(e.is_empty());
        assert_eq!(e.sequence_id(), 0);
        assert!(e.stamp().is_none());
        let err = e.read("goal", &TypeInfo::of::<i32>()).unwrap_err();
        assert!(matches!(err, BlackboardError::Empty { key } if key == "goal"));
    }

    #[test]
    fn test_first_write_fixes_type() {
        let mut e = entry(PortInfo::default());
        e.write("count", AnyValue::new(3i32)).unwrap();
        assert_eq!(e.port_info().type_info, Some(TypeInfo::of::<i32>()));
        assert_eq!(e.sequence_id(), 1);
        assert!(e.stamp().is_some());

        let v = e.read("count", &TypeInfo::of::<i32>()).unwrap();
        assert_eq!(v.downcast::<i32>(), Some(3));
    }

    #[test]
    fn test_read_converts() {
        let mut e = entry(PortInfo::default());
        e.write("count", AnyValue::new(3i32)).unwrap();
        let v = e.read("count", &TypeInfo::of::<String>()).unwrap();
        assert_eq!(v.downcast::<String>().as_deref(), Some("3"));
    }

    #[test]
    fn test_read_unsupported_conversion() {
        #[derive(Debug, Clone)]
        struct Opaque;

        let mut e = entry(PortInfo::default());
        e.write("thing", AnyValue::new(Opaque)).unwrap();
        let err = e.read("thing", &TypeInfo::of::<i32>()).unwrap_err();
        assert!(matches!(err, BlackboardError::TypeMismatch { .. }));
    }

    #[test]
    fn test_write_converts_to_declared_type() {
        let mut e = entry(PortInfo::typed::<i64>(PortDirection::Output));
        e.write("n", AnyValue::new("42".to_string())).unwrap();
        assert!(e.value().unwrap().is::<i64>());
        assert_eq!(
            e.read("n", &TypeInfo::of::<i64>()).unwrap().downcast::<i64>(),
            Some(42)
        );
    }

    #[test]
    fn test_write_mismatch_keeps_previous_value() {
        let mut e = entry(PortInfo::typed::<i64>(PortDirection::Output));
        e.write("n", AnyValue::new(1i64)).unwrap();
        let err = e.write("n", AnyValue::new("not a number".to_string())).unwrap_err();
        assert!(matches!(err, BlackboardError::TypeMismatch { .. }));
        assert_eq!(e.sequence_id(), 1);
        assert_eq!(e.value().unwrap().downcast::<i64>(), Some(1));
    }

    #[test]
    fn test_declare_merges_and_detects_conflict() {
        let mut e = entry(PortInfo::new(PortDirection::Input));
        e.declare("x", &PortInfo::new(PortDirection::Output)).unwrap();
        assert_eq!(e.port_info().direction, Some(PortDirection::InOut));

        e.declare("x", &PortInfo::typed::<i32>(PortDirection::Input)).unwrap();
        let err = e
            .declare("x", &PortInfo::typed::<String>(PortDirection::Input))
            .unwrap_err();
        assert!(matches!(err, BlackboardError::ConflictingDeclaration { key, .. } if key == "x"));
        assert_eq!(e.port_info().type_info, Some(TypeInfo::of::<i32>()));
    }

    #[test]
    fn test_effective_type() {
        let mut e = entry(PortInfo::default());
        assert!(e.effective_type().is_none());
        e.write("v", AnyValue::new(1.5f64)).unwrap();
        assert_eq!(e.effective_type(), Some(TypeInfo::of::<f64>()));
    }
}
