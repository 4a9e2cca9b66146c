//! Value conversion between declared and stored types.
//!
//! When a key is read as a type other than the one it was written with, the
//! entry asks its [`ConversionService`] for a converted copy. The default
//! service is [`TypeConverter`], an explicit table of registered conversions.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use super::any_value::AnyValue;
use super::port_info::TypeInfo;

/// No conversion exists (or it failed) between two types.
#[derive(Debug, Clone, Error)]
#[error("Cannot convert {from} to {to}")]
pub struct ConversionError {
    pub from: TypeInfo,
    pub to: TypeInfo,
}

/// Converts a stored value to a differently typed representation.
pub trait ConversionService: Send + Sync + fmt::Debug {
    /// Convert `value` to `target`. Only called when the two types differ.
    fn convert(&self, value: &AnyValue, target: &TypeInfo) -> Result<AnyValue, ConversionError>;
}

type ConvertFn = Arc<dyn Fn(&AnyValue) -> Option<AnyValue> + Send + Sync>;

/// Table-driven conversion service keyed by (source type, target type).
///
/// # Example
///
/// ```
/// use behavior_blackboard::blackboard::{AnyValue, ConversionService, TypeConverter, TypeInfo};
///
/// let converter = TypeConverter::with_defaults();
/// let out = converter
///     .convert(&AnyValue::new("17".to_string()), &TypeInfo::of::<i64>())
///     .unwrap();
/// assert_eq!(out.downcast::<i64>(), Some(17));
/// ```
#[derive(Clone, Default)]
pub struct TypeConverter {
    table: HashMap<(TypeInfo, TypeInfo), ConvertFn>,
}

impl TypeConverter {
    /// An empty table: only identity conversions succeed.
    pub fn new() -> Self {
        Self {
            table: HashMap::new(),
        }
    }

    /// Table with the built-in scalar, string and JSON conversions.
    pub fn with_defaults() -> Self {
        let mut converter = Self::new();
        converter.register_defaults();
        converter
    }

    /// Register a conversion from `S` to `T`. Returning `None` means the
    /// particular value could not be converted.
    pub fn register<S, T, F>(&mut self, f: F)
    where
        S: Any + Send + Sync,
        T: Any + Send + Sync,
        F: Fn(&S) -> Option<T> + Send + Sync + 'static,
    {
        let convert: ConvertFn = Arc::new(move |value: &AnyValue| {
            value.downcast_ref::<S>().and_then(|v| f(v)).map(AnyValue::new)
        });
        self.table
            .insert((TypeInfo::of::<S>(), TypeInfo::of::<T>()), convert);
    }

    /// Whether a conversion from `from` to `to` is registered (or trivial).
    pub fn supports(&self, from: &TypeInfo, to: &TypeInfo) -> bool {
        from == to || self.table.contains_key(&(*from, *to))
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    fn register_try_from<S, T>(&mut self)
    where
        S: Any + Send + Sync + Copy,
        T: Any + Send + Sync + TryFrom<S>,
    {
        self.register::<S, T, _>(|v| T::try_from(*v).ok());
    }

    fn register_display_and_parse<T>(&mut self)
    where
        T: Any + Send + Sync + fmt::Display + std::str::FromStr,
    {
        self.register::<T, String, _>(|v| Some(v.to_string()));
        self.register::<String, T, _>(|s| s.trim().parse::<T>().ok());
    }

    fn register_defaults(&mut self) {
        macro_rules! integer_pairs {
            ($converter:expr; $($from:ty => [$($to:ty),*]);* $(;)?) => {
                $($($converter.register_try_from::<$from, $to>();)*)*
            };
        }
        integer_pairs! {
            self;
            i32 => [i64, u32, u64, usize];
            i64 => [i32, u32, u64, usize];
            u32 => [i32, i64, u64, usize];
            u64 => [i32, i64, u32, usize];
            usize => [i32, i64, u32, u64];
        }

        self.register::<i32, f64, _>(|v| Some(f64::from(*v)));
        self.register::<u32, f64, _>(|v| Some(f64::from(*v)));
        self.register::<i64, f64, _>(|v| Some(*v as f64));
        self.register::<f32, f64, _>(|v| Some(f64::from(*v)));
        self.register::<f64, f32, _>(|v| {
            // Non-finite inputs map to themselves; finite ones must fit.
            (!v.is_finite() || (*v >= f64::from(f32::MIN) && *v <= f64::from(f32::MAX)))
                .then_some(*v as f32)
        });
        self.register::<f64, i64, _>(|v| {
            // i64::MAX as f64 rounds up to 2^63, hence the strict bound.
            (v.fract() == 0.0 && *v >= i64::MIN as f64 && *v < i64::MAX as f64)
                .then_some(*v as i64)
        });

        self.register_display_and_parse::<i32>();
        self.register_display_and_parse::<i64>();
        self.register_display_and_parse::<u32>();
        self.register_display_and_parse::<u64>();
        self.register_display_and_parse::<usize>();
        self.register_display_and_parse::<f32>();
        self.register_display_and_parse::<f64>();
        self.register_display_and_parse::<bool>();

        self.register::<&'static str, String, _>(|s| Some((*s).to_string()));

        self.register::<serde_json::Value, String, _>(|v| match v {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        });
        self.register::<String, serde_json::Value, _>(|s| {
            Some(
                serde_json::from_str(s).unwrap_or_else(|_| serde_json::Value::String(s.clone())),
            )
        });
    }
}

impl ConversionService for TypeConverter {
    fn convert(&self, value: &AnyValue, target: &TypeInfo) -> Result<AnyValue, ConversionError> {
        let from = value.type_info();
        if from == *target {
            return Ok(value.clone());
        }
        self.table
            .get(&(from, *target))
            .and_then(|convert| convert(value))
            .ok_or(ConversionError { from, to: *target })
    }
}

impl fmt::Debug for TypeConverter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeConverter")
            .field("conversions", &self.table.len())
            .finish()
    }
}
