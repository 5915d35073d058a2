//! Dynamic → host decoding for statically known targets.

use super::error::{index_path, key_path, ConversionError, ConversionResult};
use super::shape::{
    decode_at, decode_float, decode_int, decode_string, mismatch, FloatKind, IntKind, Shape,
};
use super::to_value::KeyType;
use crate::value::Value;
use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;

/// Conversion of a [`Value`] into a statically typed host value.
pub trait FromValue: Sized {
    /// The shape this type decodes from; used to describe function parameters.
    fn shape() -> Shape;

    fn from_value_at(value: &Value, path: &str) -> ConversionResult<Self>;

    fn from_value(value: &Value) -> ConversionResult<Self> {
        Self::from_value_at(value, "$")
    }
}

impl FromValue for Value {
    fn shape() -> Shape {
        Shape::Any
    }

    fn from_value_at(value: &Value, _path: &str) -> ConversionResult<Self> {
        Ok(value.clone())
    }
}

impl FromValue for bool {
    fn shape() -> Shape {
        Shape::Bool
    }

    fn from_value_at(value: &Value, path: &str) -> ConversionResult<Self> {
        match value {
            Value::Bool(b) => Ok(*b),
            other => Err(mismatch(other, &Shape::Bool, path)),
        }
    }
}

macro_rules! int_from_value {
    ($($t:ty => $kind:expr),* $(,)?) => {
        $(
            impl FromValue for $t {
                fn shape() -> Shape {
                    Shape::Int($kind)
                }

                fn from_value_at(value: &Value, path: &str) -> ConversionResult<Self> {
                    // decode_int has already checked the bounds of $kind
                    decode_int(value, $kind, path).map(|n| n as $t)
                }
            }
        )*
    };
}

int_from_value!(
    i8 => IntKind::I8,
    i16 => IntKind::I16,
    i32 => IntKind::I32,
    i64 => IntKind::I64,
    isize => IntKind::Isize,
    u8 => IntKind::U8,
    u16 => IntKind::U16,
    u32 => IntKind::U32,
    u64 => IntKind::U64,
    usize => IntKind::Usize,
);

impl FromValue for f32 {
    fn shape() -> Shape {
        Shape::Float(FloatKind::F32)
    }

    fn from_value_at(value: &Value, path: &str) -> ConversionResult<Self> {
        decode_float(value, FloatKind::F32, path).map(|f| f as f32)
    }
}

impl FromValue for f64 {
    fn shape() -> Shape {
        Shape::Float(FloatKind::F64)
    }

    fn from_value_at(value: &Value, path: &str) -> ConversionResult<Self> {
        decode_float(value, FloatKind::F64, path)
    }
}

impl FromValue for String {
    fn shape() -> Shape {
        Shape::String
    }

    fn from_value_at(value: &Value, path: &str) -> ConversionResult<Self> {
        decode_string(value, path)
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn shape() -> Shape {
        Shape::Optional(Box::new(T::shape()))
    }

    fn from_value_at(value: &Value, path: &str) -> ConversionResult<Self> {
        match value {
            Value::Null | Value::Undefined => Ok(None),
            other => T::from_value_at(other, path).map(Some),
        }
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    fn shape() -> Shape {
        Shape::List(Box::new(T::shape()))
    }

    fn from_value_at(value: &Value, path: &str) -> ConversionResult<Self> {
        match value {
            Value::List(items) => items
                .iter()
                .enumerate()
                .map(|(i, item)| T::from_value_at(item, &index_path(path, i)))
                .collect(),
            other => Err(mismatch(other, &Self::shape(), path)),
        }
    }
}

fn decode_entries<K, V, C>(value: &Value, path: &str) -> ConversionResult<C>
where
    K: KeyType,
    V: FromValue,
    C: FromIterator<(K, V)>,
{
    let shape = Shape::Map(Box::new(V::shape()));
    let entries = match value {
        Value::Map(entries) => entries,
        other => return Err(mismatch(other, &shape, path)),
    };

    entries
        .iter()
        .map(|(k, v)| -> ConversionResult<(K, V)> {
            let entry_path = key_path(path, k);
            let key = K::from_map_key(k).ok_or_else(|| ConversionError::TypeMismatch {
                expected: format!("{} key", K::key_type_name()),
                actual: format!("{} key", k.type_name()),
                path: entry_path.clone(),
            })?;
            Ok((key, V::from_value_at(v, &entry_path)?))
        })
        .collect()
}

impl<K, V> FromValue for HashMap<K, V>
where
    K: KeyType + Eq + Hash,
    V: FromValue,
{
    fn shape() -> Shape {
        Shape::Map(Box::new(V::shape()))
    }

    fn from_value_at(value: &Value, path: &str) -> ConversionResult<Self> {
        decode_entries(value, path)
    }
}

impl<K, V> FromValue for BTreeMap<K, V>
where
    K: KeyType + Ord,
    V: FromValue,
{
    fn shape() -> Shape {
        Shape::Map(Box::new(V::shape()))
    }

    fn from_value_at(value: &Value, path: &str) -> ConversionResult<Self> {
        decode_entries(value, path)
    }
}

/// Decodes a value into an explicit shape and then into `T`, for callers
/// holding a runtime shape rather than a static type.
///
/// A top-level integer shape is only range-checked, so `u64` values above
/// `i64::MAX` reach `T` intact. Integers nested in containers are still
/// normalized through the 64-bit signed model.
pub fn decode_as<T: FromValue>(value: &Value, shape: &Shape) -> ConversionResult<T> {
    match shape {
        Shape::Int(kind) => {
            decode_int(value, *kind, "$")?;
            T::from_value(value)
        }
        _ => T::from_value(&decode_at(value, shape, "$")?),
    }
}
