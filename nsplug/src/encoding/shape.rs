//! Runtime shape descriptors and the shape-directed decoder.
//!
//! A [`Shape`] is the small closed set of targets a dynamic [`Value`] can be
//! decoded into. [`decode`] walks a value against a shape and produces the
//! normalized value of that shape, applying the cross-family rules:
//!
//! - integers and floats convert into each other with range checking
//! - numbers convert to and from strings by formatting/parsing
//! - booleans only ever decode into booleans
//! - lists and maps only decode into list and map shapes, element by element

use super::error::{index_path, key_path, ConversionError, ConversionResult};
use crate::value::{Value, ValueMap};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntKind {
    I8,
    I16,
    I32,
    I64,
    Isize,
    U8,
    U16,
    U32,
    U64,
    Usize,
}

impl IntKind {
    /// Inclusive bounds of the host integer type.
    pub fn bounds(self) -> (i128, i128) {
        match self {
            IntKind::I8 => (i8::MIN as i128, i8::MAX as i128),
            IntKind::I16 => (i16::MIN as i128, i16::MAX as i128),
            IntKind::I32 => (i32::MIN as i128, i32::MAX as i128),
            IntKind::I64 => (i64::MIN as i128, i64::MAX as i128),
            IntKind::Isize => (isize::MIN as i128, isize::MAX as i128),
            IntKind::U8 => (0, u8::MAX as i128),
            IntKind::U16 => (0, u16::MAX as i128),
            IntKind::U32 => (0, u32::MAX as i128),
            IntKind::U64 => (0, u64::MAX as i128),
            IntKind::Usize => (0, usize::MAX as i128),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            IntKind::I8 => "i8",
            IntKind::I16 => "i16",
            IntKind::I32 => "i32",
            IntKind::I64 => "i64",
            IntKind::Isize => "isize",
            IntKind::U8 => "u8",
            IntKind::U16 => "u16",
            IntKind::U32 => "u32",
            IntKind::U64 => "u64",
            IntKind::Usize => "usize",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FloatKind {
    F32,
    F64,
}

impl FloatKind {
    pub fn name(self) -> &'static str {
        match self {
            FloatKind::F32 => "f32",
            FloatKind::F64 => "f64",
        }
    }
}

/// Target shape for decoding a dynamic value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Shape {
    /// Dynamic target: the natural shape of the value is kept.
    Any,
    Bool,
    Int(IntKind),
    Float(FloatKind),
    String,
    List(Box<Shape>),
    /// Keyed collection; the inner shape applies to values, keys are kept verbatim.
    Map(Box<Shape>),
    /// `Null` and `Undefined` pass through, anything else decodes as the inner shape.
    Optional(Box<Shape>),
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Shape::Any => write!(f, "any"),
            Shape::Bool => write!(f, "bool"),
            Shape::Int(kind) => write!(f, "{}", kind.name()),
            Shape::Float(kind) => write!(f, "{}", kind.name()),
            Shape::String => write!(f, "string"),
            Shape::List(elem) => write!(f, "list<{}>", elem),
            Shape::Map(elem) => write!(f, "map<{}>", elem),
            Shape::Optional(inner) => write!(f, "optional<{}>", inner),
        }
    }
}

/// Decodes `value` into the normalized value of `shape`. With no shape
/// the natural shape of the value is returned unchanged.
pub fn decode(value: &Value, shape: Option<&Shape>) -> ConversionResult<Value> {
    match shape {
        Some(shape) => decode_at(value, shape, "$"),
        None => Ok(value.clone()),
    }
}

pub(crate) fn decode_at(value: &Value, shape: &Shape, path: &str) -> ConversionResult<Value> {
    match shape {
        Shape::Any => Ok(value.clone()),
        Shape::Optional(inner) => match value {
            Value::Null | Value::Undefined => Ok(value.clone()),
            other => decode_at(other, inner, path),
        },
        Shape::Bool => match value {
            Value::Bool(b) => Ok(Value::Bool(*b)),
            other => Err(mismatch(other, shape, path)),
        },
        Shape::Int(kind) => {
            let n = decode_int(value, *kind, path)?;
            // The dynamic model is 64-bit signed; only u64/usize can exceed it.
            i64::try_from(n).map(Value::Int).map_err(|_| ConversionError::Range {
                target: "int".to_string(),
                value: n.to_string(),
                path: path.to_string(),
            })
        }
        Shape::Float(kind) => decode_float(value, *kind, path).map(Value::Float),
        Shape::String => decode_string(value, path).map(Value::String),
        Shape::List(elem) => match value {
            Value::List(items) => items
                .iter()
                .enumerate()
                .map(|(i, item)| decode_at(item, elem, &index_path(path, i)))
                .collect::<ConversionResult<Vec<_>>>()
                .map(Value::List),
            other => Err(mismatch(other, shape, path)),
        },
        Shape::Map(elem) => match value {
            Value::Map(entries) => {
                let mut out = ValueMap::with_capacity(entries.len());
                for (k, v) in entries {
                    out.insert(k.clone(), decode_at(v, elem, &key_path(path, k))?);
                }
                Ok(Value::Map(out))
            }
            other => Err(mismatch(other, shape, path)),
        },
    }
}

/// Decodes an integer of the given host width, returning it widened so the
/// full `u64` range survives.
pub(crate) fn decode_int(value: &Value, kind: IntKind, path: &str) -> ConversionResult<i128> {
    let shape = Shape::Int(kind);
    let n: i128 = match value {
        Value::Int(i) => *i as i128,
        Value::Float(f) => {
            if !f.is_finite() || f.fract() != 0.0 || f.abs() > 1e38 {
                return Err(range(value, &shape, path));
            }
            *f as i128
        }
        Value::String(s) => s.trim().parse::<i128>().map_err(|_| mismatch(value, &shape, path))?,
        other => return Err(mismatch(other, &shape, path)),
    };

    let (min, max) = kind.bounds();
    if n < min || n > max {
        return Err(range(value, &shape, path));
    }
    Ok(n)
}

pub(crate) fn decode_float(value: &Value, kind: FloatKind, path: &str) -> ConversionResult<f64> {
    let shape = Shape::Float(kind);
    let f = match value {
        Value::Int(i) => *i as f64,
        Value::Float(f) => *f,
        Value::String(s) => s.trim().parse::<f64>().map_err(|_| mismatch(value, &shape, path))?,
        other => return Err(mismatch(other, &shape, path)),
    };

    match kind {
        FloatKind::F64 => Ok(f),
        FloatKind::F32 => {
            if f.is_finite() && f.abs() > f32::MAX as f64 {
                return Err(range(value, &shape, path));
            }
            Ok(f as f32 as f64)
        }
    }
}

pub(crate) fn decode_string(value: &Value, path: &str) -> ConversionResult<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Int(i) => Ok(i.to_string()),
        Value::Float(f) => Ok(f.to_string()),
        other => Err(mismatch(other, &Shape::String, path)),
    }
}

/// Containers on either side make it a shape problem; scalars a type problem.
pub(crate) fn mismatch(value: &Value, shape: &Shape, path: &str) -> ConversionError {
    let container_value = matches!(value, Value::List(_) | Value::Map(_));
    let container_shape = matches!(shape, Shape::List(_) | Shape::Map(_));
    if container_value || container_shape {
        ConversionError::Shape {
            expected: shape.to_string(),
            actual: value.type_name().to_string(),
            path: path.to_string(),
        }
    } else {
        ConversionError::TypeMismatch {
            expected: shape.to_string(),
            actual: describe(value),
            path: path.to_string(),
        }
    }
}

fn range(value: &Value, shape: &Shape, path: &str) -> ConversionError {
    ConversionError::Range {
        target: shape.to_string(),
        value: value.to_string(),
        path: path.to_string(),
    }
}

fn describe(value: &Value) -> String {
    match value {
        Value::String(s) => format!("string {:?}", s),
        other => other.type_name().to_string(),
    }
}
