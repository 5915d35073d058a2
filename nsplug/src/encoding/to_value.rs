//! Host → dynamic encoding.

use crate::value::{MapKey, Value, ValueMap};
use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;

/// Explicit null sentinel. Encodes to [`Value::Null`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Null;

/// Explicit undefined sentinel. Encodes to [`Value::Undefined`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Undefined;

/// Conversion of a host value into a [`Value`].
///
/// The host value graph must be acyclic; cycles are not detected.
pub trait ToValue {
    fn to_value(&self) -> Value;

    /// Encoding used when the value sits inside a list, map or record.
    /// Host absence there means "present but empty", so `None` becomes
    /// `Null` instead of `Undefined`.
    fn to_element_value(&self) -> Value {
        self.to_value()
    }
}

/// Encodes any host value.
pub fn encode<T: ToValue + ?Sized>(value: &T) -> Value {
    value.to_value()
}

impl ToValue for Value {
    fn to_value(&self) -> Value {
        self.clone()
    }
}

impl ToValue for Null {
    fn to_value(&self) -> Value {
        Value::Null
    }
}

impl ToValue for Undefined {
    fn to_value(&self) -> Value {
        Value::Undefined
    }
}

impl ToValue for bool {
    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }
}

// Unsigned values above i64::MAX wrap into negative numbers; the dynamic
// model only has a signed 64-bit integer.
macro_rules! int_to_value {
    ($($t:ty),*) => {
        $(
            impl ToValue for $t {
                fn to_value(&self) -> Value {
                    Value::Int(*self as i64)
                }
            }
        )*
    };
}

int_to_value!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);

impl ToValue for f32 {
    fn to_value(&self) -> Value {
        Value::Float(*self as f64)
    }
}

impl ToValue for f64 {
    fn to_value(&self) -> Value {
        Value::Float(*self)
    }
}

impl ToValue for str {
    fn to_value(&self) -> Value {
        Value::String(self.to_string())
    }
}

impl ToValue for String {
    fn to_value(&self) -> Value {
        Value::String(self.clone())
    }
}

impl ToValue for char {
    fn to_value(&self) -> Value {
        Value::String(self.to_string())
    }
}

impl<T: ToValue + ?Sized> ToValue for &T {
    fn to_value(&self) -> Value {
        (**self).to_value()
    }

    fn to_element_value(&self) -> Value {
        (**self).to_element_value()
    }
}

impl<T: ToValue + ?Sized> ToValue for Box<T> {
    fn to_value(&self) -> Value {
        (**self).to_value()
    }

    fn to_element_value(&self) -> Value {
        (**self).to_element_value()
    }
}

impl<T: ToValue> ToValue for Option<T> {
    fn to_value(&self) -> Value {
        match self {
            Some(v) => v.to_value(),
            None => Value::Undefined,
        }
    }

    fn to_element_value(&self) -> Value {
        match self {
            Some(v) => v.to_element_value(),
            None => Value::Null,
        }
    }
}

impl<T: ToValue> ToValue for [T] {
    fn to_value(&self) -> Value {
        Value::List(self.iter().map(ToValue::to_element_value).collect())
    }
}

impl<T: ToValue, const N: usize> ToValue for [T; N] {
    fn to_value(&self) -> Value {
        self.as_slice().to_value()
    }
}

impl<T: ToValue> ToValue for Vec<T> {
    fn to_value(&self) -> Value {
        self.as_slice().to_value()
    }
}

/// Host types usable as keys of an encoded map.
pub trait KeyType: Sized {
    fn to_map_key(&self) -> MapKey;
    fn from_map_key(key: &MapKey) -> Option<Self>;
    fn key_type_name() -> &'static str;
}

impl KeyType for String {
    fn to_map_key(&self) -> MapKey {
        MapKey::String(self.clone())
    }

    fn from_map_key(key: &MapKey) -> Option<Self> {
        match key {
            MapKey::String(s) => Some(s.clone()),
            _ => None,
        }
    }

    fn key_type_name() -> &'static str {
        "string"
    }
}

impl KeyType for i64 {
    fn to_map_key(&self) -> MapKey {
        MapKey::Int(*self)
    }

    fn from_map_key(key: &MapKey) -> Option<Self> {
        match key {
            MapKey::Int(i) => Some(*i),
            _ => None,
        }
    }

    fn key_type_name() -> &'static str {
        "int"
    }
}

impl KeyType for bool {
    fn to_map_key(&self) -> MapKey {
        MapKey::Bool(*self)
    }

    fn from_map_key(key: &MapKey) -> Option<Self> {
        match key {
            MapKey::Bool(b) => Some(*b),
            _ => None,
        }
    }

    fn key_type_name() -> &'static str {
        "bool"
    }
}

impl KeyType for MapKey {
    fn to_map_key(&self) -> MapKey {
        self.clone()
    }

    fn from_map_key(key: &MapKey) -> Option<Self> {
        Some(key.clone())
    }

    fn key_type_name() -> &'static str {
        "key"
    }
}

impl<K: KeyType + Eq + Hash, V: ToValue, S> ToValue for HashMap<K, V, S> {
    fn to_value(&self) -> Value {
        Value::Map(
            self.iter()
                .map(|(k, v)| (k.to_map_key(), v.to_element_value()))
                .collect(),
        )
    }
}

impl<K: KeyType + Ord, V: ToValue> ToValue for BTreeMap<K, V> {
    fn to_value(&self) -> Value {
        Value::Map(
            self.iter()
                .map(|(k, v)| (k.to_map_key(), v.to_element_value()))
                .collect(),
        )
    }
}

/// Builder that exposes a host record as a map.
///
/// ```
/// use nsplug::encoding::{Record, ToValue};
/// use nsplug::Value;
///
/// struct Server {
///     host_name: String,
///     port: u16,
///     secret: String,
/// }
///
/// impl ToValue for Server {
///     fn to_value(&self) -> Value {
///         // `secret` is excluded by not being listed.
///         Record::new()
///             .field("HostName", &self.host_name)
///             .field_as("listen_port", &self.port)
///             .finish()
///     }
/// }
///
/// let v = Server { host_name: "a".into(), port: 80, secret: "x".into() }.to_value();
/// assert_eq!(v.get("host_name"), Some(&Value::String("a".into())));
/// assert_eq!(v.get("listen_port"), Some(&Value::Int(80)));
/// assert_eq!(v.get("secret"), None);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Record {
    fields: ValueMap,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a field under its case-normalized name.
    pub fn field<T: ToValue + ?Sized>(self, name: &str, value: &T) -> Self {
        let external = normalize_field_name(name);
        self.field_as(&external, value)
    }

    /// Adds a field under an explicit external name, used verbatim.
    pub fn field_as<T: ToValue + ?Sized>(mut self, external: &str, value: &T) -> Self {
        self.fields
            .insert(MapKey::String(external.to_string()), value.to_element_value());
        self
    }

    pub fn finish(self) -> Value {
        Value::Map(self.fields)
    }
}

/// Lower snake case of a field name: `HostName` → `host_name`,
/// `IPAddr` → `ip_addr`, `userID` → `user_id`.
pub fn normalize_field_name(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);
    for (i, c) in chars.iter().enumerate() {
        if c.is_uppercase() {
            if i > 0 {
                let prev = chars[i - 1];
                let next_lower = chars.get(i + 1).map_or(false, |n| n.is_lowercase());
                let boundary = prev.is_lowercase()
                    || prev.is_ascii_digit()
                    || (prev.is_uppercase() && next_lower);
                if boundary && !out.ends_with('_') {
                    out.push('_');
                }
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(*c);
        }
    }
    out
}
