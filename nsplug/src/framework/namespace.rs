//! Namespace capability set.
//!
//! Every node of a plugin's tree implements [`Namespace`]. The optional
//! capabilities are separate traits; a namespace advertises the ones it
//! supports through the `as_*` probes, which the engine checks at runtime.

use super::func::Func;
use crate::encoding::ToValue;
use crate::value::{MapKey, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Receiver data carried in a request's context.
pub type Context = HashMap<String, Value>;

/// Full mapping returned by [`Mappable::map`].
pub type Fields = HashMap<String, Object>;

/// A node in the plugin tree, addressed by string keys.
pub trait Namespace: Send + Sync {
    /// Returns the value for `key`. A missing key is [`Object::Nil`], not an
    /// error; explicit null is `Object::Value(Value::Null)`.
    fn get(&self, key: &str) -> anyhow::Result<Object>;

    fn as_mappable(&self) -> Option<&dyn Mappable> {
        None
    }

    fn as_callable(&self) -> Option<&dyn Callable> {
        None
    }

    /// Only consulted on the root namespace of an execution.
    fn as_constructible(&self) -> Option<&dyn Constructible> {
        None
    }
}

/// A namespace that can materialize its whole key space at once.
pub trait Mappable: Namespace {
    /// Snapshot of every key. `None` stands for a nil mapping.
    fn map(&self) -> anyhow::Result<Option<Fields>>;
}

/// A namespace whose keys may be invoked as functions.
pub trait Callable: Namespace {
    /// The function for `key`, or `None` if the key cannot be called.
    fn func(&self, key: &str) -> Option<Func>;
}

/// A root namespace that rebuilds namespaces from receiver data.
pub trait Constructible: Namespace {
    /// `Ok(None)` means the receiver names no namespace; the caller sees
    /// undefined rather than an error.
    fn construct(&self, receiver: &Context) -> anyhow::Result<Option<Arc<dyn Namespace>>>;
}

/// Host-side result graph produced by namespaces and functions.
#[derive(Clone, Default)]
pub enum Object {
    /// Host absence.
    #[default]
    Nil,
    Value(Value),
    Namespace(Arc<dyn Namespace>),
    List(Vec<Object>),
    Map(HashMap<MapKey, Object>),
}

impl Object {
    /// Wraps any encodable host value.
    pub fn value<T: ToValue>(value: T) -> Self {
        Object::Value(value.to_value())
    }

    pub fn namespace<N: Namespace + 'static>(namespace: N) -> Self {
        Object::Namespace(Arc::new(namespace))
    }

    /// String-keyed map of objects.
    pub fn map_of<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Object)>,
    {
        Object::Map(
            entries
                .into_iter()
                .map(|(k, v)| (MapKey::String(k.into()), v))
                .collect(),
        )
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Object::Nil)
    }
}

impl From<Value> for Object {
    fn from(value: Value) -> Self {
        Object::Value(value)
    }
}

impl From<Arc<dyn Namespace>> for Object {
    fn from(namespace: Arc<dyn Namespace>) -> Self {
        Object::Namespace(namespace)
    }
}

impl From<Fields> for Object {
    fn from(fields: Fields) -> Self {
        Object::map_of(fields)
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Object::Nil => write!(f, "Nil"),
            Object::Value(v) => f.debug_tuple("Value").field(v).finish(),
            Object::Namespace(_) => write!(f, "Namespace(#<namespace>)"),
            Object::List(items) => f.debug_tuple("List").field(items).finish(),
            Object::Map(entries) => f.debug_tuple("Map").field(entries).finish(),
        }
    }
}
