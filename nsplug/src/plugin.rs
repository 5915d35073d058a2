//! Host-facing plugin contract and request/response types.

use crate::error::Result;
use crate::framework::Context;
use crate::value::Value;
use chrono::{DateTime, Utc};

/// What a host talks to. Implemented by [`Engine`](crate::Engine); hosts
/// usually hold it as `Box<dyn Plugin>` behind a
/// [`PluginServer`](crate::PluginServer).
pub trait Plugin: Send + Sync {
    /// Called once, before any `get`.
    fn configure(&self, config: &Context) -> Result<()>;

    /// Resolves a batch of requests. Results are returned in request order.
    fn get(&self, reqs: &[GetReq]) -> Result<Vec<GetResult>>;

    fn close(&self) -> Result<()> {
        Ok(())
    }
}

/// One step of a key chain: a plain lookup or, when `args` is present, a
/// function call (possibly with zero arguments).
#[derive(Debug, Clone, PartialEq)]
pub struct GetKey {
    pub key: String,
    pub args: Option<Vec<Value>>,
}

impl GetKey {
    pub fn get(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            args: None,
        }
    }

    pub fn call(key: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            key: key.into(),
            args: Some(args),
        }
    }

    pub fn is_call(&self) -> bool {
        self.args.is_some()
    }
}

/// A single lookup request.
#[derive(Debug, Clone, PartialEq)]
pub struct GetReq {
    pub exec_id: u64,
    pub exec_deadline: DateTime<Utc>,
    pub keys: Vec<GetKey>,
    /// Opaque correlation id echoed back in the result.
    pub key_id: u64,
    /// Receiver data; when present the root must be constructible.
    pub context: Option<Context>,
}

impl GetReq {
    /// A request for execution `0` with a deadline of now, which is enough
    /// for shared namespaces.
    pub fn new(key_id: u64, keys: Vec<GetKey>) -> Self {
        Self {
            exec_id: 0,
            exec_deadline: Utc::now(),
            keys,
            key_id,
            context: None,
        }
    }

    pub fn with_exec(mut self, exec_id: u64, deadline: DateTime<Utc>) -> Self {
        self.exec_id = exec_id;
        self.exec_deadline = deadline;
        self
    }

    pub fn with_context(mut self, context: Context) -> Self {
        self.context = Some(context);
        self
    }

    /// Key names, without arguments.
    pub fn key_names(&self) -> Vec<String> {
        self.keys.iter().map(|k| k.key.clone()).collect()
    }

    /// Dotted path of the keys up to and including `index`.
    pub fn path_to(&self, index: usize) -> String {
        self.keys
            .iter()
            .take(index + 1)
            .map(|k| k.key.as_str())
            .collect::<Vec<_>>()
            .join(".")
    }

    /// Dotted path of the whole chain.
    pub fn path(&self) -> String {
        self.path_to(self.keys.len())
    }
}

/// Outcome of one [`GetReq`].
#[derive(Debug, Clone, PartialEq)]
pub struct GetResult {
    pub key_id: u64,
    pub keys: Vec<String>,
    pub value: Value,
    /// Updated receiver data, present iff the request carried a context and
    /// a receiver was resolved.
    pub context: Option<Context>,
    /// True when `value` is a map that can serve as a receiver for further
    /// calls.
    pub callable: bool,
}

/// Lookup of results by correlation id.
pub trait ResultsByKey {
    fn by_key_id(&self, key_id: u64) -> Option<&GetResult>;
}

impl ResultsByKey for [GetResult] {
    fn by_key_id(&self, key_id: u64) -> Option<&GetResult> {
        self.iter().find(|r| r.key_id == key_id)
    }
}
