//! Namespace resolution engine.
//!
//! Turns a [`Root`] into a [`Plugin`]: each request selects a namespace
//! (shared, or per execution through the [`ExecutionCache`]), optionally
//! rehydrates it from the request context, walks the key chain and flattens
//! the outcome.

use super::exec_cache::ExecutionCache;
use super::flatten::flatten;
use super::namespace::{Context, Namespace, Object};
use super::root::Root;
use crate::config::EngineConfig;
use crate::error::{CallError, Error, FlattenError, ReceiverError, Result};
use crate::plugin::{GetReq, GetResult, Plugin};
use crate::value::{MapKey, Value};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, trace, warn};

pub struct Engine {
    root: Arc<dyn Root>,
    cache: ExecutionCache,
    config: EngineConfig,
}

impl Engine {
    pub fn new<R: Root + 'static>(root: R) -> Self {
        Self::with_config(Arc::new(root), EngineConfig::default())
    }

    pub fn with_config(root: Arc<dyn Root>, config: EngineConfig) -> Self {
        Self {
            root,
            cache: ExecutionCache::new(),
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Per-execution namespaces currently alive.
    pub fn cache(&self) -> &ExecutionCache {
        &self.cache
    }

    /// Validates the root kind and hands it the configuration.
    pub fn configure(&self, config: &Context) -> Result<()> {
        let shared = Arc::clone(&self.root).as_namespace().is_some();
        if !shared && self.root.as_creator().is_none() {
            return Err(Error::InvalidRoot);
        }
        self.root.configure(config).map_err(Error::Configure)?;
        debug!(shared, "plugin configured");
        Ok(())
    }

    /// Resolves every request, stopping at the first failure.
    pub fn get(&self, reqs: &[GetReq]) -> Result<Vec<GetResult>> {
        reqs.iter().map(|req| self.resolve(req)).collect()
    }

    /// Resolves every request independently; one failure does not affect the
    /// others.
    pub fn get_each(&self, reqs: &[GetReq]) -> Vec<Result<GetResult>> {
        reqs.iter().map(|req| self.resolve(req)).collect()
    }

    /// Drops all execution state, stops the expiry worker and closes the
    /// root.
    pub fn close(&self) -> Result<()> {
        self.cache.clear()?;
        self.cache.shutdown();
        debug!("execution cache cleared");
        self.root.close().map_err(Error::Close)
    }

    /// Resolves a single request.
    pub fn resolve(&self, req: &GetReq) -> Result<GetResult> {
        let result = self.resolve_inner(req);
        if let Err(err) = &result {
            warn!(key_id = req.key_id, exec_id = req.exec_id, error = %err, "get failed");
        }
        result
    }

    fn resolve_inner(&self, req: &GetReq) -> Result<GetResult> {
        let selected = self.select_namespace(req)?;
        let constructible = selected.as_constructible().is_some();

        let receiver = match &req.context {
            None => selected,
            Some(context) => {
                let constructor = selected
                    .as_constructible()
                    .ok_or(Error::ContextUnsupported)?;
                match constructor.construct(context).map_err(Error::Instantiate)? {
                    Some(namespace) => namespace,
                    None => return undefined_receiver(req),
                }
            }
        };

        let resolved = walk(req, Arc::clone(&receiver))?;
        let value = flatten(&resolved).map_err(|source| Error::Flatten {
            path: req.path(),
            source,
        })?;

        let context = match req.context {
            Some(_) => Some(receiver_context(req, receiver)?),
            None => None,
        };

        Ok(GetResult {
            key_id: req.key_id,
            keys: req.key_names(),
            callable: matches!(value, Value::Map(_)) && constructible,
            value,
            context,
        })
    }

    fn select_namespace(&self, req: &GetReq) -> Result<Arc<dyn Namespace>> {
        if let Some(shared) = Arc::clone(&self.root).as_namespace() {
            return Ok(shared);
        }
        let creator = self.root.as_creator().ok_or(Error::InvalidRoot)?;
        let expires_at = deadline_instant(req.exec_deadline) + self.config.expiry_grace();
        self.cache
            .get_or_create(req.exec_id, expires_at, || creator.namespace())
    }
}

impl Plugin for Engine {
    fn configure(&self, config: &Context) -> Result<()> {
        Engine::configure(self, config)
    }

    fn get(&self, reqs: &[GetReq]) -> Result<Vec<GetResult>> {
        Engine::get(self, reqs)
    }

    fn close(&self) -> Result<()> {
        Engine::close(self)
    }
}

/// The context named no receiver: calls on it are errors, lookups are
/// undefined.
fn undefined_receiver(req: &GetReq) -> Result<GetResult> {
    if let Some(index) = req.keys.iter().position(|k| k.is_call()) {
        return Err(Error::UndefinedReceiver {
            path: req.path_to(index),
        });
    }
    Ok(GetResult {
        key_id: req.key_id,
        keys: req.key_names(),
        value: Value::Undefined,
        context: None,
        callable: false,
    })
}

fn walk(req: &GetReq, start: Arc<dyn Namespace>) -> Result<Object> {
    let mut current = Object::Namespace(start);

    for (index, step) in req.keys.iter().enumerate() {
        trace!(key = %step.key, call = step.is_call(), "walking key");

        current = match &step.args {
            Some(args) => call(req, index, &current, args)?,
            None => lookup(req, index, &current)?,
        };

        if current.is_nil() {
            break;
        }
    }

    Ok(current)
}

fn call(req: &GetReq, index: usize, current: &Object, args: &[Value]) -> Result<Object> {
    let callable = match current {
        Object::Namespace(namespace) => namespace.as_callable(),
        _ => None,
    };
    let callable = callable.ok_or_else(|| Error::NotCallable {
        path: req.path_to(index),
    })?;

    let key = &req.keys[index].key;
    callable
        .func(key)
        .ok_or(CallError::Unsupported)
        .and_then(|func| func.call(args))
        .map_err(|source| Error::Call {
            path: req.path_to(index),
            source,
        })
}

fn lookup(req: &GetReq, index: usize, current: &Object) -> Result<Object> {
    let key = &req.keys[index].key;
    let next = match current {
        Object::Namespace(namespace) => namespace.get(key).map_err(|cause| Error::Get {
            path: req.path_to(index),
            cause,
        })?,
        Object::Map(entries) => match entries.get(&MapKey::String(key.clone())) {
            Some(Object::Nil) => Object::Value(Value::Null),
            Some(found) => found.clone(),
            None => Object::Nil,
        },
        Object::Value(Value::Map(entries)) => entries
            .get(&MapKey::String(key.clone()))
            .cloned()
            .map_or(Object::Nil, Object::Value),
        _ => Object::Nil,
    };
    Ok(next)
}

/// Flattens the receiver after the walk so state changed by a call reaches
/// the host.
fn receiver_context(req: &GetReq, receiver: Arc<dyn Namespace>) -> Result<Context> {
    let receiver_error = |source: ReceiverError| Error::Receiver {
        path: req.path(),
        source,
    };

    match flatten(&Object::Namespace(receiver)) {
        Ok(Value::Map(entries)) => Ok(entries
            .into_iter()
            .map(|(k, v)| match k {
                MapKey::String(s) => (s, v),
                other => (other.to_string(), v),
            })
            .collect()),
        Ok(Value::Undefined | Value::Null) => Err(receiver_error(ReceiverError::Nil)),
        Ok(_) | Err(FlattenError::NotMappable) => Err(receiver_error(ReceiverError::NotObject)),
        Err(other) => Err(receiver_error(ReceiverError::Flatten(other))),
    }
}

fn deadline_instant(deadline: DateTime<Utc>) -> Instant {
    let remaining = (deadline - Utc::now()).to_std().unwrap_or(Duration::ZERO);
    Instant::now() + remaining
}
