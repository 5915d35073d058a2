#![allow(dead_code)]

use nsplug::framework::{
    Callable, Constructible, Fields, Func, Mappable, Namespace, NamespaceCreator, Object, Root,
};
use nsplug::{Context, Engine, GetReq, GetResult, Result, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Returns `value` for one key and nothing for every other key.
pub struct KeyValue {
    key: String,
    value: Object,
}

impl KeyValue {
    pub fn new(key: &str, value: Object) -> Self {
        Self {
            key: key.to_string(),
            value,
        }
    }
}

impl Namespace for KeyValue {
    fn get(&self, key: &str) -> anyhow::Result<Object> {
        if key == self.key {
            Ok(self.value.clone())
        } else {
            Ok(Object::Nil)
        }
    }
}

/// Mappable namespace backed by a static map.
pub struct KeyValueMap(pub Fields);

impl KeyValueMap {
    pub fn of<const N: usize>(entries: [(&str, Object); N]) -> Self {
        Self(
            entries
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        )
    }
}

impl Namespace for KeyValueMap {
    fn get(&self, key: &str) -> anyhow::Result<Object> {
        Ok(self.0.get(key).cloned().unwrap_or_default())
    }

    fn as_mappable(&self) -> Option<&dyn Mappable> {
        Some(self)
    }
}

impl Mappable for KeyValueMap {
    fn map(&self) -> anyhow::Result<Option<Fields>> {
        Ok(Some(self.0.clone()))
    }
}

/// Callable namespace answering every key with the same function.
pub struct CallNs(pub Func);

impl Namespace for CallNs {
    fn get(&self, _key: &str) -> anyhow::Result<Object> {
        anyhow::bail!("can't get")
    }

    fn as_callable(&self) -> Option<&dyn Callable> {
        Some(self)
    }
}

impl Callable for CallNs {
    fn func(&self, _key: &str) -> Option<Func> {
        Some(self.0.clone())
    }
}

pub struct GetErr;

impl Namespace for GetErr {
    fn get(&self, _key: &str) -> anyhow::Result<Object> {
        anyhow::bail!("get error")
    }
}

pub struct MapErr;

impl Namespace for MapErr {
    fn get(&self, _key: &str) -> anyhow::Result<Object> {
        Ok(Object::Map(HashMap::new()))
    }

    fn as_mappable(&self) -> Option<&dyn Mappable> {
        Some(self)
    }
}

impl Mappable for MapErr {
    fn map(&self) -> anyhow::Result<Option<Fields>> {
        anyhow::bail!("map error")
    }
}

/// Mappable namespace whose mapping is nil.
pub struct Nilable;

impl Namespace for Nilable {
    fn get(&self, _key: &str) -> anyhow::Result<Object> {
        Ok(Object::Nil)
    }

    fn as_mappable(&self) -> Option<&dyn Mappable> {
        Some(self)
    }
}

impl Mappable for Nilable {
    fn map(&self) -> anyhow::Result<Option<Fields>> {
        Ok(None)
    }
}

/// Receiver whose single function overwrites its state.
pub struct Mutable {
    value: Arc<Mutex<String>>,
}

impl Mutable {
    pub fn new(value: &str) -> Self {
        Self {
            value: Arc::new(Mutex::new(value.to_string())),
        }
    }

    fn current(&self) -> String {
        self.value.lock().unwrap().clone()
    }
}

impl Namespace for Mutable {
    fn get(&self, _key: &str) -> anyhow::Result<Object> {
        Ok(Object::value(self.current()))
    }

    fn as_mappable(&self) -> Option<&dyn Mappable> {
        Some(self)
    }

    fn as_callable(&self) -> Option<&dyn Callable> {
        Some(self)
    }
}

impl Mappable for Mutable {
    fn map(&self) -> anyhow::Result<Option<Fields>> {
        let mut fields = Fields::new();
        fields.insert("value".to_string(), Object::value(self.current()));
        Ok(Some(fields))
    }
}

impl Callable for Mutable {
    fn func(&self, _key: &str) -> Option<Func> {
        let value = Arc::clone(&self.value);
        Some(Func::new(move |s: String| {
            *value.lock().unwrap() = s;
            Object::value("OK")
        }))
    }
}

/// Root that is itself a namespace, delegating to `inner`.
pub struct Embed(pub Arc<dyn Namespace>);

impl Embed {
    pub fn new<N: Namespace + 'static>(inner: N) -> Self {
        Self(Arc::new(inner))
    }
}

impl Namespace for Embed {
    fn get(&self, key: &str) -> anyhow::Result<Object> {
        self.0.get(key)
    }

    fn as_mappable(&self) -> Option<&dyn Mappable> {
        self.0.as_mappable()
    }

    fn as_callable(&self) -> Option<&dyn Callable> {
        self.0.as_callable()
    }
}

impl Root for Embed {
    fn configure(&self, _config: &Context) -> anyhow::Result<()> {
        Ok(())
    }

    fn as_namespace(self: Arc<Self>) -> Option<Arc<dyn Namespace>> {
        Some(self)
    }
}

type Constructor =
    Box<dyn Fn(&Context) -> anyhow::Result<Option<Arc<dyn Namespace>>> + Send + Sync>;

/// Constructible root. Without a context it answers lookups and calls
/// itself; with one it builds a receiver through `constructor`.
#[derive(Default)]
pub struct RootNew {
    constructor: Option<Constructor>,
}

impl RootNew {
    pub fn with<F>(constructor: F) -> Self
    where
        F: Fn(&Context) -> anyhow::Result<Option<Arc<dyn Namespace>>> + Send + Sync + 'static,
    {
        Self {
            constructor: Some(Box::new(constructor)),
        }
    }
}

fn result_map(text: &str) -> Object {
    Object::map_of([("result", Object::value(text))])
}

impl Namespace for RootNew {
    fn get(&self, _key: &str) -> anyhow::Result<Object> {
        Ok(result_map("New not called (Get)"))
    }

    fn as_callable(&self) -> Option<&dyn Callable> {
        Some(self)
    }

    fn as_constructible(&self) -> Option<&dyn Constructible> {
        Some(self)
    }
}

impl Callable for RootNew {
    fn func(&self, _key: &str) -> Option<Func> {
        Some(Func::new(|| result_map("New not called (Func)")))
    }
}

impl Constructible for RootNew {
    fn construct(&self, receiver: &Context) -> anyhow::Result<Option<Arc<dyn Namespace>>> {
        match &self.constructor {
            Some(constructor) => constructor(receiver),
            None => Ok(Some(Arc::new(KeyValueMap::of([(
                "foo",
                result_map("New called"),
            )])))),
        }
    }
}

impl Root for RootNew {
    fn configure(&self, _config: &Context) -> anyhow::Result<()> {
        Ok(())
    }

    fn as_namespace(self: Arc<Self>) -> Option<Arc<dyn Namespace>> {
        Some(self)
    }
}

/// Stateful namespace counting its lookups.
#[derive(Default)]
pub struct Counter {
    count: AtomicU64,
}

impl Namespace for Counter {
    fn get(&self, _key: &str) -> anyhow::Result<Object> {
        Ok(Object::value(self.count.fetch_add(1, Ordering::SeqCst) + 1))
    }
}

/// Creator root building a fresh [`Counter`] per execution.
#[derive(Default, Clone)]
pub struct RootCounter {
    pub created: Arc<AtomicUsize>,
}

impl RootCounter {
    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }
}

impl NamespaceCreator for RootCounter {
    fn namespace(&self) -> Arc<dyn Namespace> {
        self.created.fetch_add(1, Ordering::SeqCst);
        Arc::new(Counter::default())
    }
}

impl Root for RootCounter {
    fn configure(&self, _config: &Context) -> anyhow::Result<()> {
        Ok(())
    }

    fn as_creator(&self) -> Option<&dyn NamespaceCreator> {
        Some(self)
    }
}

/// Root implementing neither capability.
pub struct RootNoImpl;

impl Root for RootNoImpl {
    fn configure(&self, _config: &Context) -> anyhow::Result<()> {
        Ok(())
    }
}

pub fn configured<R: Root + 'static>(root: R) -> Engine {
    let engine = Engine::new(root);
    engine.configure(&Context::new()).unwrap();
    engine
}

pub fn run<R: Root + 'static>(root: R, reqs: &[GetReq]) -> Result<Vec<GetResult>> {
    configured(root).get(reqs)
}

pub fn result(key_id: u64, keys: &[&str], value: Value) -> GetResult {
    GetResult {
        key_id,
        keys: keys.iter().map(|k| k.to_string()).collect(),
        value,
        context: None,
        callable: false,
    }
}

pub fn string(s: &str) -> Value {
    Value::String(s.to_string())
}
