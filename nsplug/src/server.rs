//! Instance registry served to hosts.
//!
//! One server process can hold several configured plugin instances. Each
//! `configure` builds a fresh plugin from the factory and returns the id the
//! host uses for every later call.

use crate::encoding::FromValue;
use crate::error::{Error, Result};
use crate::framework::Context;
use crate::plugin::{GetReq, GetResult, Plugin};
use crate::value::Value;
use indexmap::IndexMap;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use tracing::debug;

pub type PluginFactory = Box<dyn Fn() -> Box<dyn Plugin> + Send + Sync>;

/// A request addressed to one plugin instance.
#[derive(Debug, Clone, PartialEq)]
pub struct InstanceRequest {
    pub instance_id: u64,
    pub request: GetReq,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InstanceResult {
    pub instance_id: u64,
    pub result: GetResult,
}

pub struct PluginServer {
    factory: PluginFactory,
    next_id: AtomicU64,
    instances: RwLock<HashMap<u64, Arc<dyn Plugin>>>,
}

impl PluginServer {
    pub fn new<F>(factory: F) -> Self
    where
        F: Fn() -> Box<dyn Plugin> + Send + Sync + 'static,
    {
        Self {
            factory: Box::new(factory),
            next_id: AtomicU64::new(0),
            instances: RwLock::new(HashMap::new()),
        }
    }

    /// Builds and configures a new instance. The config must be a
    /// string-keyed map.
    pub fn configure(&self, config: &Value) -> Result<u64> {
        let config = Context::from_value(config).map_err(Error::ConfigConversion)?;

        let plugin: Arc<dyn Plugin> = Arc::from((self.factory)());
        plugin.configure(&config)?;

        let instance_id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        self.instances
            .write()
            .map_err(poisoned)?
            .insert(instance_id, plugin);
        debug!(instance_id, "plugin instance configured");
        Ok(instance_id)
    }

    /// Dispatches requests to their instances.
    ///
    /// Requests are grouped by instance in first-seen order and each group is
    /// passed to its plugin as one batch; results follow the same order.
    pub fn get(&self, reqs: Vec<InstanceRequest>) -> Result<Vec<InstanceResult>> {
        let mut groups: IndexMap<u64, Vec<GetReq>> = IndexMap::new();
        for req in reqs {
            groups.entry(req.instance_id).or_default().push(req.request);
        }

        let mut results = Vec::new();
        for (instance_id, batch) in groups {
            let plugin = self.instance(instance_id)?;
            debug!(instance_id, requests = batch.len(), "dispatching batch");
            for result in plugin.get(&batch)? {
                results.push(InstanceResult {
                    instance_id,
                    result,
                });
            }
        }
        Ok(results)
    }

    /// Removes an instance and closes it. Unknown ids are ignored.
    pub fn close(&self, instance_id: u64) -> Result<()> {
        let removed = self
            .instances
            .write()
            .map_err(poisoned)?
            .remove(&instance_id);
        match removed {
            Some(plugin) => {
                debug!(instance_id, "closing plugin instance");
                plugin.close()
            }
            None => Ok(()),
        }
    }

    pub fn instance_count(&self) -> usize {
        self.instances.read().map(|m| m.len()).unwrap_or(0)
    }

    fn instance(&self, instance_id: u64) -> Result<Arc<dyn Plugin>> {
        self.instances
            .read()
            .map_err(poisoned)?
            .get(&instance_id)
            .cloned()
            .ok_or(Error::UnknownInstance(instance_id))
    }
}

fn poisoned<T>(_: T) -> Error {
    Error::Internal("instance registry lock poisoned".to_string())
}
