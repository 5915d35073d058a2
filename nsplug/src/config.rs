//! Engine tuning and plugin configuration loading.

use crate::error::{Error, Result};
use crate::framework::Context;
use crate::value::{MapKey, Value};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Settings for the resolution engine itself, as opposed to the plugin
/// configuration handed to the root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Extra time an execution namespace is kept past its deadline.
    pub expiry_grace_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { expiry_grace_ms: 0 }
    }
}

impl EngineConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::EngineConfig(e.to_string()))
    }

    pub fn from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::EngineConfig(format!("failed to read {path}: {e}")))?;
        Self::from_toml_str(&content)
    }

    /// Defaults overridden by `NSPLUG_EXPIRY_GRACE_MS` when set.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        if let Ok(grace) = std::env::var("NSPLUG_EXPIRY_GRACE_MS") {
            config.expiry_grace_ms = grace.trim().parse().map_err(|_| {
                Error::EngineConfig(format!("NSPLUG_EXPIRY_GRACE_MS is not a number: {grace}"))
            })?;
        }
        Ok(config)
    }

    pub fn expiry_grace(&self) -> Duration {
        Duration::from_millis(self.expiry_grace_ms)
    }
}

/// Parses a TOML document into the configuration map passed to a root.
///
/// Datetimes become strings; everything else maps to the matching value
/// kind.
pub fn plugin_config_from_toml(content: &str) -> Result<Context> {
    let table: toml::Table = content
        .parse()
        .map_err(|e: toml::de::Error| Error::EngineConfig(e.to_string()))?;
    Ok(table
        .into_iter()
        .map(|(k, v)| (k, toml_to_value(v)))
        .collect())
}

fn toml_to_value(value: toml::Value) -> Value {
    match value {
        toml::Value::String(s) => Value::String(s),
        toml::Value::Integer(i) => Value::Int(i),
        toml::Value::Float(f) => Value::Float(f),
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Datetime(d) => Value::String(d.to_string()),
        toml::Value::Array(items) => Value::List(items.into_iter().map(toml_to_value).collect()),
        toml::Value::Table(table) => Value::Map(
            table
                .into_iter()
                .map(|(k, v)| (MapKey::String(k), toml_to_value(v)))
                .collect(),
        ),
    }
}
