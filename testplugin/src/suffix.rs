//! Shared plugin answering every key with the key plus a configured suffix.

use anyhow::anyhow;
use nsplug::framework::{Namespace, Object, Root};
use nsplug::{Context, Engine, Plugin};
use std::sync::{Arc, RwLock};

pub const DEFAULT_SUFFIX: &str = "!!";

/// Answers every key with `key + suffix`.
#[derive(Debug, Default)]
pub struct SuffixRoot {
    suffix: RwLock<Option<String>>,
}

impl SuffixRoot {
    fn suffix(&self) -> anyhow::Result<String> {
        let suffix = self
            .suffix
            .read()
            .map_err(|_| anyhow!("suffix lock poisoned"))?;
        Ok(suffix
            .as_deref()
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_SUFFIX)
            .to_string())
    }
}

impl Root for SuffixRoot {
    fn configure(&self, config: &Context) -> anyhow::Result<()> {
        let suffix = match config.get("suffix") {
            None => None,
            Some(value) => Some(
                value
                    .as_str()
                    .ok_or_else(|| anyhow!("suffix must be a string, got {}", value.type_name()))?
                    .to_string(),
            ),
        };
        *self
            .suffix
            .write()
            .map_err(|_| anyhow!("suffix lock poisoned"))? = suffix;
        Ok(())
    }

    fn as_namespace(self: Arc<Self>) -> Option<Arc<dyn Namespace>> {
        Some(self)
    }
}

impl Namespace for SuffixRoot {
    fn get(&self, key: &str) -> anyhow::Result<Object> {
        Ok(Object::value(format!("{key}{}", self.suffix()?)))
    }
}

/// Factory used by plugin servers.
pub fn plugin() -> Box<dyn Plugin> {
    Box::new(Engine::new(SuffixRoot::default()))
}
