//! Per-execution plugin.
//!
//! Every execution gets a fresh [`Tally`]. Functions on it mutate the tally
//! and later lookups in the same execution observe the change; other
//! executions never do.

use anyhow::anyhow;
use nsplug::encoding::{FromValue, Record, ToValue};
use nsplug::framework::{
    Callable, Fields, Func, Mappable, Namespace, NamespaceCreator, Object, Root,
};
use nsplug::{Context, Engine, Plugin, Value};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use tracing::debug;

pub const DEFAULT_STEP: i64 = 1;

/// Creator root. `step` sets the increment used by `bump()`.
#[derive(Debug)]
pub struct SessionRoot {
    step: AtomicI64,
}

impl Default for SessionRoot {
    fn default() -> Self {
        Self {
            step: AtomicI64::new(DEFAULT_STEP),
        }
    }
}

impl Root for SessionRoot {
    fn configure(&self, config: &Context) -> anyhow::Result<()> {
        if let Some(step) = config.get("step") {
            let step = i64::from_value(step).map_err(|e| anyhow!("invalid step: {e}"))?;
            self.step.store(step, Ordering::Relaxed);
        }
        Ok(())
    }

    fn as_creator(&self) -> Option<&dyn NamespaceCreator> {
        Some(self)
    }
}

impl NamespaceCreator for SessionRoot {
    fn namespace(&self) -> Arc<dyn Namespace> {
        let step = self.step.load(Ordering::Relaxed);
        debug!(step, "starting tally");
        Arc::new(Tally::new(step))
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
struct TallyState {
    total: i64,
    call_count: u64,
}

impl ToValue for TallyState {
    fn to_value(&self) -> Value {
        Record::new()
            .field("Total", &self.total)
            .field("CallCount", &self.call_count)
            .finish()
    }
}

/// Running total for one execution.
///
/// Keys: `total`, `calls`, `stats` (both as a map). Functions: `add(n)`,
/// `bump()`, `reset()`; each returns the new total.
pub struct Tally {
    state: Arc<Mutex<TallyState>>,
    step: i64,
}

impl Tally {
    pub fn new(step: i64) -> Self {
        Self {
            state: Arc::new(Mutex::new(TallyState::default())),
            step,
        }
    }

    fn snapshot(&self) -> anyhow::Result<TallyState> {
        lock(&self.state).map(|state| state.clone())
    }

    fn mutator<F>(&self, apply: F) -> Func
    where
        F: Fn(&mut TallyState) + Send + Sync + 'static,
    {
        let state = Arc::clone(&self.state);
        Func::new(move || -> anyhow::Result<Object> {
            let mut state = lock(&state)?;
            apply(&mut state);
            state.call_count += 1;
            Ok(Object::value(state.total))
        })
    }
}

fn lock(state: &Mutex<TallyState>) -> anyhow::Result<std::sync::MutexGuard<'_, TallyState>> {
    state.lock().map_err(|_| anyhow!("tally lock poisoned"))
}

impl Namespace for Tally {
    fn get(&self, key: &str) -> anyhow::Result<Object> {
        let state = self.snapshot()?;
        Ok(match key {
            "total" => Object::value(state.total),
            "calls" => Object::value(state.call_count),
            "stats" => Object::Value(state.to_value()),
            _ => Object::Nil,
        })
    }

    fn as_mappable(&self) -> Option<&dyn Mappable> {
        Some(self)
    }

    fn as_callable(&self) -> Option<&dyn Callable> {
        Some(self)
    }
}

impl Mappable for Tally {
    fn map(&self) -> anyhow::Result<Option<Fields>> {
        let state = self.snapshot()?;
        let mut fields = Fields::new();
        fields.insert("total".to_string(), Object::value(state.total));
        fields.insert("calls".to_string(), Object::value(state.call_count));
        Ok(Some(fields))
    }
}

impl Callable for Tally {
    fn func(&self, key: &str) -> Option<Func> {
        match key {
            "add" => {
                let state = Arc::clone(&self.state);
                Some(Func::new(move |n: i64| -> anyhow::Result<Object> {
                    let mut state = lock(&state)?;
                    state.total = state
                        .total
                        .checked_add(n)
                        .ok_or_else(|| anyhow!("tally overflow adding {n}"))?;
                    state.call_count += 1;
                    Ok(Object::value(state.total))
                }))
            }
            "bump" => {
                let step = self.step;
                Some(self.mutator(move |state| state.total = state.total.saturating_add(step)))
            }
            "reset" => Some(self.mutator(|state| state.total = 0)),
            _ => None,
        }
    }
}

/// Factory used by plugin servers.
pub fn plugin() -> Box<dyn Plugin> {
    Box::new(Engine::new(SessionRoot::default()))
}
