//! Per-execution namespace cache.
//!
//! Namespaces built by a [`NamespaceCreator`](super::NamespaceCreator) live
//! for one execution. They are created lazily on the first request carrying
//! a new execution id and dropped once the execution deadline passes.
//!
//! Lookups take the read lock. On a miss the write lock is taken and the map
//! is checked again before creating, so concurrent first requests for the
//! same id build exactly one namespace. Expiry is handled by a single
//! background thread, started on first use, that sleeps until the earliest
//! pending deadline.

use super::namespace::Namespace;
use crate::error::{Error, Result};
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex, RwLock};
use std::thread::{self, JoinHandle};
use std::time::Instant;
use tracing::{debug, trace, warn};

struct Entry {
    namespace: Arc<dyn Namespace>,
    // Distinguishes this entry from a later one reusing the same id, so a
    // stale timer never evicts it.
    generation: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct Timer {
    at: Instant,
    exec_id: u64,
    generation: u64,
}

#[derive(Default)]
struct Timers {
    pending: BinaryHeap<Reverse<Timer>>,
    shutdown: bool,
}

#[derive(Default)]
struct Shared {
    entries: RwLock<HashMap<u64, Entry>>,
    timers: Mutex<Timers>,
    wake: Condvar,
    next_generation: AtomicU64,
}

impl Shared {
    fn expire(&self, exec_id: u64, generation: u64) {
        let mut entries = match self.entries.write() {
            Ok(entries) => entries,
            Err(_) => {
                warn!(exec_id, "execution cache lock poisoned, skipping expiry");
                return;
            }
        };
        if entries
            .get(&exec_id)
            .is_some_and(|entry| entry.generation == generation)
        {
            entries.remove(&exec_id);
            debug!(exec_id, "execution namespace expired");
        }
    }
}

/// Map from execution id to the namespace built for that execution.
#[derive(Default)]
pub struct ExecutionCache {
    shared: Arc<Shared>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl ExecutionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the namespace for `exec_id`, creating it with `create` if the
    /// execution has none yet. A created entry is removed at `expires_at`.
    pub fn get_or_create<F>(
        &self,
        exec_id: u64,
        expires_at: Instant,
        create: F,
    ) -> Result<Arc<dyn Namespace>>
    where
        F: FnOnce() -> Arc<dyn Namespace>,
    {
        {
            let entries = self.shared.entries.read().map_err(poisoned)?;
            if let Some(entry) = entries.get(&exec_id) {
                trace!(exec_id, "execution cache hit");
                return Ok(Arc::clone(&entry.namespace));
            }
        }

        let mut entries = self.shared.entries.write().map_err(poisoned)?;
        if let Some(entry) = entries.get(&exec_id) {
            return Ok(Arc::clone(&entry.namespace));
        }

        let namespace = create();
        let generation = self.shared.next_generation.fetch_add(1, Ordering::Relaxed);
        entries.insert(
            exec_id,
            Entry {
                namespace: Arc::clone(&namespace),
                generation,
            },
        );
        drop(entries);
        debug!(exec_id, "created execution namespace");

        self.schedule(Timer {
            at: expires_at,
            exec_id,
            generation,
        })?;
        Ok(namespace)
    }

    /// Removes the namespace for `exec_id`. Removing an absent id is a no-op.
    pub fn remove(&self, exec_id: u64) -> Result<()> {
        self.shared
            .entries
            .write()
            .map_err(poisoned)?
            .remove(&exec_id);
        Ok(())
    }

    /// Drops every cached namespace. Pending timers fire harmlessly.
    pub fn clear(&self) -> Result<()> {
        self.shared.entries.write().map_err(poisoned)?.clear();
        Ok(())
    }

    pub fn contains(&self, exec_id: u64) -> bool {
        self.shared
            .entries
            .read()
            .map(|entries| entries.contains_key(&exec_id))
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.shared
            .entries
            .read()
            .map(|entries| entries.len())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn schedule(&self, timer: Timer) -> Result<()> {
        self.ensure_worker()?;
        let mut timers = self.shared.timers.lock().map_err(poisoned)?;
        timers.pending.push(Reverse(timer));
        drop(timers);
        self.shared.wake.notify_one();
        Ok(())
    }

    /// Stops the expiry worker and discards pending timers. A later
    /// `get_or_create` starts a new worker.
    pub fn shutdown(&self) {
        if let Ok(mut timers) = self.shared.timers.lock() {
            timers.shutdown = true;
            timers.pending.clear();
        }
        self.shared.wake.notify_all();
        let handle = self.worker.lock().ok().and_then(|mut worker| worker.take());
        if let Some(handle) = handle {
            if handle.join().is_err() {
                warn!("expiry worker panicked");
            }
        }
    }

    fn ensure_worker(&self) -> Result<()> {
        let mut worker = self.worker.lock().map_err(poisoned)?;
        if worker.is_none() {
            self.shared.timers.lock().map_err(poisoned)?.shutdown = false;
            let shared = Arc::clone(&self.shared);
            let handle = thread::Builder::new()
                .name("nsplug-expiry".to_string())
                .spawn(move || run_expiry(shared))
                .map_err(|e| Error::Internal(format!("failed to start expiry worker: {e}")))?;
            *worker = Some(handle);
        }
        Ok(())
    }
}

impl Drop for ExecutionCache {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run_expiry(shared: Arc<Shared>) {
    let Ok(mut timers) = shared.timers.lock() else {
        return;
    };
    loop {
        if timers.shutdown {
            return;
        }
        let now = Instant::now();
        let next = timers.pending.peek().map(|Reverse(t)| t.at);
        match next {
            None => {
                timers = match shared.wake.wait(timers) {
                    Ok(guard) => guard,
                    Err(_) => return,
                };
            }
            Some(at) if at <= now => {
                let due = timers.pending.pop();
                if let Some(Reverse(timer)) = due {
                    // never hold the timer lock while taking the entry lock
                    drop(timers);
                    shared.expire(timer.exec_id, timer.generation);
                    timers = match shared.timers.lock() {
                        Ok(guard) => guard,
                        Err(_) => return,
                    };
                }
            }
            Some(at) => {
                timers = match shared.wake.wait_timeout(timers, at - now) {
                    Ok((guard, _)) => guard,
                    Err(_) => return,
                };
            }
        }
    }
}

fn poisoned<T>(_: T) -> Error {
    Error::Internal("execution cache lock poisoned".to_string())
}
