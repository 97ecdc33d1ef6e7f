#![deny(missing_docs)]
//! In-memory implementation of the trellis environment seams.
//!
//! [`MemoryEnv`] is both a [`PresenceOracle`] (a mutable set of present
//! selectors) and a [`ReadySignal`] (a latch that queues jobs until
//! released). It stands in for a live environment — the original queried a
//! UI tree that finished loading at some point — during development and in
//! tests that exercise scheduling.

use std::collections::HashSet;
use std::sync::{Mutex, RwLock};
use trellis_types::presence::PresenceOracle;
use trellis_types::ready::{Job, ReadySignal};

struct Latch {
    released: bool,
    queued: Vec<Job>,
}

/// A togglable presence set plus a one-shot ready latch.
pub struct MemoryEnv {
    present: RwLock<HashSet<String>>,
    latch: Mutex<Latch>,
}

impl MemoryEnv {
    /// An environment that is ready from the start, with nothing present.
    pub fn new() -> Self {
        Self::with_readiness(true)
    }

    /// An environment that holds ready-jobs until [`MemoryEnv::mark_ready`].
    pub fn pending() -> Self {
        Self::with_readiness(false)
    }

    fn with_readiness(released: bool) -> Self {
        Self {
            present: RwLock::new(HashSet::new()),
            latch: Mutex::new(Latch {
                released,
                queued: Vec::new(),
            }),
        }
    }

    /// Mark a selector as present.
    pub fn insert(&self, selector: impl Into<String>) {
        self.present
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(selector.into());
    }

    /// Mark a selector as absent again.
    pub fn remove(&self, selector: &str) {
        self.present
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(selector);
    }

    /// Remove every present selector.
    pub fn clear(&self) {
        self.present
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }

    /// Whether the environment has become usable.
    pub fn is_ready(&self) -> bool {
        self.latch.lock().unwrap_or_else(|e| e.into_inner()).released
    }

    /// Release the ready latch, running every queued job in hand-over
    /// order. Releasing twice is a no-op for already-run jobs.
    pub fn mark_ready(&self) {
        let queued = {
            let mut latch = self.latch.lock().unwrap_or_else(|e| e.into_inner());
            latch.released = true;
            std::mem::take(&mut latch.queued)
        };
        for job in queued {
            job();
        }
    }
}

impl Default for MemoryEnv {
    fn default() -> Self {
        Self::new()
    }
}

impl PresenceOracle for MemoryEnv {
    fn exists(&self, selector: &str) -> bool {
        self.present
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .contains(selector)
    }
}

impl ReadySignal for MemoryEnv {
    fn on_ready(&self, job: Job) {
        let mut latch = self.latch.lock().unwrap_or_else(|e| e.into_inner());
        if latch.released {
            drop(latch);
            job();
        } else {
            latch.queued.push(job);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn presence_is_togglable() {
        let env = MemoryEnv::new();
        assert!(!env.exists("#module-cart"));
        env.insert("#module-cart");
        assert!(env.exists("#module-cart"));
        env.remove("#module-cart");
        assert!(!env.exists("#module-cart"));
    }

    #[test]
    fn ready_env_runs_jobs_immediately() {
        let env = MemoryEnv::new();
        let ran = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&ran);
        env.on_ready(Box::new(move || {
            seen.fetch_add(1, Ordering::SeqCst);
        }));
        assert_eq!(ran.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn pending_env_queues_jobs_until_released() {
        let env = MemoryEnv::pending();
        let order = Arc::new(Mutex::new(Vec::new()));
        for tag in ["first", "second"] {
            let order = Arc::clone(&order);
            env.on_ready(Box::new(move || {
                order.lock().unwrap().push(tag);
            }));
        }
        assert!(order.lock().unwrap().is_empty());

        env.mark_ready();
        assert_eq!(*order.lock().unwrap(), ["first", "second"]);

        // After release, new jobs run at once.
        let order_late = Arc::clone(&order);
        env.on_ready(Box::new(move || {
            order_late.lock().unwrap().push("late");
        }));
        assert_eq!(*order.lock().unwrap(), ["first", "second", "late"]);
    }
}
