use crate::ready::Job;
use crate::schedule::Scheduler;
use std::sync::Mutex;
use std::time::Duration;

/// Scheduler that captures jobs instead of running them.
///
/// Tests drain the queue explicitly with [`ManualScheduler::run_all`], so
/// "nothing happened yet" can be asserted between the dispatch call and the
/// deferred pass.
pub struct ManualScheduler {
    queued: Mutex<Vec<(Duration, Job)>>,
}

impl ManualScheduler {
    /// Create an empty scheduler.
    pub fn new() -> Self {
        Self {
            queued: Mutex::new(Vec::new()),
        }
    }

    /// How many jobs are waiting.
    pub fn pending(&self) -> usize {
        self.queued
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    /// The delays of the waiting jobs, in hand-over order.
    pub fn delays(&self) -> Vec<Duration> {
        self.queued
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .map(|(delay, _)| *delay)
            .collect()
    }

    /// Run every captured job in hand-over order; returns how many ran.
    pub fn run_all(&self) -> usize {
        let queued = std::mem::take(&mut *self.queued.lock().unwrap_or_else(|e| e.into_inner()));
        let count = queued.len();
        for (_, job) in queued {
            job();
        }
        count
    }
}

impl Default for ManualScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&self, delay: Duration, job: Job) {
        self.queued
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((delay, job));
    }
}
