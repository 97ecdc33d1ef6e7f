use crate::ready::{Job, ReadySignal};
use std::sync::Mutex;

struct Latch {
    released: bool,
    queued: Vec<Job>,
}

/// Ready signal that queues jobs until [`ManualReady::release`] is called.
///
/// Jobs handed over after release run immediately. Release is one-shot.
pub struct ManualReady {
    latch: Mutex<Latch>,
}

impl ManualReady {
    /// Create an unreleased latch.
    pub fn new() -> Self {
        Self {
            latch: Mutex::new(Latch {
                released: false,
                queued: Vec::new(),
            }),
        }
    }

    /// Release the latch, running every queued job in hand-over order.
    pub fn release(&self) {
        let queued = {
            let mut latch = self.latch.lock().unwrap_or_else(|e| e.into_inner());
            latch.released = true;
            std::mem::take(&mut latch.queued)
        };
        for job in queued {
            job();
        }
    }

    /// How many jobs are waiting on the latch.
    pub fn pending(&self) -> usize {
        self.latch
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .queued
            .len()
    }
}

impl Default for ManualReady {
    fn default() -> Self {
        Self::new()
    }
}

impl ReadySignal for ManualReady {
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
