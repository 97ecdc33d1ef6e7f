#![deny(missing_docs)]
//! Tokio-backed implementation of the trellis [`Scheduler`] seam.
//!
//! Spawns each job onto the current Tokio runtime after sleeping out the
//! queue delay. A zero delay still goes through the spawn, which pushes the
//! job past the current unit of work — the contract the dispatcher relies
//! on for "queue: 0".

use std::time::Duration;
use trellis_types::ready::Job;
use trellis_types::schedule::Scheduler;

/// Scheduler that defers jobs via `tokio::spawn` + `tokio::time::sleep`.
///
/// Must be used from within a Tokio runtime; `schedule` panics otherwise,
/// the same way `tokio::spawn` does.
pub struct TokioScheduler;

impl Scheduler for TokioScheduler {
    fn schedule(&self, delay: Duration, job: Job) {
        tokio::spawn(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            job();
        });
    }
}
