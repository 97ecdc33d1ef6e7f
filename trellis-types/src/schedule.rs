//! The scheduler — "run this after a delay."

use crate::ready::Job;
use std::time::Duration;

/// Defers a job by a queue delay. A zero delay still means "not now":
/// implementations should push the job past the current unit of work.
pub trait Scheduler: Send + Sync {
    /// Run `job` after `delay`.
    fn schedule(&self, delay: Duration, job: Job);
}

/// Scheduler that ignores the delay and runs jobs inline, on the calling
/// thread. Useful where no runtime is available and deferral is not needed.
pub struct InlineScheduler;

impl Scheduler for InlineScheduler {
    fn schedule(&self, _delay: Duration, job: Job) {
        job();
    }
}
