//! The ready signal — "run this once the environment is usable."

/// A deferred unit of work.
pub type Job = Box<dyn FnOnce() + Send>;

/// Invokes a job once, when the external environment becomes usable, or
/// immediately if it already is. The wait is one-shot and non-cancelable.
pub trait ReadySignal: Send + Sync {
    /// Hand over a job to run at (or after) the ready point.
    fn on_ready(&self, job: Job);
}

/// Ready signal for an environment that is always usable: jobs run
/// immediately, on the calling thread.
pub struct ImmediateReady;

impl ReadySignal for ImmediateReady {
    fn on_ready(&self, job: Job) {
        job();
    }
}
