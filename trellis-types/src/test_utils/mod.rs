//! Minimal fakes for testing.
//!
//! Available behind the `test-utils` feature flag. These are the smallest
//! implementations that prove the trait APIs are usable: a fixed presence
//! set, a ready latch that must be released by hand, a scheduler that
//! captures jobs instead of running them, and a probe action that records
//! its invocations.

mod oracle;
mod probe;
mod ready;
mod sched;

pub use oracle::StaticOracle;
pub use probe::Probe;
pub use ready::ManualReady;
pub use sched::ManualScheduler;
