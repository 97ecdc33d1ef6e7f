use crate::node::{ActionFn, ActionScope};
use std::sync::{Arc, Mutex};

/// Records every invocation of the actions it hands out.
///
/// Each hit is recorded as `"module_id:path"`, so a test can assert both
/// how often and from where an action fired.
#[derive(Clone, Default)]
pub struct Probe {
    hits: Arc<Mutex<Vec<String>>>,
}

impl Probe {
    /// Create a probe with no recorded hits.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an action that records its invocations on this probe.
    pub fn action(&self) -> ActionFn {
        let hits = Arc::clone(&self.hits);
        Box::new(move |scope: ActionScope<'_>| {
            hits.lock()
                .unwrap_or_else(|e| e.into_inner())
                .push(format!("{}:{}", scope.module_id, scope.path));
        })
    }

    /// How many times any action from this probe has fired.
    pub fn count(&self) -> usize {
        self.hits.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// The recorded hits, in invocation order.
    pub fn hits(&self) -> Vec<String> {
        self.hits.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}
