//! The presence oracle — "does this entity exist right now?"

/// Answers presence queries against the external environment.
///
/// In the original deployment this queried a live UI tree for elements
/// matching a selector-shaped identifier; the engine treats both the
/// selector and the notion of "present" as opaque.
pub trait PresenceOracle: Send + Sync {
    /// Whether an entity matching `selector` currently exists.
    fn exists(&self, selector: &str) -> bool;
}

/// Oracle that reports nothing as present.
///
/// The default when a dispatcher is built without an oracle: rule-free
/// top-level modules then never activate, which is the safe reading of
/// "no environment attached".
pub struct NullOracle;

impl PresenceOracle for NullOracle {
    fn exists(&self, _selector: &str) -> bool {
        false
    }
}
