use crate::presence::PresenceOracle;
use std::collections::HashSet;

/// Oracle backed by a fixed set of present selectors.
pub struct StaticOracle {
    present: HashSet<String>,
}

impl StaticOracle {
    /// Build an oracle that reports exactly these selectors as present.
    pub fn new<I, S>(present: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            present: present.into_iter().map(Into::into).collect(),
        }
    }
}

impl PresenceOracle for StaticOracle {
    fn exists(&self, selector: &str) -> bool {
        self.present.contains(selector)
    }
}
