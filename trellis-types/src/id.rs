//! Identifiers that flow through a dispatch pass.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Newtype strings for the three identifiers a pass carries around: which
/// application owns the tree, which top-level module a subtree belongs to,
/// and where in the hierarchy a node sits. No format is enforced; paths are
/// split on `/` at the point of use, an app id only has to be non-empty.
macro_rules! typed_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
        pub struct $name(pub String);

        impl $name {
            /// Wrap an identifier string.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Borrow the inner string.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }
    };
}

typed_id!(
    AppId,
    "Globally unique identifier for an application's dispatcher."
);
typed_id!(ModuleId, "Identifier of a top-level module.");
typed_id!(
    ModulePath,
    "Slash-delimited path of a node inside the module hierarchy."
);
