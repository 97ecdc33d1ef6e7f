//! Error types for the dispatcher.
//!
//! All errors are raised synchronously at the point of detection and
//! propagate up the call stack — there is no internal retry or recovery.

use crate::node::NodeKind;
use thiserror::Error;

/// Everything that can go wrong constructing, registering with, or
/// dispatching through a dispatcher.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The application id handed to the constructor was empty.
    #[error("app id must be a non-empty string")]
    EmptyAppId,

    /// A module path was empty where a name was required.
    #[error("empty module path")]
    EmptyModulePath,

    /// No dispatcher is registered under the given application id.
    #[error("application not found: {0}")]
    AppNotFound(String),

    /// No module exists at the given path.
    #[error("module not found: {0}")]
    ModuleNotFound(String),

    /// A traversable module node was expected, but the value at this
    /// position is something else.
    #[error("expected a module node, {kind} given (module: {module_id}, key: {key})")]
    NotAModule {
        /// Id of the module the pass was targeting.
        module_id: String,
        /// Key of the offending value.
        key: String,
        /// What the value actually is.
        kind: NodeKind,
    },

    /// A settings patch did not deserialize into valid settings.
    #[error("invalid settings: {0}")]
    InvalidSettings(String),
}
