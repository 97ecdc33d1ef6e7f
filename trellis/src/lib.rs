#![deny(missing_docs)]
//! # trellis — conditional-activation dispatcher
//!
//! Walks a caller-supplied, arbitrarily nested hierarchy of named modules
//! and selectively invokes the actions found inside them, based on per-node
//! activation rules, an external presence check, and a per-node invocation
//! budget.
//!
//! A [`Dispatcher`] owns one module tree per application id. A dispatch
//! pass is a single-threaded, depth-first walk: at every node the
//! activation evaluator decides entry (presence of the node's key or
//! selector in the environment, a caller predicate, or a plain flag), the
//! budget is consumed, a write-once activation record is injected, and
//! eligible children — keys carrying the single private-marker prefix —
//! are recursed into or invoked.
//!
//! ```no_run
//! use trellis::{Dispatcher, DispatchOptions, Options, types::ModuleNode};
//!
//! let app = Dispatcher::new("shop", Options::default())?;
//! app.set_module(
//!     "cart",
//!     ModuleNode::new().action("_bind", |scope| {
//!         println!("cart bound in {}", scope.app);
//!     }),
//! )?;
//! app.dispatch(DispatchOptions::default())?;
//! # Ok::<(), trellis::types::DispatchError>(())
//! ```

mod activation;
mod engine;

pub mod dispatcher;
pub mod presence;
pub mod settings;

pub use dispatcher::{DispatchOptions, Dispatcher, Options};
pub use presence::{PresenceChecker, PresenceOverride};
pub use settings::{DispatchPolicy, PresencePolicy, Settings};

/// Re-export of the model and collaborator traits.
pub use trellis_types as types;
