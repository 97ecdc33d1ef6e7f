#![deny(missing_docs)]
//! # trellis-types — node model and collaborator traits
//!
//! This crate defines the data model walked by the trellis dispatch engine
//! and the three collaborator seams the engine consults, so that alternate
//! environments (a live UI tree, a test fixture, a headless service) can be
//! swapped in without touching the engine.
//!
//! ## The model
//!
//! | Type | What it is |
//! |------|-----------|
//! | [`ModuleNode`] | One node of the module hierarchy: control fields + ordered children |
//! | [`NodeValue`] | A child entry: nested module, invokable action, or plain data |
//! | [`InitRule`] | The activation control: flag, selector(s), or predicate |
//! | [`Budget`] | Per-node invocation cap, decremented on each activation |
//! | [`NodeCtx`] | The write-once activation record injected on first activation |
//!
//! ## The seams
//!
//! | Trait | What it answers |
//! |-------|-----------------|
//! | [`PresenceOracle`] | "does an entity with this selector exist right now?" |
//! | [`ReadySignal`] | "run this once the environment is usable" |
//! | [`Scheduler`] | "run this after a delay" |
//!
//! Every trait is operation-defined: the engine does not care whether
//! presence means a DOM query, a registry lookup, or a hash-set probe.

pub mod error;
pub mod id;
pub mod node;
pub mod presence;
pub mod ready;
pub mod schedule;

#[cfg(feature = "test-utils")]
pub mod test_utils;

pub use error::DispatchError;
pub use id::{AppId, ModuleId, ModulePath};
pub use node::{
    dispatchable_key, ActionFn, ActionScope, Budget, InitPredicate, InitRule, ModuleNode, NodeCtx,
    NodeKind, NodeValue, Payload,
};
pub use presence::{NullOracle, PresenceOracle};
pub use ready::{ImmediateReady, Job, ReadySignal};
pub use schedule::{InlineScheduler, Scheduler};
