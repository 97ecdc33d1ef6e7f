//! The module hierarchy walked by the dispatch engine.
//!
//! A [`ModuleNode`] is one node of a caller-built tree. Control fields
//! (`init`, `budget`) are typed struct fields rather than magic keys, so a
//! node's shape is a closed set of variants: nested module, invokable
//! action, or plain data. The activation record ([`NodeCtx`]) is private and
//! write-once — its presence is the idempotency guard for context injection.

use crate::id::{AppId, ModuleId, ModulePath};
use indexmap::IndexMap;
use std::fmt;

/// The payload handed to predicate rules and actions during a dispatch pass.
pub type Payload = serde_json::Value;

/// An invokable leaf. Receives the enclosing node through [`ActionScope`].
pub type ActionFn = Box<dyn FnMut(ActionScope<'_>) + Send>;

/// A caller-supplied activation predicate. Receives the dispatch payload.
pub type InitPredicate = Box<dyn FnMut(Option<&Payload>) -> bool + Send>;

/// What an action sees when it is invoked.
///
/// The scope borrows the tree for the duration of the call: `node` is the
/// enclosing module node, mutable so the action can stash state in it. An
/// action may trigger a follow-up pass on its own dispatcher (looked up via
/// the `app` id); the tree is locked for the whole pass, so the follow-up is
/// parked and runs once the current walk finishes.
pub struct ActionScope<'a> {
    /// Id of the application whose dispatcher is running this pass.
    pub app: &'a str,
    /// Id of the nearest enclosing top-level module.
    pub module_id: &'a str,
    /// Slash path of the enclosing node.
    pub path: &'a str,
    /// The dispatch payload, if one was provided.
    pub payload: Option<&'a Payload>,
    /// The enclosing node.
    pub node: &'a mut ModuleNode,
}

/// The activation control of a node.
///
/// Evaluated by the engine as an ordered priority list; see the activation
/// evaluator for the exact case order. A `Predicate` may carry side effects,
/// so it is only invoked when every earlier case came up false.
pub enum InitRule {
    /// Activate iff strictly `true`.
    Flag(bool),
    /// At depth 1: activate iff the presence oracle reports this selector.
    Selector(String),
    /// At depth 1: activate iff any of these selectors is present.
    Selectors(Vec<String>),
    /// Activate iff the predicate returns `true` for the dispatch payload.
    Predicate(InitPredicate),
}

impl InitRule {
    /// Build a predicate rule from a closure.
    pub fn predicate(f: impl FnMut(Option<&Payload>) -> bool + Send + 'static) -> Self {
        Self::Predicate(Box::new(f))
    }
}

impl fmt::Debug for InitRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Flag(v) => f.debug_tuple("Flag").field(v).finish(),
            Self::Selector(s) => f.debug_tuple("Selector").field(s).finish(),
            Self::Selectors(v) => f.debug_tuple("Selectors").field(v).finish(),
            Self::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

impl From<bool> for InitRule {
    fn from(v: bool) -> Self {
        Self::Flag(v)
    }
}

impl From<&str> for InitRule {
    fn from(s: &str) -> Self {
        Self::Selector(s.to_owned())
    }
}

impl From<String> for InitRule {
    fn from(s: String) -> Self {
        Self::Selector(s)
    }
}

impl From<Vec<String>> for InitRule {
    fn from(v: Vec<String>) -> Self {
        Self::Selectors(v)
    }
}

/// Per-node invocation cap.
///
/// A `Flag` is normalized to `Count(1)` or `Count(0)` the first time the
/// budget is consulted. A `Count` is decremented on every allowed activation
/// and saturates at zero — once exhausted, the node never reactivates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Budget {
    /// Shorthand: `true` means "once", `false` means "never".
    Flag(bool),
    /// Activate at most this many more times.
    Count(u32),
}

impl From<bool> for Budget {
    fn from(v: bool) -> Self {
        Self::Flag(v)
    }
}

impl From<u32> for Budget {
    fn from(n: u32) -> Self {
        Self::Count(n)
    }
}

/// The activation record injected into a node on its first activation.
///
/// Stands in for the original's injected object references: the application
/// id points back to the owning dispatcher (fetchable from the process
/// registry), the module id names the nearest enclosing top-level module
/// (the node's own id if it *is* top-level), and `parent` is the path of
/// the node whose activation reached this one, when such a parent exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeCtx {
    /// Id of the owning application.
    pub app: AppId,
    /// Id of the nearest enclosing top-level module.
    pub module: ModuleId,
    /// Path of the immediate parent node that activated this one.
    pub parent: Option<ModulePath>,
}

/// Coarse classification of a node entry, decided once per key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// A nested [`ModuleNode`].
    Module,
    /// An invokable action.
    Action,
    /// Plain data; never recursed into or invoked.
    Data,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Module => "module",
            Self::Action => "action",
            Self::Data => "data",
        })
    }
}

/// A child entry of a [`ModuleNode`].
pub enum NodeValue {
    /// A nested module, recursed into when its key is eligible.
    Module(ModuleNode),
    /// An action, invoked with the enclosing node when its key is eligible.
    Action(ActionFn),
    /// Plain data carried on the node; ignored by traversal.
    Data(Payload),
}

impl NodeValue {
    /// Classify this entry.
    pub fn kind(&self) -> NodeKind {
        match self {
            Self::Module(_) => NodeKind::Module,
            Self::Action(_) => NodeKind::Action,
            Self::Data(_) => NodeKind::Data,
        }
    }
}

impl fmt::Debug for NodeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Module(node) => f.debug_tuple("Module").field(node).finish(),
            Self::Action(_) => f.write_str("Action(..)"),
            Self::Data(v) => f.debug_tuple("Data").field(v).finish(),
        }
    }
}

impl From<ModuleNode> for NodeValue {
    fn from(node: ModuleNode) -> Self {
        Self::Module(node)
    }
}

/// One node of the module hierarchy.
///
/// Children live in an ordered map; a dispatch pass visits them in insertion
/// order, depth-first. Nodes are built by caller code and registered with a
/// dispatcher before the first pass — the engine only reads, decorates
/// (budget, activation record), and invokes them.
#[derive(Default)]
pub struct ModuleNode {
    /// Activation control. Absent means "rule-free": top-level nodes fall
    /// back to a presence check on their own key, deeper nodes activate
    /// unconditionally.
    pub init: Option<InitRule>,
    /// Invocation cap. Absent means unlimited.
    pub budget: Option<Budget>,
    /// Write-once activation record; see [`ModuleNode::install_ctx`].
    ctx: Option<NodeCtx>,
    /// The node's children, in activation order.
    pub entries: IndexMap<String, NodeValue>,
}

impl ModuleNode {
    /// Create an empty node.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the activation control.
    #[must_use]
    pub fn with_init(mut self, rule: impl Into<InitRule>) -> Self {
        self.init = Some(rule.into());
        self
    }

    /// Set the invocation cap.
    #[must_use]
    pub fn with_budget(mut self, budget: impl Into<Budget>) -> Self {
        self.budget = Some(budget.into());
        self
    }

    /// Add a nested module under `key`.
    #[must_use]
    pub fn module(mut self, key: impl Into<String>, node: ModuleNode) -> Self {
        self.entries.insert(key.into(), NodeValue::Module(node));
        self
    }

    /// Add an action under `key`.
    #[must_use]
    pub fn action(
        mut self,
        key: impl Into<String>,
        f: impl FnMut(ActionScope<'_>) + Send + 'static,
    ) -> Self {
        self.entries.insert(key.into(), NodeValue::Action(Box::new(f)));
        self
    }

    /// Add a plain data entry under `key`.
    #[must_use]
    pub fn data(mut self, key: impl Into<String>, value: impl Into<Payload>) -> Self {
        self.entries.insert(key.into(), NodeValue::Data(value.into()));
        self
    }

    /// The activation record, if this node has been activated before.
    pub fn ctx(&self) -> Option<&NodeCtx> {
        self.ctx.as_ref()
    }

    /// Install the activation record, unless one is already present.
    ///
    /// Returns `true` if the record was written. A record survives for the
    /// node's lifetime; later passes never overwrite it.
    pub fn install_ctx(&mut self, ctx: NodeCtx) -> bool {
        if self.ctx.is_some() {
            return false;
        }
        self.ctx = Some(ctx);
        true
    }
}

impl fmt::Debug for ModuleNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleNode")
            .field("init", &self.init)
            .field("budget", &self.budget)
            .field("ctx", &self.ctx)
            .field("entries", &self.entries)
            .finish()
    }
}

/// Whether `key` is eligible for dispatch at the given depth.
///
/// At depth 0 (the registry root) every key is eligible. Below that, only
/// keys whose first byte is the private marker `_` and whose second byte is
/// not — double-marker keys are reserved and must never be re-entered, and
/// unmarked keys are plain members.
pub fn dispatchable_key(key: &str, depth: u32) -> bool {
    if depth == 0 {
        return true;
    }
    let bytes = key.as_bytes();
    bytes.first() == Some(&b'_') && bytes.get(1) != Some(&b'_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_key_is_dispatchable_at_the_root() {
        for key in ["plain", "_single", "__double", ""] {
            assert!(dispatchable_key(key, 0), "{key:?}");
        }
    }

    #[test]
    fn only_single_marker_keys_are_dispatchable_below_the_root() {
        assert!(dispatchable_key("_sub", 1));
        assert!(dispatchable_key("_", 3));
        assert!(!dispatchable_key("plain", 1));
        assert!(!dispatchable_key("__reserved", 1));
        assert!(!dispatchable_key("__reserved", 7));
        assert!(!dispatchable_key("", 1));
    }

    #[test]
    fn entries_keep_insertion_order() {
        let node = ModuleNode::new()
            .data("_z", 1)
            .data("_a", 2)
            .data("_m", 3);
        let keys: Vec<&str> = node.entries.keys().map(String::as_str).collect();
        assert_eq!(keys, ["_z", "_a", "_m"]);
    }

    #[test]
    fn activation_record_is_write_once() {
        let mut node = ModuleNode::new();
        assert!(node.ctx().is_none());

        let first = NodeCtx {
            app: AppId::new("app"),
            module: ModuleId::new("a"),
            parent: None,
        };
        assert!(node.install_ctx(first.clone()));

        let second = NodeCtx {
            app: AppId::new("app"),
            module: ModuleId::new("b"),
            parent: Some(ModulePath::new("a/_x")),
        };
        assert!(!node.install_ctx(second));
        assert_eq!(node.ctx(), Some(&first));
    }

    #[test]
    fn node_kind_classification() {
        let node = ModuleNode::new()
            .module("_m", ModuleNode::new())
            .action("_f", |_| {})
            .data("_d", serde_json::json!({"k": 1}));
        let kinds: Vec<NodeKind> = node.entries.values().map(NodeValue::kind).collect();
        assert_eq!(kinds, [NodeKind::Module, NodeKind::Action, NodeKind::Data]);
    }
}
