//! The activation evaluator: should a node be entered, and does its budget
//! still allow it?

use crate::presence::PresenceChecker;
use trellis_types::node::{Budget, InitRule, ModuleNode, Payload};

/// Whether the node should be entered on this pass.
///
/// Evaluated as a left-to-right priority list. The order is a contract:
/// a predicate-valued rule is caller code with possible side effects, and
/// it must only run when every earlier case came up false. `force` wins
/// before the rule is even looked at, so under force a predicate is never
/// invoked.
pub(crate) fn should_activate(
    checker: &PresenceChecker,
    node: &mut ModuleNode,
    key: &str,
    depth: u32,
    payload: Option<&Payload>,
    force: bool,
) -> bool {
    // The registry root merely provides a starting point for recursion.
    if depth == 0 {
        return true;
    }
    if force {
        return true;
    }
    // Top-level modules without an explicit rule fall back to a presence
    // check on their own key.
    if depth == 1 && node.init.is_none() && checker.is_present(&[key], false).is_some() {
        return true;
    }
    if depth == 1 {
        let hit = match &node.init {
            Some(InitRule::Selector(id)) => checker.is_present(&[id.as_str()], false).is_some(),
            Some(InitRule::Selectors(ids)) => {
                let ids: Vec<&str> = ids.iter().map(String::as_str).collect();
                checker.is_present(&ids, false).is_some()
            }
            _ => false,
        };
        if hit {
            return true;
        }
    }
    // Rule-free nodes below the top level always activate.
    if depth > 1 && node.init.is_none() {
        return true;
    }
    if let Some(InitRule::Predicate(pred)) = &mut node.init {
        return pred(payload);
    }
    matches!(&node.init, Some(InitRule::Flag(true)))
}

/// Whether the node's budget allows this activation; decrements on success.
///
/// Only consulted for nodes that already passed [`should_activate`]. The
/// budget is ignored at the root and under force (no decrement either). A
/// flag budget is normalized to a count of 1 or 0 on first consult; a count
/// saturates at zero, so an exhausted node never reactivates.
pub(crate) fn consume_budget(node: &mut ModuleNode, depth: u32, force: bool) -> bool {
    if depth == 0 || force {
        return true;
    }
    match node.budget.as_mut() {
        None => true,
        Some(budget) => {
            if let Budget::Flag(flag) = *budget {
                *budget = Budget::Count(u32::from(flag));
            }
            match budget {
                Budget::Count(n) if *n > 0 => {
                    *n -= 1;
                    true
                }
                _ => false,
            }
        }
    }
}
