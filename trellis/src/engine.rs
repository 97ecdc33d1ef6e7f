//! The traversal engine: the recursive, depth-first dispatch walk.

use crate::activation::{consume_budget, should_activate};
use crate::presence::PresenceChecker;
use trellis_types::error::DispatchError;
use trellis_types::id::{AppId, ModuleId, ModulePath};
use trellis_types::node::{
    dispatchable_key, ActionScope, ModuleNode, NodeCtx, NodeKind, NodeValue, Payload,
};

/// Read-only inputs shared by every node visit of one dispatch pass.
pub(crate) struct Pass<'a> {
    pub app: &'a str,
    pub checker: &'a PresenceChecker,
    pub payload: Option<&'a Payload>,
}

/// Enter `value` as a traversable node.
///
/// This is the entry used when a pass targets a single module by path: the
/// resolved value may turn out not to be a module at all, which is the one
/// traversal error — it names the module and key for diagnosability.
pub(crate) fn run(
    pass: &Pass<'_>,
    value: &mut NodeValue,
    force: bool,
    depth: u32,
    key: &str,
    module_id: &str,
    path: &str,
    parent: Option<&str>,
) -> Result<(), DispatchError> {
    let NodeValue::Module(node) = value else {
        return Err(DispatchError::NotAModule {
            module_id: module_id.to_owned(),
            key: key.to_owned(),
            kind: value.kind(),
        });
    };
    run_node(pass, node, force, depth, key, module_id, path, parent)
}

/// Visit one node: activation decision, budget, context injection, children.
///
/// A rejection (rule or budget) skips the node and its whole subtree,
/// silently. `force` applies to this node only — it is never propagated to
/// children.
#[allow(clippy::too_many_arguments)]
pub(crate) fn run_node(
    pass: &Pass<'_>,
    node: &mut ModuleNode,
    force: bool,
    depth: u32,
    key: &str,
    module_id: &str,
    path: &str,
    parent: Option<&str>,
) -> Result<(), DispatchError> {
    if !should_activate(pass.checker, node, key, depth, pass.payload, force) {
        tracing::trace!(key, depth, "subtree skipped by activation rule");
        return Ok(());
    }
    if !consume_budget(node, depth, force) {
        tracing::trace!(key, depth, "subtree skipped, budget exhausted");
        return Ok(());
    }

    if depth > 0 {
        node.install_ctx(NodeCtx {
            app: AppId::new(pass.app),
            module: ModuleId::new(module_id),
            parent: parent.map(ModulePath::new),
        });
    }

    // Classify this node's own keys once. Reserved control fields live
    // outside `entries`, so only the private-marker convention applies.
    let keys: Vec<String> = node
        .entries
        .keys()
        .filter(|k| dispatchable_key(k, depth))
        .cloned()
        .collect();

    for k in keys {
        let Some(idx) = node.entries.get_index_of(&k) else {
            continue;
        };
        let kind = match node.entries.get_index(idx) {
            Some((_, value)) => value.kind(),
            None => continue,
        };
        match kind {
            NodeKind::Module => {
                let child_path = if depth == 0 {
                    k.clone()
                } else {
                    format!("{path}/{k}")
                };
                let child_module_id = if depth == 0 { k.as_str() } else { module_id };
                let child_parent = (depth >= 1).then_some(path);
                if let Some((_, value)) = node.entries.get_index_mut(idx) {
                    run(
                        pass,
                        value,
                        false,
                        depth + 1,
                        &k,
                        child_module_id,
                        &child_path,
                        child_parent,
                    )?;
                }
            }
            NodeKind::Action => {
                // Take the closure out of the map so the scope can borrow
                // the enclosing node; restore it at the same position.
                let (entry_key, mut action) = match node.entries.shift_remove_index(idx) {
                    Some((entry_key, NodeValue::Action(action))) => (entry_key, action),
                    Some((entry_key, other)) => {
                        node.entries.shift_insert(idx, entry_key, other);
                        continue;
                    }
                    None => continue,
                };
                action(ActionScope {
                    app: pass.app,
                    module_id,
                    path,
                    payload: pass.payload,
                    node,
                });
                node.entries
                    .shift_insert(idx, entry_key, NodeValue::Action(action));
            }
            NodeKind::Data => {}
        }
    }
    Ok(())
}
