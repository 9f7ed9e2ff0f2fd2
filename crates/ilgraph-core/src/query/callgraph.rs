//! Depth-bounded call graph expansion from a root method.
//!
//! Expansion is depth-first. One visited set is threaded through the whole
//! traversal, so a method reached a second time (by recursion or by a second
//! path through a diamond) becomes a `recursive` leaf instead of being
//! expanded again. Calls made through reflection, delegates or dynamic
//! dispatch are not visible in the instruction stream and never appear.

use std::collections::HashSet;

use indexmap::IndexMap;
use tracing::debug;

use crate::indexer::classify::invocations;
use crate::indexer::index::{MethodSymbol, SymbolIndex};
use crate::models::{CallGraphNode, MemberRef, NodeStatus};

pub const DEFAULT_MAX_DEPTH: u32 = 5;

/// Expand the calls made by `root` up to `max_depth` levels.
///
/// `max_depth == 0` yields the root alone with status `depth_limit`.
pub fn build_call_graph(
    index: &dyn SymbolIndex,
    root: &MethodSymbol<'_>,
    max_depth: u32,
) -> CallGraphNode {
    let mut visited: HashSet<String> = HashSet::new();
    let graph = expand(index, root, 0, 0, max_depth, &mut visited);
    debug!(
        root = %root.full_name(),
        max_depth,
        expanded = visited.len(),
        nodes = graph.node_count(),
        "call graph built"
    );
    graph
}

fn expand(
    index: &dyn SymbolIndex,
    method: &MethodSymbol<'_>,
    depth: u32,
    call_count: u32,
    max_depth: u32,
    visited: &mut HashSet<String>,
) -> CallGraphNode {
    let mut node = method_node(method, depth, call_count, NodeStatus::Expanded);
    if depth >= max_depth {
        node.status = NodeStatus::DepthLimit;
        return node;
    }
    visited.insert(node.method.clone());

    // Group call sites by callee identity, keeping first-call-site order.
    // Resolved callees are keyed by their signature-qualified name so each
    // overload is its own node.
    let mut callees: IndexMap<String, (Option<MethodSymbol<'_>>, &MemberRef, u32)> = IndexMap::new();
    for (callee, _offset) in invocations(method.method) {
        let resolved = index.resolve_method(callee, Some(&method.assembly.name));
        let key = resolved.map_or_else(|| callee.full_name(), |r| r.full_name());
        callees
            .entry(key)
            .and_modify(|(_, _, count)| *count += 1)
            .or_insert((resolved, callee, 1));
    }

    for (callee_name, (resolved, callee, count)) in callees {
        let child = match resolved {
            Some(resolved) if visited.contains(&callee_name) => {
                method_node(&resolved, depth + 1, count, NodeStatus::Recursive)
            }
            Some(resolved) => expand(index, &resolved, depth + 1, count, max_depth, visited),
            None => CallGraphNode {
                method: callee_name,
                declaring_type: callee.declaring_type.clone(),
                assembly: callee.assembly.clone(),
                depth: depth + 1,
                call_count: count,
                status: NodeStatus::External,
                calls_to: Vec::new(),
            },
        };
        node.calls_to.push(child);
    }
    node
}

fn method_node(method: &MethodSymbol<'_>, depth: u32, call_count: u32, status: NodeStatus) -> CallGraphNode {
    CallGraphNode {
        method: method.full_name(),
        declaring_type: method.declaring_type.full_name.clone(),
        assembly: Some(method.assembly.name.clone()),
        depth,
        call_count,
        status,
        calls_to: Vec::new(),
    }
}
