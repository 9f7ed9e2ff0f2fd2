//! Syntactic dead-code detection for one assembly.
//!
//! A method is dead when no `call`/`callvirt` in the assembly targets it; a
//! type is dead when no signature in the assembly mentions it. Both are plain
//! set differences with no reachability analysis from entry points.

use std::collections::{BTreeSet, HashSet};

use tracing::debug;

use crate::indexer::classify::invocations;
use crate::models::{member_full_name, AssemblyDef, DeadCodeReport};
use crate::query::references::signature_references;

pub const CAVEATS: [&str; 4] = [
    "Only direct call/callvirt instructions and member signatures are analysed.",
    "Members reached through reflection, delegates, dynamic dispatch or serialization are reported as dead.",
    "Entry points and framework callbacks are reported unless something in the assembly calls them.",
    "Callers in other assemblies are not considered.",
];

pub fn identify_dead_code(assembly: &AssemblyDef, include_private: bool) -> DeadCodeReport {
    let types = assembly.all_types();

    // Calls with a signature pin one overload; calls without one keep every
    // overload of that name alive.
    let mut called: HashSet<String> = HashSet::new();
    let mut called_any_overload: HashSet<String> = HashSet::new();
    let mut referenced: HashSet<&str> = HashSet::new();
    for ty in &types {
        for method in &ty.methods {
            for (callee, _) in invocations(method) {
                if callee.parameters.is_some() {
                    called.insert(callee.full_name());
                } else {
                    called_any_overload.insert(member_full_name(&callee.declaring_type, &callee.name));
                }
            }
        }
        for sig_ref in signature_references(ty) {
            referenced.insert(sig_ref.sig.full_name.as_str());
        }
    }

    let mut methods_considered = 0usize;
    let mut dead_methods: BTreeSet<String> = BTreeSet::new();
    let mut types_considered = 0usize;
    let mut dead_types: BTreeSet<String> = BTreeSet::new();

    for ty in &types {
        if include_private || ty.visibility.is_externally_visible() {
            types_considered += 1;
            if !referenced.contains(ty.full_name.as_str()) {
                dead_types.insert(ty.full_name.clone());
            }
        }
        for method in &ty.methods {
            if !include_private && !method.visibility.is_externally_visible() {
                continue;
            }
            methods_considered += 1;
            let full_name = method.full_name_in(&ty.full_name);
            if !called.contains(&full_name)
                && !called_any_overload.contains(&member_full_name(&ty.full_name, &method.name))
            {
                dead_methods.insert(full_name);
            }
        }
    }

    debug!(
        assembly = %assembly.name,
        include_private,
        methods_considered,
        types_considered,
        dead_methods = dead_methods.len(),
        dead_types = dead_types.len(),
        "dead code scan finished"
    );

    DeadCodeReport {
        assembly: assembly.name.clone(),
        include_private,
        dead_methods: dead_methods.into_iter().collect(),
        dead_types: dead_types.into_iter().collect(),
        methods_considered,
        types_considered,
        caveats: CAVEATS.iter().map(|c| c.to_string()).collect(),
    }
}
