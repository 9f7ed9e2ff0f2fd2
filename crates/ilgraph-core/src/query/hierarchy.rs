//! Inheritance view of a single type.

use std::collections::HashSet;

use crate::indexer::index::{SymbolIndex, TypeSymbol};
use crate::models::{TypeHierarchy, TypeLocation};

/// Base-type chain, declared interfaces, and the direct subtypes and
/// implementors of `target` across every loaded assembly.
///
/// The chain includes the first unresolvable base (usually a framework type)
/// and stops there. A cyclic chain stops at the first repeat.
pub fn type_hierarchy(index: &dyn SymbolIndex, target: &TypeSymbol<'_>) -> TypeHierarchy {
    let target_name = target.full_name();

    let mut base_chain = Vec::new();
    let mut seen: HashSet<&str> = HashSet::from([target_name]);
    let mut current = *target;
    loop {
        let ty = current.ty;
        let Some(base) = ty.base_type.as_ref() else {
            break;
        };
        if !seen.insert(base.full_name.as_str()) {
            break;
        }
        base_chain.push(base.full_name.clone());
        match index.resolve_sig(base, &current.assembly.name) {
            Some(next) => current = next,
            None => break,
        }
    }

    let interfaces = target
        .ty
        .interfaces
        .iter()
        .map(|sig| sig.full_name.clone())
        .collect();

    let mut derived_types = Vec::new();
    let mut implementors = Vec::new();
    for candidate in index.all_types() {
        let location = || TypeLocation {
            full_name: candidate.ty.full_name.clone(),
            assembly: candidate.assembly.name.clone(),
        };
        if candidate.ty.full_name != target_name
            && candidate.ty.base_type.as_ref().is_some_and(|b| b.is(target_name))
        {
            derived_types.push(location());
        }
        if candidate.ty.interfaces.iter().any(|i| i.is(target_name)) {
            implementors.push(location());
        }
    }
    sort_locations(&mut derived_types);
    sort_locations(&mut implementors);

    TypeHierarchy {
        full_name: target_name.to_string(),
        assembly: target.assembly.name.clone(),
        base_chain,
        interfaces,
        derived_types,
        implementors,
    }
}

fn sort_locations(locations: &mut [TypeLocation]) {
    locations.sort_by(|a, b| {
        a.assembly
            .cmp(&b.assembly)
            .then(a.full_name.cmp(&b.full_name))
    });
}
