//! Type dependency paths and the assembly-level dependency matrix.

use std::collections::{BTreeMap, BTreeSet, HashSet, VecDeque};

use indexmap::IndexSet;
use tracing::debug;

use crate::indexer::index::{SymbolIndex, TypeSymbol};
use crate::models::{TypeDef, TypeSig};
use crate::query::references::signature_references;

pub const DEFAULT_MAX_PATH_LENGTH: usize = 10;

/// Direct dependencies of `ty`: base type, interfaces, field types, return
/// types and parameter types, deduplicated by full name in first-seen order.
pub fn type_dependencies(ty: &TypeDef) -> Vec<&TypeSig> {
    let mut seen: IndexSet<&str> = IndexSet::new();
    signature_references(ty)
        .into_iter()
        .filter(|sig_ref| seen.insert(sig_ref.sig.full_name.as_str()))
        .map(|sig_ref| sig_ref.sig)
        .collect()
}

/// Breadth-first search for dependency paths from `source` to `target`.
///
/// Path length counts hops, so `[A, B, C]` has length 2. Each intermediate
/// type is expanded once, along the first path that discovers it; the target
/// itself is never marked visited, so every frontier node that depends on it
/// contributes a path. `source == target` yields the single path `[source]`.
pub fn find_dependency_paths(
    index: &dyn SymbolIndex,
    source: &TypeSymbol<'_>,
    target: &TypeSymbol<'_>,
    max_path_length: usize,
) -> Vec<Vec<String>> {
    let source_name = source.full_name();
    let target_name = target.full_name();
    if source_name == target_name {
        return vec![vec![source_name.to_string()]];
    }

    let mut visited: HashSet<String> = HashSet::new();
    let paths = bfs_paths(index, source, target_name, max_path_length, &mut visited);
    debug!(
        source = source_name,
        target = target_name,
        max_path_length,
        visited = visited.len(),
        paths = paths.len(),
        "dependency path search finished"
    );
    paths
}

fn bfs_paths<'a>(
    index: &'a dyn SymbolIndex,
    source: &TypeSymbol<'a>,
    target_name: &str,
    max_path_length: usize,
    visited: &mut HashSet<String>,
) -> Vec<Vec<String>> {
    let mut paths = Vec::new();
    let mut queue: VecDeque<(TypeSymbol<'a>, Vec<String>)> = VecDeque::new();

    visited.insert(source.full_name().to_string());
    queue.push_back((*source, vec![source.full_name().to_string()]));

    while let Some((current, path)) = queue.pop_front() {
        // `path.len()` is the hop count of any path extended from here.
        let hops = path.len();
        if hops > max_path_length {
            continue;
        }
        for dep in type_dependencies(current.ty) {
            if dep.is(target_name) {
                let mut found = path.clone();
                found.push(target_name.to_string());
                paths.push(found);
                continue;
            }
            if visited.contains(&dep.full_name) {
                continue;
            }
            let Some(next) = index.resolve_sig(dep, &current.assembly.name) else {
                continue;
            };
            visited.insert(dep.full_name.clone());
            let mut next_path = path.clone();
            next_path.push(dep.full_name.clone());
            queue.push_back((next, next_path));
        }
    }
    paths
}

/// Direct assembly-to-assembly dependencies. Every loaded assembly is a key;
/// references whose owner cannot be determined are skipped.
pub fn compute_assembly_dependencies(index: &dyn SymbolIndex) -> BTreeMap<String, BTreeSet<String>> {
    let mut matrix: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    let mut unresolved = 0usize;

    for assembly in index.assemblies() {
        let deps = matrix.entry(assembly.name.clone()).or_default();
        for ty in assembly.all_types() {
            for sig_ref in signature_references(ty) {
                match index.owning_assembly_of(sig_ref.sig, &assembly.name) {
                    Some(owner) if !owner.eq_ignore_ascii_case(&assembly.name) => {
                        deps.insert(owner);
                    }
                    Some(_) => {}
                    None => unresolved += 1,
                }
            }
        }
    }

    debug!(
        assemblies = matrix.len(),
        edges = matrix.values().map(BTreeSet::len).sum::<usize>(),
        unresolved,
        "assembly dependency matrix built"
    );
    matrix
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indexer::index::MetadataIndex;
    use crate::models::{AssemblyDef, FieldDef, MethodDef, TypeDef};

    fn chain_index() -> MetadataIndex {
        MetadataIndex::new(vec![AssemblyDef::new(
            "Chain",
            vec![
                TypeDef::new("A").field(FieldDef::new("b", TypeSig::new("B"))),
                TypeDef::new("B").field(FieldDef::new("c", TypeSig::new("C"))),
                TypeDef::new("C"),
            ],
        )])
    }

    fn ty<'a>(index: &'a MetadataIndex, name: &str) -> TypeSymbol<'a> {
        index.resolve_type(name, None).unwrap()
    }

    #[test]
    fn dependencies_are_deduplicated() {
        let t = TypeDef::new("T")
            .extends(TypeSig::new("Base"))
            .field(FieldDef::new("x", TypeSig::new("Base")))
            .method(
                MethodDef::new("M")
                    .returns(TypeSig::new("R"))
                    .param("a", TypeSig::new("Base"))
                    .param("b", TypeSig::new("R")),
            );
        let names: Vec<&str> = type_dependencies(&t)
            .into_iter()
            .map(|sig| sig.full_name.as_str())
            .collect();
        assert_eq!(names, vec!["Base", "R"]);
    }

    #[test]
    fn chain_path_found_within_limit() {
        let index = chain_index();
        let paths = find_dependency_paths(&index, &ty(&index, "A"), &ty(&index, "C"), 10);
        assert_eq!(paths, vec![vec!["A", "B", "C"]]);
    }

    #[test]
    fn chain_path_too_long_for_one_hop() {
        let index = chain_index();
        assert!(find_dependency_paths(&index, &ty(&index, "A"), &ty(&index, "C"), 1).is_empty());
        assert_eq!(
            find_dependency_paths(&index, &ty(&index, "A"), &ty(&index, "C"), 2).len(),
            1
        );
        assert_eq!(
            find_dependency_paths(&index, &ty(&index, "A"), &ty(&index, "B"), 1),
            vec![vec!["A", "B"]]
        );
    }

    #[test]
    fn same_type_is_trivial_path() {
        let index = chain_index();
        assert_eq!(
            find_dependency_paths(&index, &ty(&index, "B"), &ty(&index, "B"), 0),
            vec![vec!["B"]]
        );
    }

    #[test]
    fn cycles_terminate() {
        let index = MetadataIndex::new(vec![AssemblyDef::new(
            "Cycle",
            vec![
                TypeDef::new("A").field(FieldDef::new("b", TypeSig::new("B"))),
                TypeDef::new("B").field(FieldDef::new("a", TypeSig::new("A"))),
                TypeDef::new("Z"),
            ],
        )]);
        assert!(find_dependency_paths(&index, &ty(&index, "A"), &ty(&index, "Z"), 32).is_empty());
    }

    #[test]
    fn converging_paths_to_target_are_all_kept() {
        let index = MetadataIndex::new(vec![AssemblyDef::new(
            "Fan",
            vec![
                TypeDef::new("S")
                    .field(FieldDef::new("l", TypeSig::new("L")))
                    .field(FieldDef::new("r", TypeSig::new("R"))),
                TypeDef::new("L").field(FieldDef::new("t", TypeSig::new("T"))),
                TypeDef::new("R").field(FieldDef::new("t", TypeSig::new("T"))),
                TypeDef::new("T"),
            ],
        )]);
        let paths = find_dependency_paths(&index, &ty(&index, "S"), &ty(&index, "T"), 10);
        assert_eq!(paths, vec![vec!["S", "L", "T"], vec!["S", "R", "T"]]);
    }

    #[test]
    fn assembly_matrix_has_direct_cross_edges_only() {
        let index = MetadataIndex::new(vec![
            AssemblyDef::new(
                "App",
                vec![TypeDef::new("App.Main")
                    .extends(TypeSig::scoped("System.Object", "mscorlib"))
                    .field(FieldDef::new("svc", TypeSig::new("Lib.Service")))
                    .field(FieldDef::new("self", TypeSig::new("App.Main")))],
            ),
            AssemblyDef::new(
                "Lib",
                vec![TypeDef::new("Lib.Service").field(FieldDef::new("name", TypeSig::new("System.String")))],
            ),
        ]);
        let matrix = compute_assembly_dependencies(&index);
        let app: Vec<&str> = matrix["App"].iter().map(String::as_str).collect();
        assert_eq!(app, vec!["Lib", "mscorlib"]);
        assert!(matrix["Lib"].is_empty());
        assert_eq!(matrix.len(), 2);
    }
}
