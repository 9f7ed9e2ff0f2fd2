//! Static type-reference discovery over member signatures.
//!
//! A type is referenced when it appears as a base type, an implemented
//! interface, a field type, a method return type or a parameter type. Matching
//! is by full-name string, so generic instantiations and array or pointer
//! forms are distinct names.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

use crate::indexer::index::{SymbolIndex, TypeSymbol};
use crate::models::{member_full_name, ReferenceContext, ReferenceEdge, TypeDef, TypeSig};

/// One type occurrence inside a type's signatures.
#[derive(Clone, Debug)]
pub struct SignatureRef<'a> {
    pub context: ReferenceContext,
    pub sig: &'a TypeSig,
    /// Type name for base/interface references, member full name otherwise.
    pub location: String,
    pub parameter: Option<&'a str>,
}

/// Every signature type of `ty`, in declaration order: base type, interfaces,
/// fields, then per method its return type followed by its parameters.
pub fn signature_references(ty: &TypeDef) -> Vec<SignatureRef<'_>> {
    let mut refs = Vec::new();
    if let Some(base) = &ty.base_type {
        refs.push(SignatureRef {
            context: ReferenceContext::BaseType,
            sig: base,
            location: ty.full_name.clone(),
            parameter: None,
        });
    }
    for interface in &ty.interfaces {
        refs.push(SignatureRef {
            context: ReferenceContext::Interface,
            sig: interface,
            location: ty.full_name.clone(),
            parameter: None,
        });
    }
    for field in &ty.fields {
        refs.push(SignatureRef {
            context: ReferenceContext::FieldType,
            sig: &field.field_type,
            location: member_full_name(&ty.full_name, &field.name),
            parameter: None,
        });
    }
    for method in &ty.methods {
        let method_name = method.full_name_in(&ty.full_name);
        if let Some(ret) = &method.return_type {
            refs.push(SignatureRef {
                context: ReferenceContext::ReturnType,
                sig: ret,
                location: method_name.clone(),
                parameter: None,
            });
        }
        for param in &method.parameters {
            refs.push(SignatureRef {
                context: ReferenceContext::ParameterType,
                sig: &param.param_type,
                location: method_name.clone(),
                parameter: Some(param.name.as_str()),
            });
        }
    }
    refs
}

/// All static references to `target` from every loaded type.
///
/// A type never counts as its own base type; every other self-reference (a
/// field of the declaring type's own type, say) is reported.
pub fn find_type_references(index: &dyn SymbolIndex, target: &TypeSymbol<'_>) -> Vec<ReferenceEdge> {
    let target_name = target.full_name();
    let mut edges = Vec::new();
    let mut types_scanned = 0usize;

    for candidate in index.all_types() {
        types_scanned += 1;
        for sig_ref in signature_references(candidate.ty) {
            if !sig_ref.sig.is(target_name) {
                continue;
            }
            if sig_ref.context == ReferenceContext::BaseType && candidate.ty.full_name == target_name {
                continue;
            }
            edges.push(ReferenceEdge {
                context: sig_ref.context,
                from_member: sig_ref.location,
                in_assembly: candidate.assembly.name.clone(),
                parameter: sig_ref.parameter.map(str::to_string),
            });
        }
    }

    debug!(
        target = target_name,
        types_scanned,
        edges = edges.len(),
        "type reference scan finished"
    );
    edges
}

/// Presentation order: assembly, then context, then location.
pub fn sort_edges(edges: &mut [ReferenceEdge]) {
    edges.sort_by(|a, b| {
        a.in_assembly
            .cmp(&b.in_assembly)
            .then(a.context.cmp(&b.context))
            .then(a.from_member.cmp(&b.from_member))
            .then(a.parameter.cmp(&b.parameter))
    });
}

#[derive(Clone, Debug, Serialize)]
pub struct ReferenceGroup {
    pub context: ReferenceContext,
    pub count: usize,
    pub edges: Vec<ReferenceEdge>,
}

/// Group edges by context in [`ReferenceContext`] order, each group sorted.
/// Empty contexts are omitted.
pub fn group_by_context(edges: &[ReferenceEdge]) -> Vec<ReferenceGroup> {
    let mut grouped: BTreeMap<ReferenceContext, Vec<ReferenceEdge>> = BTreeMap::new();
    for edge in edges {
        grouped.entry(edge.context).or_default().push(edge.clone());
    }
    grouped
        .into_iter()
        .map(|(context, mut edges)| {
            sort_edges(&mut edges);
            ReferenceGroup {
                context,
                count: edges.len(),
                edges,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indexer::index::MetadataIndex;
    use crate::models::{AssemblyDef, FieldDef, MethodDef, TypeDef};

    fn derived_index() -> MetadataIndex {
        let derived = TypeDef::new("Demo.Derived")
            .extends(TypeSig::new("Demo.Base"))
            .implements(TypeSig::new("Demo.IFoo"))
            .field(FieldDef::new("field", TypeSig::new("Demo.Base")))
            .method(
                MethodDef::new("Method")
                    .returns(TypeSig::new("Demo.Base"))
                    .param("p", TypeSig::new("Demo.Base"))
                    .body(vec![]),
            );
        MetadataIndex::new(vec![AssemblyDef::new(
            "Demo",
            vec![
                TypeDef::new("Demo.Base"),
                TypeDef::interface("Demo.IFoo"),
                derived,
            ],
        )])
    }

    fn target<'a>(index: &'a MetadataIndex, name: &str) -> TypeSymbol<'a> {
        index.resolve_type(name, None).unwrap()
    }

    #[test]
    fn base_references_cover_four_contexts() {
        let index = derived_index();
        let mut edges = find_type_references(&index, &target(&index, "Demo.Base"));
        sort_edges(&mut edges);
        let contexts: Vec<ReferenceContext> = edges.iter().map(|e| e.context).collect();
        assert_eq!(
            contexts,
            vec![
                ReferenceContext::BaseType,
                ReferenceContext::FieldType,
                ReferenceContext::ReturnType,
                ReferenceContext::ParameterType,
            ]
        );
        assert_eq!(edges[0].from_member, "Demo.Derived");
        assert_eq!(edges[1].from_member, "Demo.Derived.field");
        assert_eq!(edges[2].from_member, "Demo.Derived.Method(Demo.Base)");
        assert_eq!(edges[3].parameter.as_deref(), Some("p"));
        assert!(edges.iter().all(|e| e.in_assembly == "Demo"));
    }

    #[test]
    fn interface_reference_only_for_interface_target() {
        let index = derived_index();
        let edges = find_type_references(&index, &target(&index, "Demo.IFoo"));
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].context, ReferenceContext::Interface);
    }

    #[test]
    fn type_is_not_its_own_base() {
        let index = MetadataIndex::new(vec![AssemblyDef::new(
            "Odd",
            vec![TypeDef::new("Loop")
                .extends(TypeSig::new("Loop"))
                .field(FieldDef::new("next", TypeSig::new("Loop")))],
        )]);
        let edges = find_type_references(&index, &target(&index, "Loop"));
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].context, ReferenceContext::FieldType);
    }

    #[test]
    fn generic_instantiations_are_distinct() {
        let index = MetadataIndex::new(vec![AssemblyDef::new(
            "Gen",
            vec![
                TypeDef::new("Item"),
                TypeDef::new("Holder").field(FieldDef::new(
                    "items",
                    TypeSig::new("System.Collections.Generic.List`1<Item>"),
                )),
            ],
        )]);
        assert!(find_type_references(&index, &target(&index, "Item")).is_empty());
    }

    #[test]
    fn grouping_follows_context_order() {
        let index = derived_index();
        let edges = find_type_references(&index, &target(&index, "Demo.Base"));
        let groups = group_by_context(&edges);
        let order: Vec<ReferenceContext> = groups.iter().map(|g| g.context).collect();
        assert_eq!(
            order,
            vec![
                ReferenceContext::BaseType,
                ReferenceContext::FieldType,
                ReferenceContext::ReturnType,
                ReferenceContext::ParameterType,
            ]
        );
        assert!(groups.iter().all(|g| g.count == 1));
    }
}
