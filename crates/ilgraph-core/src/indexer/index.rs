//! Read-only symbol index over loaded assemblies.
//!
//! [`SymbolIndex`] is the seam between the analysis engines and whatever owns
//! the metadata. Every query engine borrows symbols through it and never
//! mutates them. [`MetadataIndex`] is the in-memory implementation used by the
//! loader, the store, and the tests.

use std::collections::HashMap;

use crate::models::{
    member_full_name, AssemblyDef, FieldDef, MemberRef, MethodDef, TypeDef, TypeSig,
};

// ---------------------------------------------------------------------------
// Symbol handles
// ---------------------------------------------------------------------------

/// A type together with the assembly that declares it.
#[derive(Clone, Copy, Debug)]
pub struct TypeSymbol<'a> {
    pub assembly: &'a AssemblyDef,
    pub ty: &'a TypeDef,
}

impl<'a> TypeSymbol<'a> {
    pub fn full_name(&self) -> &'a str {
        &self.ty.full_name
    }

    pub fn methods(&self) -> impl Iterator<Item = MethodSymbol<'a>> + 'a {
        let assembly = self.assembly;
        let ty = self.ty;
        ty.methods.iter().map(move |method| MethodSymbol {
            assembly,
            declaring_type: ty,
            method,
        })
    }
}

/// A method together with its declaring type and assembly.
#[derive(Clone, Copy, Debug)]
pub struct MethodSymbol<'a> {
    pub assembly: &'a AssemblyDef,
    pub declaring_type: &'a TypeDef,
    pub method: &'a MethodDef,
}

impl MethodSymbol<'_> {
    /// Signature-qualified: `Type.Name(P1,P2)`.
    pub fn full_name(&self) -> String {
        self.method.full_name_in(&self.declaring_type.full_name)
    }
}

/// A field together with its declaring type and assembly.
#[derive(Clone, Copy, Debug)]
pub struct FieldSymbol<'a> {
    pub assembly: &'a AssemblyDef,
    pub declaring_type: &'a TypeDef,
    pub field: &'a FieldDef,
}

impl FieldSymbol<'_> {
    pub fn full_name(&self) -> String {
        member_full_name(&self.declaring_type.full_name, &self.field.name)
    }
}

// ---------------------------------------------------------------------------
// SymbolIndex
// ---------------------------------------------------------------------------

/// Read-only queries over assemblies, types and members.
///
/// Only [`SymbolIndex::assemblies`] is required; the lookups have scanning
/// defaults that implementations may replace with indexed versions.
pub trait SymbolIndex: Send + Sync {
    fn assemblies(&self) -> &[AssemblyDef];

    fn find_assembly_by_name(&self, name: &str, case_insensitive: bool) -> Option<&AssemblyDef> {
        let name = name.trim();
        self.assemblies().iter().find(|assembly| {
            if case_insensitive {
                assembly.name.eq_ignore_ascii_case(name)
            } else {
                assembly.name == name
            }
        })
    }

    /// Look a type up inside one assembly.
    ///
    /// An exact match compares full names. A loose match falls back to a
    /// case-insensitive comparison of the full name, then of the simple name.
    fn find_type_in_assembly<'a>(
        &'a self,
        assembly: &'a AssemblyDef,
        full_name: &str,
        exact_match: bool,
    ) -> Option<TypeSymbol<'a>> {
        let types = assembly.all_types();
        let found = types
            .iter()
            .copied()
            .find(|ty| ty.full_name == full_name)
            .or_else(|| {
                if exact_match {
                    return None;
                }
                types
                    .iter()
                    .copied()
                    .find(|ty| ty.full_name.eq_ignore_ascii_case(full_name))
                    .or_else(|| {
                        types
                            .iter()
                            .copied()
                            .find(|ty| ty.name().eq_ignore_ascii_case(full_name))
                    })
            })?;
        Some(TypeSymbol { assembly, ty: found })
    }

    /// Resolve a type by full name, preferring `preferred_assembly` when it
    /// declares the name.
    fn resolve_type(&self, full_name: &str, preferred_assembly: Option<&str>) -> Option<TypeSymbol<'_>> {
        if let Some(preferred) = preferred_assembly {
            if let Some(assembly) = self.find_assembly_by_name(preferred, true) {
                if let Some(found) = self.find_type_in_assembly(assembly, full_name, true) {
                    return Some(found);
                }
            }
        }
        self.assemblies()
            .iter()
            .find_map(|assembly| self.find_type_in_assembly(assembly, full_name, true))
    }

    /// Resolve a signature type, honouring its recorded scope first.
    fn resolve_sig(&self, sig: &TypeSig, referencing_assembly: &str) -> Option<TypeSymbol<'_>> {
        let scope = sig.assembly.as_deref().unwrap_or(referencing_assembly);
        self.resolve_type(&sig.full_name, Some(scope))
    }

    /// Resolve a method reference. A reference without a signature resolves
    /// to the first overload with that name.
    fn resolve_method(&self, member: &MemberRef, context_assembly: Option<&str>) -> Option<MethodSymbol<'_>> {
        let scope = member.assembly.as_deref().or(context_assembly);
        let owner = self.resolve_type(&member.declaring_type, scope)?;
        let method = owner.ty.methods.iter().find(|m| member.targets(m))?;
        Some(MethodSymbol {
            assembly: owner.assembly,
            declaring_type: owner.ty,
            method,
        })
    }

    fn resolve_field(&self, member: &MemberRef, context_assembly: Option<&str>) -> Option<FieldSymbol<'_>> {
        let scope = member.assembly.as_deref().or(context_assembly);
        let owner = self.resolve_type(&member.declaring_type, scope)?;
        let field = owner.ty.fields.iter().find(|f| f.name == member.name)?;
        Some(FieldSymbol {
            assembly: owner.assembly,
            declaring_type: owner.ty,
            field,
        })
    }

    /// Name of the assembly that owns `sig`, or `None` when it is not loaded
    /// and carries no explicit scope.
    fn owning_assembly_of(&self, sig: &TypeSig, referencing_assembly: &str) -> Option<String> {
        if let Some(scope) = &sig.assembly {
            return Some(scope.clone());
        }
        self.resolve_type(&sig.full_name, Some(referencing_assembly))
            .map(|found| found.assembly.name.clone())
    }

    /// Every type of every assembly, nested types included.
    fn all_types(&self) -> Vec<TypeSymbol<'_>> {
        self.assemblies()
            .iter()
            .flat_map(|assembly| {
                assembly
                    .all_types()
                    .into_iter()
                    .map(move |ty| TypeSymbol { assembly, ty })
            })
            .collect()
    }

    /// Every method with a body, across all assemblies.
    fn all_method_bodies(&self) -> Vec<MethodSymbol<'_>> {
        self.all_types()
            .into_iter()
            .flat_map(|ty| ty.methods())
            .filter(|m| m.method.has_body())
            .collect()
    }
}

// ---------------------------------------------------------------------------
// MetadataIndex
// ---------------------------------------------------------------------------

/// Position of a type inside an assembly: module index, top-level type index,
/// then one index per nesting level.
type TypePath = Vec<usize>;

/// In-memory [`SymbolIndex`] with a full-name lookup table.
#[derive(Debug, Default)]
pub struct MetadataIndex {
    assemblies: Vec<AssemblyDef>,
    type_lookup: HashMap<String, Vec<(usize, TypePath)>>,
}

impl MetadataIndex {
    pub fn new(assemblies: Vec<AssemblyDef>) -> Self {
        let mut type_lookup: HashMap<String, Vec<(usize, TypePath)>> = HashMap::new();
        for (asm_idx, assembly) in assemblies.iter().enumerate() {
            for (mod_idx, module) in assembly.modules.iter().enumerate() {
                for (type_idx, ty) in module.types.iter().enumerate() {
                    register_type(&mut type_lookup, asm_idx, vec![mod_idx, type_idx], ty);
                }
            }
        }
        Self {
            assemblies,
            type_lookup,
        }
    }

    pub fn assembly_count(&self) -> usize {
        self.assemblies.len()
    }

    pub fn type_count(&self) -> usize {
        self.type_lookup.values().map(Vec::len).sum()
    }

    fn type_at(&self, asm_idx: usize, path: &[usize]) -> Option<&TypeDef> {
        let assembly = self.assemblies.get(asm_idx)?;
        let (mod_idx, rest) = path.split_first()?;
        let (top_idx, nested) = rest.split_first()?;
        let mut current = assembly.modules.get(*mod_idx)?.types.get(*top_idx)?;
        for idx in nested {
            current = current.nested_types.get(*idx)?;
        }
        Some(current)
    }
}

fn register_type(
    lookup: &mut HashMap<String, Vec<(usize, TypePath)>>,
    asm_idx: usize,
    path: TypePath,
    ty: &TypeDef,
) {
    for (nested_idx, nested) in ty.nested_types.iter().enumerate() {
        let mut nested_path = path.clone();
        nested_path.push(nested_idx);
        register_type(lookup, asm_idx, nested_path, nested);
    }
    lookup
        .entry(ty.full_name.clone())
        .or_default()
        .push((asm_idx, path));
}

impl SymbolIndex for MetadataIndex {
    fn assemblies(&self) -> &[AssemblyDef] {
        &self.assemblies
    }

    fn resolve_type(&self, full_name: &str, preferred_assembly: Option<&str>) -> Option<TypeSymbol<'_>> {
        let candidates = self.type_lookup.get(full_name)?;
        let preferred = preferred_assembly.and_then(|name| {
            candidates.iter().find(|(asm_idx, _)| {
                self.assemblies[*asm_idx].name.eq_ignore_ascii_case(name)
            })
        });
        let (asm_idx, path) = preferred.or_else(|| candidates.iter().min_by_key(|(idx, _)| *idx))?;
        let ty = self.type_at(*asm_idx, path)?;
        Some(TypeSymbol {
            assembly: &self.assemblies[*asm_idx],
            ty,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FieldDef, MethodDef, TypeDef};

    fn sample_index() -> MetadataIndex {
        MetadataIndex::new(vec![
            AssemblyDef::new(
                "Core",
                vec![TypeDef::new("Acme.Shape")
                    .field(FieldDef::new("area", TypeSig::new("System.Double")))
                    .method(MethodDef::new("Draw").body(vec![]))
                    .nested(TypeDef::new("Acme.Shape+Corner"))],
            ),
            AssemblyDef::new("App", vec![TypeDef::new("Acme.Shape"), TypeDef::new("App.Main")]),
        ])
    }

    #[test]
    fn find_assembly_case_insensitive() {
        let index = sample_index();
        assert!(index.find_assembly_by_name("core", true).is_some());
        assert!(index.find_assembly_by_name("core", false).is_none());
        assert!(index.find_assembly_by_name("Missing", true).is_none());
    }

    #[test]
    fn find_type_loose_matches_simple_name() {
        let index = sample_index();
        let core = index.find_assembly_by_name("Core", false).unwrap();
        assert!(index.find_type_in_assembly(core, "corner", true).is_none());
        let found = index.find_type_in_assembly(core, "corner", false).unwrap();
        assert_eq!(found.full_name(), "Acme.Shape+Corner");
    }

    #[test]
    fn resolve_type_prefers_scope() {
        let index = sample_index();
        let in_app = index.resolve_type("Acme.Shape", Some("app")).unwrap();
        assert_eq!(in_app.assembly.name, "App");
        let first = index.resolve_type("Acme.Shape", None).unwrap();
        assert_eq!(first.assembly.name, "Core");
        let nested = index.resolve_type("Acme.Shape+Corner", None).unwrap();
        assert_eq!(nested.ty.name(), "Corner");
    }

    #[test]
    fn resolve_members() {
        let index = sample_index();
        let method = index
            .resolve_method(&MemberRef::new("Acme.Shape", "Draw"), Some("Core"))
            .unwrap();
        assert_eq!(method.full_name(), "Acme.Shape.Draw()");
        let field = index
            .resolve_field(&MemberRef::new("Acme.Shape", "area"), None)
            .unwrap();
        assert_eq!(field.full_name(), "Acme.Shape.area");
        assert!(index
            .resolve_method(&MemberRef::new("Acme.Shape", "Erase"), None)
            .is_none());
    }

    #[test]
    fn resolve_method_honours_signature() {
        let index = MetadataIndex::new(vec![AssemblyDef::new(
            "App",
            vec![TypeDef::new("App.P")
                .method(MethodDef::new("Parse").param("s", TypeSig::new("System.String")))
                .method(MethodDef::new("Parse").param("n", TypeSig::new("System.Int32")))],
        )]);
        let by_int = MemberRef::new("App.P", "Parse").taking(vec![TypeSig::new("System.Int32")]);
        assert_eq!(
            index.resolve_method(&by_int, None).unwrap().full_name(),
            "App.P.Parse(System.Int32)"
        );
        let loose = MemberRef::new("App.P", "Parse");
        assert_eq!(
            index.resolve_method(&loose, None).unwrap().full_name(),
            "App.P.Parse(System.String)"
        );
        let missing = MemberRef::new("App.P", "Parse").taking(vec![]);
        assert!(index.resolve_method(&missing, None).is_none());
    }

    #[test]
    fn owning_assembly_uses_explicit_scope() {
        let index = sample_index();
        let scoped = TypeSig::scoped("System.Object", "mscorlib");
        assert_eq!(index.owning_assembly_of(&scoped, "Core").as_deref(), Some("mscorlib"));
        assert_eq!(
            index.owning_assembly_of(&TypeSig::new("App.Main"), "Core").as_deref(),
            Some("App")
        );
        assert!(index.owning_assembly_of(&TypeSig::new("System.String"), "Core").is_none());
    }

    #[test]
    fn counts() {
        let index = sample_index();
        assert_eq!(index.assembly_count(), 2);
        assert_eq!(index.type_count(), 4);
        assert_eq!(index.all_types().len(), 4);
        assert_eq!(index.all_method_bodies().len(), 1);
    }
}
