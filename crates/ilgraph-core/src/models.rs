//! Shared typed models used across the index, storage, and query layers.
//!
//! The first half of this module is the read-only symbol model produced by a
//! metadata snapshot (assemblies, modules, types, members, instructions). The
//! second half holds the plain result records returned by the query engines.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// 1. Visibility
// ---------------------------------------------------------------------------

/// Accessibility of a type or member as recorded in metadata.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    Public,
    #[default]
    Private,
    Family,
    Assembly,
    FamilyOrAssembly,
    FamilyAndAssembly,
}

impl Visibility {
    /// Public or family-accessible: callable from outside the assembly.
    pub fn is_externally_visible(self) -> bool {
        matches!(
            self,
            Visibility::Public | Visibility::Family | Visibility::FamilyOrAssembly
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Private => "private",
            Visibility::Family => "family",
            Visibility::Assembly => "assembly",
            Visibility::FamilyOrAssembly => "family_or_assembly",
            Visibility::FamilyAndAssembly => "family_and_assembly",
        }
    }
}

// ---------------------------------------------------------------------------
// 2. Signature references
// ---------------------------------------------------------------------------

/// A type as it appears inside a signature (base type, field type, ...).
///
/// `assembly` is the resolution scope when the snapshot recorded one; when
/// absent the type is looked up by name, preferring the referencing assembly.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeSig {
    pub full_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assembly: Option<String>,
}

impl TypeSig {
    pub fn new(full_name: impl Into<String>) -> Self {
        Self {
            full_name: full_name.into(),
            assembly: None,
        }
    }

    pub fn scoped(full_name: impl Into<String>, assembly: impl Into<String>) -> Self {
        Self {
            full_name: full_name.into(),
            assembly: Some(assembly.into()),
        }
    }

    /// Name-based equality. `List<A>` and `List<B>` are different types here.
    pub fn is(&self, full_name: &str) -> bool {
        self.full_name == full_name
    }
}

/// A method or field referenced by an instruction operand.
///
/// `parameters` carries the parameter types of a method reference. When the
/// snapshot recorded no signature it is `None` and the reference stands for
/// every overload with that name.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MemberRef {
    pub declaring_type: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assembly: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Vec<TypeSig>>,
}

impl MemberRef {
    pub fn new(declaring_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            declaring_type: declaring_type.into(),
            name: name.into(),
            assembly: None,
            parameters: None,
        }
    }

    /// Pin a method reference to one overload.
    pub fn taking(mut self, parameters: Vec<TypeSig>) -> Self {
        self.parameters = Some(parameters);
        self
    }

    /// `Type.Name(P1,P2)` when the signature is known, else `Type.Name`.
    pub fn full_name(&self) -> String {
        match &self.parameters {
            Some(parameters) => method_full_name(&self.declaring_type, &self.name, parameters),
            None => member_full_name(&self.declaring_type, &self.name),
        }
    }

    /// Whether this reference can target `method`: same name, and the same
    /// parameter types when the reference carries a signature.
    pub fn targets(&self, method: &MethodDef) -> bool {
        self.name == method.name
            && self.parameters.as_ref().map_or(true, |parameters| {
                parameters.len() == method.parameters.len()
                    && parameters
                        .iter()
                        .zip(method.parameter_types())
                        .all(|(a, b)| a.full_name == b.full_name)
            })
    }
}

/// Join a declaring type and member name the way metadata full names read.
pub fn member_full_name(declaring_type: &str, name: &str) -> String {
    format!("{declaring_type}.{name}")
}

/// Method identity: `Type.Name(P1,P2)`. Overloads differ only here.
pub fn method_full_name<'a>(
    declaring_type: &str,
    name: &str,
    parameters: impl IntoIterator<Item = &'a TypeSig>,
) -> String {
    let parameters: Vec<&str> = parameters
        .into_iter()
        .map(|p| p.full_name.as_str())
        .collect();
    format!("{declaring_type}.{name}({})", parameters.join(","))
}

// ---------------------------------------------------------------------------
// 3. Instructions
// ---------------------------------------------------------------------------

/// The opcode subset the engine distinguishes. Every other opcode keeps its
/// mnemonic in [`OpCode::Other`] so snapshots survive a store round trip.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum OpCode {
    Call,
    CallVirt,
    LoadField,
    LoadStaticField,
    StoreField,
    StoreStaticField,
    Other(String),
}

impl OpCode {
    pub fn from_mnemonic(mnemonic: &str) -> Self {
        match mnemonic.trim().to_ascii_lowercase().as_str() {
            "call" => OpCode::Call,
            "callvirt" => OpCode::CallVirt,
            "ldfld" => OpCode::LoadField,
            "ldsfld" => OpCode::LoadStaticField,
            "stfld" => OpCode::StoreField,
            "stsfld" => OpCode::StoreStaticField,
            other => OpCode::Other(other.to_string()),
        }
    }

    pub fn mnemonic(&self) -> &str {
        match self {
            OpCode::Call => "call",
            OpCode::CallVirt => "callvirt",
            OpCode::LoadField => "ldfld",
            OpCode::LoadStaticField => "ldsfld",
            OpCode::StoreField => "stfld",
            OpCode::StoreStaticField => "stsfld",
            OpCode::Other(m) => m,
        }
    }
}

impl From<String> for OpCode {
    fn from(value: String) -> Self {
        OpCode::from_mnemonic(&value)
    }
}

impl From<OpCode> for String {
    fn from(value: OpCode) -> Self {
        value.mnemonic().to_string()
    }
}

/// A statically resolved instruction operand.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Operand {
    Method(MemberRef),
    Field(MemberRef),
    Type(TypeSig),
}

/// One unit of a method body. `operand` is `None` when the snapshot could
/// not resolve the token.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instruction {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<u32>,
    pub opcode: OpCode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operand: Option<Operand>,
}

impl Instruction {
    pub fn new(opcode: OpCode, operand: Option<Operand>) -> Self {
        Self {
            offset: None,
            opcode,
            operand,
        }
    }

    pub fn call(declaring_type: &str, name: &str) -> Self {
        Self::new(
            OpCode::Call,
            Some(Operand::Method(MemberRef::new(declaring_type, name))),
        )
    }

    pub fn callvirt(declaring_type: &str, name: &str) -> Self {
        Self::new(
            OpCode::CallVirt,
            Some(Operand::Method(MemberRef::new(declaring_type, name))),
        )
    }

    pub fn ldfld(declaring_type: &str, name: &str) -> Self {
        Self::new(
            OpCode::LoadField,
            Some(Operand::Field(MemberRef::new(declaring_type, name))),
        )
    }

    pub fn ldsfld(declaring_type: &str, name: &str) -> Self {
        Self::new(
            OpCode::LoadStaticField,
            Some(Operand::Field(MemberRef::new(declaring_type, name))),
        )
    }

    pub fn stfld(declaring_type: &str, name: &str) -> Self {
        Self::new(
            OpCode::StoreField,
            Some(Operand::Field(MemberRef::new(declaring_type, name))),
        )
    }

    pub fn stsfld(declaring_type: &str, name: &str) -> Self {
        Self::new(
            OpCode::StoreStaticField,
            Some(Operand::Field(MemberRef::new(declaring_type, name))),
        )
    }

    /// `call` to an explicit member reference, signature included.
    pub fn call_ref(member: MemberRef) -> Self {
        Self::new(OpCode::Call, Some(Operand::Method(member)))
    }

    pub fn other(mnemonic: &str) -> Self {
        Self::new(OpCode::from_mnemonic(mnemonic), None)
    }

    pub fn at(mut self, offset: u32) -> Self {
        self.offset = Some(offset);
        self
    }
}

// ---------------------------------------------------------------------------
// 4. Members
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterDef {
    pub name: String,
    #[serde(rename = "type")]
    pub param_type: TypeSig,
}

/// A method definition. `instructions` is `None` for bodiless methods
/// (abstract, interface, extern).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodDef {
    pub name: String,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default)]
    pub is_static: bool,
    #[serde(default)]
    pub is_virtual: bool,
    #[serde(default)]
    pub is_abstract: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_type: Option<TypeSig>,
    #[serde(default)]
    pub parameters: Vec<ParameterDef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<Vec<Instruction>>,
}

impl MethodDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            visibility: Visibility::Public,
            is_static: false,
            is_virtual: false,
            is_abstract: false,
            return_type: None,
            parameters: Vec::new(),
            instructions: None,
        }
    }

    pub fn visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn returns(mut self, return_type: TypeSig) -> Self {
        self.return_type = Some(return_type);
        self
    }

    pub fn param(mut self, name: &str, param_type: TypeSig) -> Self {
        self.parameters.push(ParameterDef {
            name: name.to_string(),
            param_type,
        });
        self
    }

    pub fn body(mut self, instructions: Vec<Instruction>) -> Self {
        self.instructions = Some(instructions);
        self
    }

    pub fn has_body(&self) -> bool {
        self.instructions.is_some()
    }

    pub fn parameter_types(&self) -> impl Iterator<Item = &TypeSig> {
        self.parameters.iter().map(|p| &p.param_type)
    }

    /// Signature-qualified full name within `declaring_type`.
    pub fn full_name_in(&self, declaring_type: &str) -> String {
        method_full_name(declaring_type, &self.name, self.parameter_types())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    pub field_type: TypeSig,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default)]
    pub is_static: bool,
    #[serde(default)]
    pub is_literal: bool,
}

impl FieldDef {
    pub fn new(name: impl Into<String>, field_type: TypeSig) -> Self {
        Self {
            name: name.into(),
            field_type,
            visibility: Visibility::Private,
            is_static: false,
            is_literal: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyDef {
    pub name: String,
    pub property_type: TypeSig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub getter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub setter: Option<String>,
}

// ---------------------------------------------------------------------------
// 5. Types, modules, assemblies
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDef {
    pub full_name: String,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default)]
    pub is_value_type: bool,
    #[serde(default)]
    pub is_abstract: bool,
    #[serde(default)]
    pub is_sealed: bool,
    #[serde(default)]
    pub is_interface: bool,
    #[serde(default)]
    pub is_enum: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_type: Option<TypeSig>,
    #[serde(default)]
    pub interfaces: Vec<TypeSig>,
    #[serde(default)]
    pub fields: Vec<FieldDef>,
    #[serde(default)]
    pub methods: Vec<MethodDef>,
    #[serde(default)]
    pub properties: Vec<PropertyDef>,
    #[serde(default)]
    pub nested_types: Vec<TypeDef>,
}

impl TypeDef {
    pub fn new(full_name: impl Into<String>) -> Self {
        Self {
            full_name: full_name.into(),
            visibility: Visibility::Public,
            is_value_type: false,
            is_abstract: false,
            is_sealed: false,
            is_interface: false,
            is_enum: false,
            base_type: None,
            interfaces: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            properties: Vec::new(),
            nested_types: Vec::new(),
        }
    }

    pub fn interface(full_name: impl Into<String>) -> Self {
        let mut ty = Self::new(full_name);
        ty.is_interface = true;
        ty.is_abstract = true;
        ty
    }

    pub fn visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn extends(mut self, base: TypeSig) -> Self {
        self.base_type = Some(base);
        self
    }

    pub fn implements(mut self, interface: TypeSig) -> Self {
        self.interfaces.push(interface);
        self
    }

    pub fn field(mut self, field: FieldDef) -> Self {
        self.fields.push(field);
        self
    }

    pub fn method(mut self, method: MethodDef) -> Self {
        self.methods.push(method);
        self
    }

    pub fn property(mut self, property: PropertyDef) -> Self {
        self.properties.push(property);
        self
    }

    pub fn nested(mut self, nested: TypeDef) -> Self {
        self.nested_types.push(nested);
        self
    }

    /// Simple name: the segment after the last namespace or nesting separator.
    pub fn name(&self) -> &str {
        self.full_name
            .rsplit(['.', '+', '/'])
            .next()
            .unwrap_or(&self.full_name)
    }

    pub fn namespace(&self) -> &str {
        match self.full_name.rfind('.') {
            Some(idx) => &self.full_name[..idx],
            None => "",
        }
    }

    /// Pre-order walk over this type and all nested types.
    pub fn walk<'a>(&'a self, out: &mut Vec<&'a TypeDef>) {
        out.push(self);
        for nested in &self.nested_types {
            nested.walk(out);
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleDef {
    pub name: String,
    #[serde(default)]
    pub types: Vec<TypeDef>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssemblyDef {
    pub name: String,
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub culture: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_key_token: Option<String>,
    #[serde(default)]
    pub modules: Vec<ModuleDef>,
}

fn default_version() -> String {
    "0.0.0.0".to_string()
}

impl AssemblyDef {
    /// An assembly with a single module named after it.
    pub fn new(name: impl Into<String>, types: Vec<TypeDef>) -> Self {
        let name = name.into();
        Self {
            modules: vec![ModuleDef {
                name: format!("{name}.dll"),
                types,
            }],
            name,
            version: default_version(),
            culture: None,
            public_key_token: None,
        }
    }

    /// Every type in every module, nested types included, in declaration order.
    pub fn all_types(&self) -> Vec<&TypeDef> {
        let mut out = Vec::new();
        for module in &self.modules {
            for ty in &module.types {
                ty.walk(&mut out);
            }
        }
        out
    }

    /// `Name, Version=1.0.0.0, Culture=neutral, PublicKeyToken=null`
    pub fn display_name(&self) -> String {
        format!(
            "{}, Version={}, Culture={}, PublicKeyToken={}",
            self.name,
            self.version,
            self.culture.as_deref().unwrap_or("neutral"),
            self.public_key_token.as_deref().unwrap_or("null"),
        )
    }
}

// ---------------------------------------------------------------------------
// 6. Usage records
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UsageKind {
    Call,
    Read,
    Write,
}

/// One use site of a method or field, attributed to the using method.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageRecord {
    pub member: String,
    pub member_name: String,
    pub declaring_type: String,
    pub assembly: String,
    pub kind: UsageKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<u32>,
}

// ---------------------------------------------------------------------------
// 7. Reference edges
// ---------------------------------------------------------------------------

/// Where in a signature a type reference was found. Declaration order is the
/// presentation order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceContext {
    BaseType,
    Interface,
    FieldType,
    ReturnType,
    ParameterType,
}

impl ReferenceContext {
    pub fn as_str(self) -> &'static str {
        match self {
            ReferenceContext::BaseType => "base_type",
            ReferenceContext::Interface => "interface",
            ReferenceContext::FieldType => "field_type",
            ReferenceContext::ReturnType => "return_type",
            ReferenceContext::ParameterType => "parameter_type",
        }
    }
}

impl fmt::Display for ReferenceContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceEdge {
    pub context: ReferenceContext,
    pub from_member: String,
    pub in_assembly: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameter: Option<String>,
}

// ---------------------------------------------------------------------------
// 8. Call graph
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeStatus {
    /// Callees were expanded (possibly none).
    Expanded,
    /// The depth bound was reached before expansion.
    DepthLimit,
    /// Already expanded elsewhere in this traversal.
    Recursive,
    /// Not defined in any loaded assembly, so there is no body to expand.
    External,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallGraphNode {
    pub method: String,
    pub declaring_type: String,
    pub assembly: Option<String>,
    pub depth: u32,
    pub call_count: u32,
    pub status: NodeStatus,
    pub calls_to: Vec<CallGraphNode>,
}

impl CallGraphNode {
    /// Number of nodes in this subtree, including `self`.
    pub fn node_count(&self) -> usize {
        1 + self.calls_to.iter().map(CallGraphNode::node_count).sum::<usize>()
    }
}

// ---------------------------------------------------------------------------
// 9. Dead code
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeadCodeReport {
    pub assembly: String,
    pub include_private: bool,
    pub dead_methods: Vec<String>,
    pub dead_types: Vec<String>,
    pub methods_considered: usize,
    pub types_considered: usize,
    pub caveats: Vec<String>,
}

// ---------------------------------------------------------------------------
// 10. Hierarchy and search
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeLocation {
    pub full_name: String,
    pub assembly: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeHierarchy {
    pub full_name: String,
    pub assembly: String,
    pub base_chain: Vec<String>,
    pub interfaces: Vec<String>,
    pub derived_types: Vec<TypeLocation>,
    pub implementors: Vec<TypeLocation>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolKind {
    Type,
    Method,
    Field,
    Property,
}

impl SymbolKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SymbolKind::Type => "type",
            SymbolKind::Method => "method",
            SymbolKind::Field => "field",
            SymbolKind::Property => "property",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "type" => Some(SymbolKind::Type),
            "method" => Some(SymbolKind::Method),
            "field" => Some(SymbolKind::Field),
            "property" => Some(SymbolKind::Property),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolMatch {
    pub kind: SymbolKind,
    pub full_name: String,
    pub assembly: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opcode_mnemonics_are_case_insensitive() {
        assert_eq!(OpCode::from_mnemonic("CallVirt"), OpCode::CallVirt);
        assert_eq!(OpCode::from_mnemonic("ldsfld"), OpCode::LoadStaticField);
        assert_eq!(
            OpCode::from_mnemonic("newobj"),
            OpCode::Other("newobj".to_string())
        );
    }

    #[test]
    fn instruction_json_shape() {
        let json = r#"{"offset": 4, "opcode": "ldfld",
                       "operand": {"kind": "field", "declaring_type": "A", "name": "x"}}"#;
        let ins: Instruction = serde_json::from_str(json).unwrap();
        assert_eq!(ins, Instruction::ldfld("A", "x").at(4));
    }

    #[test]
    fn method_refs_pin_overloads() {
        let by_string = MethodDef::new("Parse").param("s", TypeSig::new("System.String"));
        let by_int = MethodDef::new("Parse").param("n", TypeSig::new("System.Int32"));
        assert_eq!(by_string.full_name_in("App.P"), "App.P.Parse(System.String)");
        assert_eq!(MethodDef::new("Run").full_name_in("App.P"), "App.P.Run()");

        let pinned = MemberRef::new("App.P", "Parse").taking(vec![TypeSig::new("System.Int32")]);
        assert_eq!(pinned.full_name(), "App.P.Parse(System.Int32)");
        assert!(pinned.targets(&by_int));
        assert!(!pinned.targets(&by_string));

        let loose = MemberRef::new("App.P", "Parse");
        assert_eq!(loose.full_name(), "App.P.Parse");
        assert!(loose.targets(&by_int) && loose.targets(&by_string));

        let json = r#"{"kind": "method", "declaring_type": "App.P", "name": "Parse",
                       "parameters": [{"full_name": "System.Int32"}]}"#;
        let operand: Operand = serde_json::from_str(json).unwrap();
        assert_eq!(operand, Operand::Method(pinned));
    }

    #[test]
    fn type_names() {
        let ty = TypeDef::new("Acme.Core.Outer+Inner");
        assert_eq!(ty.name(), "Inner");
        assert_eq!(ty.namespace(), "Acme.Core");
        assert_eq!(TypeDef::new("Global").namespace(), "");
    }

    #[test]
    fn all_types_includes_nested() {
        let asm = AssemblyDef::new(
            "Lib",
            vec![TypeDef::new("A").nested(TypeDef::new("A+B").nested(TypeDef::new("A+B+C")))],
        );
        let names: Vec<&str> = asm.all_types().iter().map(|t| t.full_name.as_str()).collect();
        assert_eq!(names, vec!["A", "A+B", "A+B+C"]);
    }

    #[test]
    fn assembly_defaults_from_json() {
        let asm: AssemblyDef = serde_json::from_str(r#"{"name": "Lib"}"#).unwrap();
        assert_eq!(asm.version, "0.0.0.0");
        assert_eq!(
            asm.display_name(),
            "Lib, Version=0.0.0.0, Culture=neutral, PublicKeyToken=null"
        );
    }
}
