//! Name-based command layer over the analysis engines.
//!
//! Every entry point resolves caller-supplied names through the
//! [`SymbolIndex`], clamps its limits, paginates list results and returns a
//! JSON value. Unknown names surface here as `SymbolNotFound`; the engines
//! below only ever see resolved symbols.

use serde::Serialize;
use serde_json::{json, Map, Value};
use tracing::debug;

use crate::config::AnalysisConfig;
use crate::errors::{IlGraphError, IlGraphResult};
use crate::indexer::index::{FieldSymbol, MethodSymbol, SymbolIndex, TypeSymbol};
use crate::models::{AssemblyDef, SymbolKind};
use crate::query::callgraph::build_call_graph;
use crate::query::cursor::{decode_cursor_or, paginate, Page};
use crate::query::dead_code::identify_dead_code;
use crate::query::dependencies::{compute_assembly_dependencies, find_dependency_paths};
use crate::query::guards::{
    clamp_depth, clamp_path_length, truncate_query, MAX_CALL_DEPTH, MAX_PATH_LENGTH,
};
use crate::query::hierarchy::type_hierarchy;
use crate::query::references::{self, group_by_context, sort_edges};
use crate::query::search::search_symbols;
use crate::query::usages::{self, sort_usages};

/// A symbol named by the caller, optionally scoped to one assembly.
#[derive(Clone, Copy, Debug)]
pub struct SymbolQuery<'q> {
    pub name: &'q str,
    pub assembly: Option<&'q str>,
}

impl<'q> SymbolQuery<'q> {
    pub fn new(name: &'q str) -> Self {
        Self { name, assembly: None }
    }

    pub fn in_assembly(mut self, assembly: &'q str) -> Self {
        self.assembly = Some(assembly);
        self
    }
}

// ---------------------------------------------------------------------------
// Name resolution
// ---------------------------------------------------------------------------

fn normalize_name(name: &str) -> IlGraphResult<String> {
    let name = truncate_query(name);
    if name.is_empty() {
        return Err(IlGraphError::InvalidArgument("name must not be empty".to_string()));
    }
    Ok(name)
}

pub fn resolve_assembly<'a>(index: &'a dyn SymbolIndex, name: &str) -> IlGraphResult<&'a AssemblyDef> {
    let name = normalize_name(name)?;
    index
        .find_assembly_by_name(&name, true)
        .ok_or_else(|| IlGraphError::not_found("assembly", name))
}

fn lookup_type<'a>(
    index: &'a dyn SymbolIndex,
    assembly: Option<&'a AssemblyDef>,
    name: &str,
) -> Option<TypeSymbol<'a>> {
    match assembly {
        Some(assembly) => index.find_type_in_assembly(assembly, name, false),
        None => index.resolve_type(name, None).or_else(|| {
            index
                .assemblies()
                .iter()
                .find_map(|assembly| index.find_type_in_assembly(assembly, name, false))
        }),
    }
}

fn scope<'a>(index: &'a dyn SymbolIndex, query: &SymbolQuery<'_>) -> IlGraphResult<Option<&'a AssemblyDef>> {
    query
        .assembly
        .map(|name| resolve_assembly(index, name))
        .transpose()
}

pub fn resolve_type_query<'a>(
    index: &'a dyn SymbolIndex,
    query: &SymbolQuery<'_>,
) -> IlGraphResult<TypeSymbol<'a>> {
    let assembly = scope(index, query)?;
    let name = normalize_name(query.name)?;
    lookup_type(index, assembly, &name).ok_or_else(|| IlGraphError::not_found("type", name))
}

/// Split `Declaring.Type.Member` at each `.` from the right until the prefix
/// names a type that `pick` finds the member on. Trying every split lets
/// `.ctor` style member names resolve.
fn resolve_member<'a, T>(
    index: &'a dyn SymbolIndex,
    query: &SymbolQuery<'_>,
    kind: &'static str,
    pick: impl Fn(TypeSymbol<'a>, &str) -> Option<T>,
) -> IlGraphResult<T> {
    let assembly = scope(index, query)?;
    let name = normalize_name(query.name)?;
    let splits: Vec<usize> = name.match_indices('.').map(|(idx, _)| idx).collect();
    for idx in splits.into_iter().rev() {
        let (type_name, member_name) = (&name[..idx], &name[idx + 1..]);
        if type_name.is_empty() || member_name.is_empty() {
            continue;
        }
        if let Some(found) = lookup_type(index, assembly, type_name).and_then(|ty| pick(ty, member_name)) {
            return Ok(found);
        }
    }
    Err(IlGraphError::not_found(kind, name))
}

/// Split a trailing parameter list off `Type.Method(P1,P2)`. A name without
/// one matches any overload.
fn split_signature(name: &str) -> (&str, Option<Vec<&str>>) {
    match (name.find('('), name.ends_with(')')) {
        (Some(open), true) => {
            let inner = &name[open + 1..name.len() - 1];
            let parameters = inner
                .split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .collect();
            (name[..open].trim_end(), Some(parameters))
        }
        _ => (name, None),
    }
}

/// Resolve `Type.Method` or `Type.Method(P1,P2)`. Without a parameter list the
/// first overload with that name is picked.
pub fn resolve_method_query<'a>(
    index: &'a dyn SymbolIndex,
    query: &SymbolQuery<'_>,
) -> IlGraphResult<MethodSymbol<'a>> {
    let name = normalize_name(query.name)?;
    let (base, parameters) = split_signature(&name);
    let base_query = SymbolQuery {
        name: base,
        assembly: query.assembly,
    };
    resolve_member(index, &base_query, "method", |ty, member| {
        ty.methods().find(|m| {
            m.method.name == member
                && parameters.as_ref().map_or(true, |wanted| {
                    wanted
                        .iter()
                        .copied()
                        .eq(m.method.parameter_types().map(|p| p.full_name.as_str()))
                })
        })
    })
    .map_err(|_| IlGraphError::not_found("method", name.clone()))
}

pub fn resolve_field_query<'a>(
    index: &'a dyn SymbolIndex,
    query: &SymbolQuery<'_>,
) -> IlGraphResult<FieldSymbol<'a>> {
    resolve_member(index, query, "field", |ty, member| {
        ty.ty.fields.iter().find(|f| f.name == member).map(|field| FieldSymbol {
            assembly: ty.assembly,
            declaring_type: ty.ty,
            field,
        })
    })
}

// ---------------------------------------------------------------------------
// JSON helpers
// ---------------------------------------------------------------------------

/// Serialize a page and merge `header` fields in front of it.
fn page_json<T: Serialize>(header: Value, page: Page<T>) -> IlGraphResult<Value> {
    let mut out = match header {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    if let Value::Object(body) = serde_json::to_value(page)? {
        out.extend(body);
    }
    Ok(Value::Object(out))
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

pub fn find_callers(
    index: &dyn SymbolIndex,
    config: &AnalysisConfig,
    query: &SymbolQuery<'_>,
    cursor: Option<&str>,
) -> IlGraphResult<Value> {
    let request = decode_cursor_or(cursor, config.page_size)?;
    let target = resolve_method_query(index, query)?;
    let mut records = usages::find_callers(index, &target);
    sort_usages(&mut records);
    page_json(
        json!({ "target": target.full_name(), "assembly": target.assembly.name, "kind": "call" }),
        paginate(records, request),
    )
}

pub fn find_field_readers(
    index: &dyn SymbolIndex,
    config: &AnalysisConfig,
    query: &SymbolQuery<'_>,
    cursor: Option<&str>,
) -> IlGraphResult<Value> {
    let request = decode_cursor_or(cursor, config.page_size)?;
    let target = resolve_field_query(index, query)?;
    let mut records = usages::find_field_readers(index, &target);
    sort_usages(&mut records);
    page_json(
        json!({ "target": target.full_name(), "assembly": target.assembly.name, "kind": "read" }),
        paginate(records, request),
    )
}

pub fn find_field_writers(
    index: &dyn SymbolIndex,
    config: &AnalysisConfig,
    query: &SymbolQuery<'_>,
    cursor: Option<&str>,
) -> IlGraphResult<Value> {
    let request = decode_cursor_or(cursor, config.page_size)?;
    let target = resolve_field_query(index, query)?;
    let mut records = usages::find_field_writers(index, &target);
    sort_usages(&mut records);
    page_json(
        json!({ "target": target.full_name(), "assembly": target.assembly.name, "kind": "write" }),
        paginate(records, request),
    )
}

/// References to a type. The page walks the edges in `(assembly, context,
/// location)` order; `by_context` summarises the whole result.
pub fn find_type_references(
    index: &dyn SymbolIndex,
    config: &AnalysisConfig,
    query: &SymbolQuery<'_>,
    cursor: Option<&str>,
) -> IlGraphResult<Value> {
    let request = decode_cursor_or(cursor, config.page_size)?;
    let target = resolve_type_query(index, query)?;
    let mut edges = references::find_type_references(index, &target);
    sort_edges(&mut edges);
    let by_context: Map<String, Value> = group_by_context(&edges)
        .into_iter()
        .map(|group| (group.context.as_str().to_string(), json!(group.count)))
        .collect();
    page_json(
        json!({
            "target": target.full_name(),
            "assembly": target.assembly.name,
            "by_context": by_context,
        }),
        paginate(edges, request),
    )
}

pub fn call_graph(
    index: &dyn SymbolIndex,
    config: &AnalysisConfig,
    query: &SymbolQuery<'_>,
    max_depth: Option<i64>,
) -> IlGraphResult<Value> {
    let max_depth = max_depth
        .map(|d| clamp_depth(d, MAX_CALL_DEPTH))
        .unwrap_or(config.call_depth);
    let root = resolve_method_query(index, query)?;
    let graph = build_call_graph(index, &root, max_depth);
    Ok(json!({
        "root": root.full_name(),
        "max_depth": max_depth,
        "node_count": graph.node_count(),
        "graph": serde_json::to_value(&graph)?,
    }))
}

pub fn dependency_paths(
    index: &dyn SymbolIndex,
    config: &AnalysisConfig,
    source: &SymbolQuery<'_>,
    target: &SymbolQuery<'_>,
    max_path_length: Option<i64>,
    cursor: Option<&str>,
) -> IlGraphResult<Value> {
    let request = decode_cursor_or(cursor, config.page_size)?;
    let max_path_length = max_path_length
        .map(|len| clamp_path_length(len, MAX_PATH_LENGTH))
        .unwrap_or(config.path_length);
    let source = resolve_type_query(index, source)?;
    let target = resolve_type_query(index, target)?;
    let paths = find_dependency_paths(index, &source, &target, max_path_length);
    page_json(
        json!({
            "source": source.full_name(),
            "source_assembly": source.assembly.name,
            "target": target.full_name(),
            "target_assembly": target.assembly.name,
            "max_path_length": max_path_length,
        }),
        paginate(paths, request),
    )
}

/// The direct dependency matrix, or one row of it when `assembly` is given.
pub fn assembly_dependencies(index: &dyn SymbolIndex, assembly: Option<&str>) -> IlGraphResult<Value> {
    let mut matrix = compute_assembly_dependencies(index);
    if let Some(name) = assembly {
        let wanted = resolve_assembly(index, name)?;
        matrix.retain(|key, _| *key == wanted.name);
    }
    Ok(json!({
        "assembly_count": matrix.len(),
        "dependencies": serde_json::to_value(&matrix)?,
    }))
}

#[derive(Serialize)]
struct DeadSymbol {
    kind: SymbolKind,
    full_name: String,
}

/// Dead types followed by dead methods, paginated as one list.
pub fn dead_code(
    index: &dyn SymbolIndex,
    config: &AnalysisConfig,
    assembly: &str,
    include_private: Option<bool>,
    cursor: Option<&str>,
) -> IlGraphResult<Value> {
    let request = decode_cursor_or(cursor, config.page_size)?;
    let assembly = resolve_assembly(index, assembly)?;
    let report = identify_dead_code(assembly, include_private.unwrap_or(config.include_private));

    let dead: Vec<DeadSymbol> = report
        .dead_types
        .iter()
        .map(|name| DeadSymbol { kind: SymbolKind::Type, full_name: name.clone() })
        .chain(
            report
                .dead_methods
                .iter()
                .map(|name| DeadSymbol { kind: SymbolKind::Method, full_name: name.clone() }),
        )
        .collect();
    page_json(
        json!({
            "assembly": report.assembly,
            "include_private": report.include_private,
            "dead_type_count": report.dead_types.len(),
            "dead_method_count": report.dead_methods.len(),
            "types_considered": report.types_considered,
            "methods_considered": report.methods_considered,
            "caveats": report.caveats,
        }),
        paginate(dead, request),
    )
}

pub fn hierarchy(index: &dyn SymbolIndex, query: &SymbolQuery<'_>) -> IlGraphResult<Value> {
    let target = resolve_type_query(index, query)?;
    Ok(serde_json::to_value(type_hierarchy(index, &target))?)
}

pub fn search(
    index: &dyn SymbolIndex,
    config: &AnalysisConfig,
    pattern: &str,
    kind: Option<&str>,
    assembly: Option<&str>,
    cursor: Option<&str>,
) -> IlGraphResult<Value> {
    let request = decode_cursor_or(cursor, config.page_size)?;
    let kind = match kind.map(str::trim).filter(|k| !k.is_empty() && *k != "any") {
        Some(raw) => Some(
            SymbolKind::parse(raw)
                .ok_or_else(|| IlGraphError::InvalidArgument(format!("unknown symbol kind: {raw}")))?,
        ),
        None => None,
    };
    let assembly = assembly.map(|name| resolve_assembly(index, name)).transpose()?;
    let matches = search_symbols(index, pattern, kind, assembly.map(|a| a.name.as_str()))?;
    debug!(pattern, total = matches.len(), "search command");
    page_json(json!({ "pattern": pattern }), paginate(matches, request))
}
