//! Regex search over symbol full names.

use regex::{Regex, RegexBuilder};
use tracing::debug;

use crate::errors::{IlGraphError, IlGraphResult};
use crate::indexer::index::SymbolIndex;
use crate::models::{member_full_name, SymbolKind, SymbolMatch};
use crate::query::guards::truncate_query;

/// Compile a caller-supplied pattern, case-insensitively.
pub fn compile_pattern(pattern: &str) -> IlGraphResult<Regex> {
    let pattern = truncate_query(pattern);
    if pattern.is_empty() {
        return Err(IlGraphError::InvalidArgument(
            "search pattern must not be empty".to_string(),
        ));
    }
    RegexBuilder::new(&pattern)
        .case_insensitive(true)
        .size_limit(1 << 20)
        .build()
        .map_err(|e| IlGraphError::InvalidArgument(format!("invalid pattern: {e}")))
}

/// Every type, method, field and property whose full name matches `pattern`.
///
/// `kind` restricts the symbol kind; `assembly` restricts to one assembly
/// (case-insensitive). Results are sorted by assembly, kind, then full name.
pub fn search_symbols(
    index: &dyn SymbolIndex,
    pattern: &str,
    kind: Option<SymbolKind>,
    assembly: Option<&str>,
) -> IlGraphResult<Vec<SymbolMatch>> {
    let re = compile_pattern(pattern)?;
    let wants = |k: SymbolKind| kind.map_or(true, |wanted| wanted == k);
    let mut matches = Vec::new();

    for ty in index.all_types() {
        if assembly.is_some_and(|name| !ty.assembly.name.eq_ignore_ascii_case(name.trim())) {
            continue;
        }
        let mut push = |k: SymbolKind, full_name: String| {
            if wants(k) && re.is_match(&full_name) {
                matches.push(SymbolMatch {
                    kind: k,
                    full_name,
                    assembly: ty.assembly.name.clone(),
                });
            }
        };
        push(SymbolKind::Type, ty.ty.full_name.clone());
        for method in &ty.ty.methods {
            push(SymbolKind::Method, method.full_name_in(&ty.ty.full_name));
        }
        for field in &ty.ty.fields {
            push(SymbolKind::Field, member_full_name(&ty.ty.full_name, &field.name));
        }
        for property in &ty.ty.properties {
            push(SymbolKind::Property, member_full_name(&ty.ty.full_name, &property.name));
        }
    }

    matches.sort_by(|a, b| {
        a.assembly
            .cmp(&b.assembly)
            .then(a.kind.cmp(&b.kind))
            .then(a.full_name.cmp(&b.full_name))
    });
    debug!(pattern, matches = matches.len(), "symbol search finished");
    Ok(matches)
}
