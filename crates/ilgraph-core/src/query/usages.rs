//! Usage scanning: callers of a method, readers and writers of a field.
//!
//! Every method body reachable through the index is scanned once. Each
//! matching instruction yields one record attributed to the method that
//! contains it, so two call sites in one caller produce two records.

use tracing::debug;

use crate::indexer::classify::{classify, Action};
use crate::indexer::index::{FieldSymbol, MethodSymbol, SymbolIndex};
use crate::models::{MemberRef, OpCode, UsageKind, UsageRecord};

fn scan<F>(index: &dyn SymbolIndex, kind: UsageKind, is_match: F) -> Vec<UsageRecord>
where
    F: Fn(&Action<'_>) -> bool,
{
    let mut records = Vec::new();
    let mut bodies = 0usize;
    let mut unresolved = 0usize;

    for method in index.all_method_bodies() {
        bodies += 1;
        for ins in method.method.instructions.iter().flatten() {
            let action = classify(ins);
            if action == Action::Other && ins.operand.is_none() && is_member_opcode(&ins.opcode) {
                unresolved += 1;
                continue;
            }
            if is_match(&action) {
                records.push(usage_record(&method, kind, ins.offset));
            }
        }
    }

    debug!(
        kind = ?kind,
        bodies,
        unresolved,
        records = records.len(),
        "usage scan finished"
    );
    records
}

fn is_member_opcode(opcode: &OpCode) -> bool {
    !matches!(opcode, OpCode::Other(_))
}

fn usage_record(method: &MethodSymbol<'_>, kind: UsageKind, offset: Option<u32>) -> UsageRecord {
    UsageRecord {
        member: method.full_name(),
        member_name: method.method.name.clone(),
        declaring_type: method.declaring_type.full_name.clone(),
        assembly: method.assembly.name.clone(),
        kind,
        offset,
    }
}

fn same_member(candidate: &MemberRef, target: &str) -> bool {
    candidate.full_name() == target
}

/// Every call site (`call` / `callvirt`) whose callee is `target`.
///
/// A call carrying a signature matches only the overload with those
/// parameter types; one without a signature matches every overload.
pub fn find_callers(index: &dyn SymbolIndex, target: &MethodSymbol<'_>) -> Vec<UsageRecord> {
    let declaring_type = target.declaring_type.full_name.as_str();
    scan(index, UsageKind::Call, |action| {
        matches!(action, Action::Invoke(callee)
            if callee.declaring_type == declaring_type && callee.targets(target.method))
    })
}

/// Every `ldfld` / `ldsfld` of `target`.
pub fn find_field_readers(index: &dyn SymbolIndex, target: &FieldSymbol<'_>) -> Vec<UsageRecord> {
    let target_name = target.full_name();
    scan(index, UsageKind::Read, |action| {
        matches!(action, Action::ReadField(field) if same_member(field, &target_name))
    })
}

/// Every `stfld` / `stsfld` of `target`.
pub fn find_field_writers(index: &dyn SymbolIndex, target: &FieldSymbol<'_>) -> Vec<UsageRecord> {
    let target_name = target.full_name();
    scan(index, UsageKind::Write, |action| {
        matches!(action, Action::WriteField(field) if same_member(field, &target_name))
    })
}

/// Deterministic order: assembly, declaring type, member name, then offset.
pub fn sort_usages(records: &mut [UsageRecord]) {
    records.sort_by(|a, b| {
        a.assembly
            .cmp(&b.assembly)
            .then(a.declaring_type.cmp(&b.declaring_type))
            .then(a.member_name.cmp(&b.member_name))
            .then(a.offset.cmp(&b.offset))
    });
}
