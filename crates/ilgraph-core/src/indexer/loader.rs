//! Metadata snapshot discovery and loading with Rayon-based parallelism.
//!
//! A snapshot directory holds one JSON document per assembly. Files are
//! discovered with `walkdir`, parsed in parallel, hashed, validated, and
//! assembled into a [`MetadataIndex`]. A bad file becomes a diagnostic; it
//! never aborts the whole load.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Instant;

use rayon::prelude::*;
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};
use walkdir::{DirEntry, WalkDir};

use crate::errors::{IlGraphError, IlGraphResult};
use crate::indexer::index::MetadataIndex;
use crate::models::AssemblyDef;

const SNAPSHOT_EXTENSION: &str = "json";

#[derive(Clone, Debug, Serialize)]
pub struct SnapshotFile {
    pub path: String,
    pub assembly: String,
    pub content_hash: String,
    pub size_bytes: u64,
}

#[derive(Clone, Debug, Serialize)]
pub struct LoadDiagnostic {
    pub path: String,
    pub stage: &'static str,
    pub message: String,
}

#[derive(Debug)]
pub struct LoadReport {
    pub index: MetadataIndex,
    pub files: Vec<SnapshotFile>,
    pub diagnostics: Vec<LoadDiagnostic>,
    pub elapsed_ms: u128,
}

/// SHA-256 hex digest of a snapshot payload.
pub fn compute_content_hash(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Parse and validate one assembly snapshot document.
pub fn load_snapshot_str(json: &str) -> IlGraphResult<AssemblyDef> {
    let assembly: AssemblyDef = serde_json::from_str(json)
        .map_err(|e| IlGraphError::Snapshot(format!("malformed snapshot: {e}")))?;
    validate_assembly(&assembly)?;
    Ok(assembly)
}

/// Check the structural invariants the engines rely on: a non-empty assembly
/// name and type full names unique within the assembly.
pub fn validate_assembly(assembly: &AssemblyDef) -> IlGraphResult<()> {
    if assembly.name.trim().is_empty() {
        return Err(IlGraphError::Snapshot("assembly name is empty".to_string()));
    }
    let mut seen: HashSet<&str> = HashSet::new();
    for ty in assembly.all_types() {
        if ty.full_name.trim().is_empty() {
            return Err(IlGraphError::Snapshot(format!(
                "assembly {} declares a type with an empty name",
                assembly.name
            )));
        }
        if !seen.insert(ty.full_name.as_str()) {
            return Err(IlGraphError::Snapshot(format!(
                "assembly {} declares type {} more than once",
                assembly.name, ty.full_name
            )));
        }
    }
    Ok(())
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry
            .file_name()
            .to_str()
            .map(|name| name.starts_with('.'))
            .unwrap_or(false)
}

/// All snapshot files under `root`, sorted by path. Hidden entries are skipped.
pub fn discover_snapshot_files(root: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|entry| !is_hidden(entry))
        .filter_map(|entry| match entry {
            Ok(e) => Some(e),
            Err(err) => {
                warn!(error = %err, "skipping unreadable snapshot entry");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| ext.eq_ignore_ascii_case(SNAPSHOT_EXTENSION))
                .unwrap_or(false)
        })
        .collect();
    files.sort();
    files
}

struct ParseOutcome {
    path: String,
    result: Result<(AssemblyDef, String, u64), LoadDiagnostic>,
}

fn parse_file_worker(root: &Path, path: &Path) -> ParseOutcome {
    let rel_path = path
        .strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/");
    let bytes = match std::fs::read(path) {
        Ok(b) => b,
        Err(e) => {
            return ParseOutcome {
                result: Err(LoadDiagnostic {
                    path: rel_path.clone(),
                    stage: "read",
                    message: e.to_string(),
                }),
                path: rel_path,
            }
        }
    };
    let content_hash = compute_content_hash(&bytes);
    let size_bytes = bytes.len() as u64;
    let parsed = std::str::from_utf8(&bytes)
        .map_err(|e| IlGraphError::Snapshot(format!("snapshot is not UTF-8: {e}")))
        .and_then(load_snapshot_str);
    ParseOutcome {
        result: parsed
            .map(|assembly| (assembly, content_hash, size_bytes))
            .map_err(|e| LoadDiagnostic {
                path: rel_path.clone(),
                stage: "parse",
                message: e.to_string(),
            }),
        path: rel_path,
    }
}

/// Load every snapshot under `root` into a fresh index.
///
/// When two files declare the same assembly name (case-insensitively), the
/// first in path order wins and the later one is reported as a duplicate.
pub fn load_snapshot_dir(root: &Path, workers: usize) -> IlGraphResult<LoadReport> {
    let started = Instant::now();
    if !root.is_dir() {
        return Err(IlGraphError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("snapshot directory does not exist: {}", root.display()),
        )));
    }

    let paths = discover_snapshot_files(root);
    debug!(root = %root.display(), files = paths.len(), "discovered snapshot files");

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers.max(1))
        .build();
    let outcomes: Vec<ParseOutcome> = match pool {
        Ok(pool) => pool.install(|| {
            paths
                .par_iter()
                .map(|path| parse_file_worker(root, path))
                .collect()
        }),
        Err(e) => {
            warn!(error = %e, "thread pool unavailable, parsing sequentially");
            paths
                .iter()
                .map(|path| parse_file_worker(root, path))
                .collect()
        }
    };

    let mut assemblies: Vec<AssemblyDef> = Vec::new();
    let mut files: Vec<SnapshotFile> = Vec::new();
    let mut diagnostics: Vec<LoadDiagnostic> = Vec::new();
    let mut seen_names: HashSet<String> = HashSet::new();

    for outcome in outcomes {
        match outcome.result {
            Ok((assembly, content_hash, size_bytes)) => {
                if !seen_names.insert(assembly.name.to_ascii_lowercase()) {
                    diagnostics.push(LoadDiagnostic {
                        path: outcome.path,
                        stage: "duplicate",
                        message: format!("assembly {} already loaded", assembly.name),
                    });
                    continue;
                }
                files.push(SnapshotFile {
                    path: outcome.path,
                    assembly: assembly.name.clone(),
                    content_hash,
                    size_bytes,
                });
                assemblies.push(assembly);
            }
            Err(diagnostic) => {
                warn!(
                    path = %diagnostic.path,
                    stage = diagnostic.stage,
                    message = %diagnostic.message,
                    "snapshot skipped"
                );
                diagnostics.push(diagnostic);
            }
        }
    }

    let index = MetadataIndex::new(assemblies);
    let elapsed_ms = started.elapsed().as_millis();
    info!(
        assemblies = index.assembly_count(),
        types = index.type_count(),
        skipped = diagnostics.len(),
        elapsed_ms = elapsed_ms as u64,
        "snapshot load finished"
    );

    Ok(LoadReport {
        index,
        files,
        diagnostics,
        elapsed_ms,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indexer::index::SymbolIndex;

    fn write(dir: &Path, rel: &str, body: &str) {
        let path = dir.join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, body).unwrap();
    }

    #[test]
    fn content_hash_is_sha256_hex() {
        assert_eq!(
            compute_content_hash(b"hello"),
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
    }

    #[test]
    fn duplicate_type_names_are_rejected() {
        let json = r#"{"name": "Lib", "modules": [{"name": "Lib.dll",
            "types": [{"full_name": "A"}, {"full_name": "A"}]}]}"#;
        let err = load_snapshot_str(json).unwrap_err();
        assert!(matches!(err, IlGraphError::Snapshot(_)));
    }

    #[test]
    fn empty_assembly_name_is_rejected() {
        assert!(load_snapshot_str(r#"{"name": " "}"#).is_err());
        assert!(load_snapshot_str("not json").is_err());
    }

    #[test]
    fn load_dir_collects_diagnostics() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a/Core.json", r#"{"name": "Core"}"#);
        write(dir.path(), "b/App.json", r#"{"name": "App"}"#);
        write(dir.path(), "c/broken.json", "{");
        write(dir.path(), "d/core-copy.json", r#"{"name": "core"}"#);
        write(dir.path(), ".hidden/Secret.json", r#"{"name": "Secret"}"#);
        write(dir.path(), "notes.txt", "ignored");

        let report = load_snapshot_dir(dir.path(), 2).unwrap();
        let names: Vec<&str> = report
            .index
            .assemblies()
            .iter()
            .map(|a| a.name.as_str())
            .collect();
        assert_eq!(names, vec!["Core", "App"]);
        assert_eq!(report.files.len(), 2);
        assert_eq!(report.files[0].path, "a/Core.json");

        let stages: Vec<&str> = report.diagnostics.iter().map(|d| d.stage).collect();
        assert_eq!(stages, vec!["parse", "duplicate"]);
    }

    #[test]
    fn missing_dir_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_snapshot_dir(&dir.path().join("nope"), 1).unwrap_err();
        assert!(matches!(err, IlGraphError::Io(_)));
    }
}
