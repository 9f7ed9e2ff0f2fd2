//! SQLite persistence for loaded assemblies.
//!
//! Each assembly is stored whole as its JSON snapshot, keyed by name and
//! tagged with a content hash so unchanged assemblies are not rewritten. A
//! flattened `symbols` table serves name lookups without deserializing any
//! payload.

use std::path::{Path, PathBuf};
use std::time::Duration;

use rusqlite::{params, Connection, OptionalExtension, Transaction};
use serde::Serialize;
use tracing::{debug, info};

use crate::errors::{IlGraphError, IlGraphResult};
use crate::indexer::index::{MetadataIndex, SymbolIndex};
use crate::indexer::loader::{compute_content_hash, load_snapshot_str};
use crate::models::{member_full_name, AssemblyDef, SymbolKind, SymbolMatch, TypeDef, Visibility};
use crate::store::schema;

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
    let raw = path.to_string_lossy();
    if raw == "~" || raw.starts_with("~/") {
        if let Some(home) = std::env::var_os("HOME") {
            let mut expanded = PathBuf::from(home);
            if raw.len() > 2 {
                expanded.push(&raw[2..]);
            }
            return expanded;
        }
    }
    path.to_path_buf()
}

fn resolve_path(path: &Path) -> IlGraphResult<PathBuf> {
    let expanded = expand_tilde(path);
    let resolved = if expanded.is_absolute() {
        expanded
    } else {
        std::env::current_dir()?.join(expanded)
    };
    if let Some(parent) = resolved.parent() {
        std::fs::create_dir_all(parent)?;
    }
    Ok(resolved)
}

/// CRC32 of a full name, kept positive. Only a lookup key: distinct names
/// may share a hash, so matches are always confirmed on `full_name`.
pub fn name_hash(full_name: &str) -> i64 {
    (crc32fast::hash(full_name.as_bytes()) & 0x7FFF_FFFF) as i64
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StoredAssembly {
    pub name: String,
    pub version: String,
    pub content_hash: String,
    pub type_count: i64,
}

pub struct SnapshotStore {
    conn: Connection,
    path: Option<PathBuf>,
}

impl SnapshotStore {
    /// Open (creating if needed) the store at `path` and bring its schema up
    /// to date.
    pub fn open(path: &Path) -> IlGraphResult<Self> {
        let resolved = resolve_path(path)?;
        let conn = Connection::open(&resolved)?;
        conn.execute_batch("PRAGMA journal_mode = WAL;")?;
        let store = Self {
            conn,
            path: Some(resolved),
        };
        store.init_schema()?;
        Ok(store)
    }

    pub fn open_in_memory() -> IlGraphResult<Self> {
        let store = Self {
            conn: Connection::open_in_memory()?,
            path: None,
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> IlGraphResult<()> {
        self.conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        for stmt in schema::SCHEMA_STATEMENTS {
            self.conn.execute_batch(stmt)?;
        }
        schema::migrate_schema(&self.conn)
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn schema_version(&self) -> i32 {
        schema::get_schema_version(&self.conn)
    }

    // -----------------------------------------------------------------------
    // Writes
    // -----------------------------------------------------------------------

    /// Persist every assembly of `index` in one transaction. Returns how many
    /// rows were written; assemblies whose content hash is unchanged are
    /// skipped.
    pub fn save_index(&mut self, index: &dyn SymbolIndex) -> IlGraphResult<usize> {
        let tx = self.conn.transaction()?;
        let mut written = 0usize;
        for assembly in index.assemblies() {
            if write_assembly(&tx, assembly)? {
                written += 1;
            }
        }
        tx.commit()?;
        info!(
            assemblies = index.assemblies().len(),
            written,
            "snapshot store saved"
        );
        Ok(written)
    }

    /// Persist one assembly. Returns `false` when the stored copy is identical.
    pub fn save_assembly(&mut self, assembly: &AssemblyDef) -> IlGraphResult<bool> {
        let tx = self.conn.transaction()?;
        let written = write_assembly(&tx, assembly)?;
        tx.commit()?;
        Ok(written)
    }

    /// Drop an assembly and its symbols. Returns whether it existed.
    pub fn remove_assembly(&mut self, name: &str) -> IlGraphResult<bool> {
        let tx = self.conn.transaction()?;
        tx.execute(
            "DELETE FROM symbols WHERE assembly = ?1 COLLATE NOCASE;",
            params![name],
        )?;
        let removed = tx.execute(
            "DELETE FROM assemblies WHERE name = ?1 COLLATE NOCASE;",
            params![name],
        )?;
        tx.commit()?;
        Ok(removed > 0)
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// Rebuild an in-memory index from every stored assembly, in name order.
    pub fn load_index(&self) -> IlGraphResult<MetadataIndex> {
        let mut stmt = self
            .conn
            .prepare("SELECT name, payload_json FROM assemblies ORDER BY name;")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut assemblies = Vec::new();
        for row in rows {
            let (name, payload) = row?;
            let assembly = load_snapshot_str(&payload).map_err(|e| {
                IlGraphError::Database(format!("stored assembly {name} is corrupt: {e}"))
            })?;
            assemblies.push(assembly);
        }
        let index = MetadataIndex::new(assemblies);
        info!(
            assemblies = index.assembly_count(),
            types = index.type_count(),
            "snapshot store loaded"
        );
        Ok(index)
    }

    pub fn list_assemblies(&self) -> IlGraphResult<Vec<StoredAssembly>> {
        let mut stmt = self.conn.prepare(
            "SELECT name, version, content_hash, type_count FROM assemblies ORDER BY name;",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(StoredAssembly {
                name: row.get(0)?,
                version: row.get(1)?,
                content_hash: row.get(2)?,
                type_count: row.get(3)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub fn content_hash(&self, name: &str) -> IlGraphResult<Option<String>> {
        Ok(self
            .conn
            .query_row(
                "SELECT content_hash FROM assemblies WHERE name = ?1 COLLATE NOCASE;",
                params![name],
                |row| row.get(0),
            )
            .optional()?)
    }

    /// Symbols whose full name equals `name`, or whose simple name equals it
    /// case-insensitively. Sorted by assembly, kind, then full name.
    pub fn lookup_symbols(
        &self,
        name: &str,
        kind: Option<SymbolKind>,
        limit: usize,
    ) -> IlGraphResult<Vec<SymbolMatch>> {
        let mut stmt = self.conn.prepare(
            "SELECT kind, assembly, full_name FROM symbols \
             WHERE ((name_hash = ?4 AND full_name = ?1) OR name = ?1 COLLATE NOCASE) \
               AND (?2 IS NULL OR kind = ?2) \
             ORDER BY assembly, kind, full_name \
             LIMIT ?3;",
        )?;
        let rows = stmt.query_map(
            params![name, kind.map(SymbolKind::as_str), limit as i64, name_hash(name)],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            },
        )?;

        let mut matches = Vec::new();
        for row in rows {
            let (kind, assembly, full_name) = row?;
            let kind = SymbolKind::parse(&kind)
                .ok_or_else(|| IlGraphError::Database(format!("unknown symbol kind {kind}")))?;
            matches.push(SymbolMatch {
                kind,
                full_name,
                assembly,
            });
        }
        Ok(matches)
    }

    // -----------------------------------------------------------------------
    // Backup
    // -----------------------------------------------------------------------

    /// Copy the store to `destination` with the SQLite backup API and return
    /// the resolved path.
    pub fn backup_to(&self, destination: &Path) -> IlGraphResult<PathBuf> {
        let resolved = resolve_path(destination)?;
        let mut dst_conn = Connection::open(&resolved)?;
        let backup = rusqlite::backup::Backup::new(&self.conn, &mut dst_conn)?;
        backup.run_to_completion(100, Duration::from_millis(10), None)?;
        debug!(destination = %resolved.display(), "snapshot store backed up");
        Ok(resolved)
    }
}

fn write_assembly(tx: &Transaction<'_>, assembly: &AssemblyDef) -> IlGraphResult<bool> {
    let payload = serde_json::to_string(assembly)?;
    let content_hash = compute_content_hash(payload.as_bytes());

    let existing: Option<String> = tx
        .query_row(
            "SELECT content_hash FROM assemblies WHERE name = ?1;",
            params![assembly.name],
            |row| row.get(0),
        )
        .optional()?;
    if existing.as_deref() == Some(content_hash.as_str()) {
        debug!(assembly = %assembly.name, "assembly unchanged, skipping");
        return Ok(false);
    }

    let types = assembly.all_types();
    tx.execute(
        "DELETE FROM symbols WHERE assembly = ?1;",
        params![assembly.name],
    )?;
    tx.execute(
        "INSERT INTO assemblies(name, version, culture, public_key_token, content_hash, type_count, payload_json) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7) \
         ON CONFLICT(name) DO UPDATE SET \
             version = excluded.version, \
             culture = excluded.culture, \
             public_key_token = excluded.public_key_token, \
             content_hash = excluded.content_hash, \
             type_count = excluded.type_count, \
             payload_json = excluded.payload_json, \
             saved_at = CURRENT_TIMESTAMP;",
        params![
            assembly.name,
            assembly.version,
            assembly.culture,
            assembly.public_key_token,
            content_hash,
            types.len() as i64,
            payload,
        ],
    )?;

    // Rows are unique on (kind, assembly, full_name); a repeat of the same
    // symbol is the only thing skipped.
    let mut insert = tx.prepare(
        "INSERT OR IGNORE INTO symbols(kind, assembly, full_name, name, name_hash, visibility) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
    )?;
    let mut symbols = 0usize;
    for ty in types {
        for (kind, full_name, name, visibility) in flatten_type(ty) {
            symbols += insert.execute(params![
                kind.as_str(),
                assembly.name,
                full_name,
                name,
                name_hash(&full_name),
                visibility.as_str(),
            ])?;
        }
    }
    debug!(assembly = %assembly.name, symbols, "assembly written");
    Ok(true)
}

/// `(kind, full_name, simple_name, visibility)` for a type and its members.
/// Properties carry no accessibility of their own and take the type's.
fn flatten_type(ty: &TypeDef) -> Vec<(SymbolKind, String, String, Visibility)> {
    let mut out = vec![(
        SymbolKind::Type,
        ty.full_name.clone(),
        ty.name().to_string(),
        ty.visibility,
    )];
    for method in &ty.methods {
        out.push((
            SymbolKind::Method,
            method.full_name_in(&ty.full_name),
            method.name.clone(),
            method.visibility,
        ));
    }
    for field in &ty.fields {
        out.push((
            SymbolKind::Field,
            member_full_name(&ty.full_name, &field.name),
            field.name.clone(),
            field.visibility,
        ));
    }
    for property in &ty.properties {
        out.push((
            SymbolKind::Property,
            member_full_name(&ty.full_name, &property.name),
            property.name.clone(),
            ty.visibility,
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FieldDef, Instruction, MethodDef, TypeSig};

    fn sample_index() -> MetadataIndex {
        MetadataIndex::new(vec![
            AssemblyDef::new(
                "Core",
                vec![TypeDef::new("Core.Engine")
                    .field(FieldDef::new("rpm", TypeSig::new("System.Int32")))
                    .method(MethodDef::new("Start").body(vec![Instruction::ldfld("Core.Engine", "rpm")]))
                    .nested(TypeDef::new("Core.Engine+Part"))],
            ),
            AssemblyDef::new(
                "App",
                vec![TypeDef::new("App.Car").field(FieldDef::new("engine", TypeSig::new("Core.Engine")))],
            ),
        ])
    }

    #[test]
    fn save_and_load_preserves_assemblies() {
        let mut store = SnapshotStore::open_in_memory().unwrap();
        assert_eq!(store.schema_version(), schema::SCHEMA_VERSION);
        let index = sample_index();
        assert_eq!(store.save_index(&index).unwrap(), 2);

        let loaded = store.load_index().unwrap();
        let names: Vec<&str> = loaded.assemblies().iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["App", "Core"]);
        let core = loaded.find_assembly_by_name("Core", false).unwrap();
        assert_eq!(core, index.find_assembly_by_name("Core", false).unwrap());
        assert!(loaded.resolve_type("Core.Engine+Part", None).is_some());
    }

    #[test]
    fn unchanged_assemblies_are_skipped() {
        let mut store = SnapshotStore::open_in_memory().unwrap();
        let index = sample_index();
        store.save_index(&index).unwrap();
        let before = store.content_hash("core").unwrap().unwrap();
        assert_eq!(store.save_index(&index).unwrap(), 0);

        let changed = AssemblyDef::new("Core", vec![TypeDef::new("Core.Other")]);
        assert!(store.save_assembly(&changed).unwrap());
        assert_ne!(store.content_hash("Core").unwrap().unwrap(), before);
        assert!(store.lookup_symbols("Start", None, 10).unwrap().is_empty());
        assert_eq!(store.lookup_symbols("Other", None, 10).unwrap().len(), 1);
    }

    #[test]
    fn lookup_by_full_or_simple_name() {
        let mut store = SnapshotStore::open_in_memory().unwrap();
        store.save_index(&sample_index()).unwrap();

        let by_simple = store.lookup_symbols("start", None, 10).unwrap();
        assert_eq!(by_simple.len(), 1);
        assert_eq!(by_simple[0].full_name, "Core.Engine.Start()");
        assert_eq!(by_simple[0].kind, SymbolKind::Method);

        let fields = store
            .lookup_symbols("App.Car.engine", Some(SymbolKind::Field), 10)
            .unwrap();
        assert_eq!(fields.len(), 1);
        assert!(store
            .lookup_symbols("App.Car.engine", Some(SymbolKind::Method), 10)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn remove_and_list() {
        let mut store = SnapshotStore::open_in_memory().unwrap();
        store.save_index(&sample_index()).unwrap();
        let listed = store.list_assemblies().unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[1].name, "Core");
        assert_eq!(listed[1].type_count, 2);

        assert!(store.remove_assembly("app").unwrap());
        assert!(!store.remove_assembly("app").unwrap());
        assert_eq!(store.list_assemblies().unwrap().len(), 1);
        assert!(store.lookup_symbols("Car", None, 10).unwrap().is_empty());
    }

    #[test]
    fn backup_round_trips_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = SnapshotStore::open(&dir.path().join("db").join("ilgraph.db")).unwrap();
        store.save_index(&sample_index()).unwrap();

        let copy = store.backup_to(&dir.path().join("backup.db")).unwrap();
        assert!(copy.exists());
        let reopened = SnapshotStore::open(&copy).unwrap();
        assert_eq!(reopened.load_index().unwrap().assembly_count(), 2);
    }

    #[test]
    fn colliding_name_hashes_keep_both_symbols() {
        let (first, second) = ("App.T.M3985819", "App.T.M4420602");
        assert_eq!(
            crc32fast::hash(format!("method:App:{first}").as_bytes()) & 0x7FFF_FFFF,
            crc32fast::hash(format!("method:App:{second}").as_bytes()) & 0x7FFF_FFFF
        );
        let mut store = SnapshotStore::open_in_memory().unwrap();
        let ty = TypeDef::new("App.T")
            .method(MethodDef::new("M3985819"))
            .method(MethodDef::new("M4420602"));
        store
            .save_assembly(&AssemblyDef::new("App", vec![ty]))
            .unwrap();
        assert_eq!(store.lookup_symbols("M3985819", None, 10).unwrap().len(), 1);
        assert_eq!(store.lookup_symbols("M4420602", None, 10).unwrap().len(), 1);
    }

    #[test]
    fn overloads_are_stored_separately() {
        let mut store = SnapshotStore::open_in_memory().unwrap();
        let ty = TypeDef::new("App.P")
            .method(MethodDef::new("Parse").param("s", TypeSig::new("System.String")))
            .method(MethodDef::new("Parse").param("n", TypeSig::new("System.Int32")));
        store
            .save_assembly(&AssemblyDef::new("App", vec![ty]))
            .unwrap();
        let found = store.lookup_symbols("parse", Some(SymbolKind::Method), 10).unwrap();
        let names: Vec<&str> = found.iter().map(|m| m.full_name.as_str()).collect();
        assert_eq!(names, vec!["App.P.Parse(System.Int32)", "App.P.Parse(System.String)"]);
        let exact = store
            .lookup_symbols("App.P.Parse(System.Int32)", None, 10)
            .unwrap();
        assert_eq!(exact.len(), 1);
    }

    #[test]
    fn name_hash_is_stable_and_positive() {
        let a = name_hash("Core.Engine");
        assert_eq!(a, name_hash("Core.Engine"));
        assert!(a >= 0);
    }
}
