//! SQLite schema DDL and migration framework for the snapshot store.

use rusqlite::Connection;

use crate::errors::{IlGraphError, IlGraphResult};

/// Current schema version. Migrations run from whatever the DB currently
/// reports up to this value.
pub const SCHEMA_VERSION: i32 = 1;

/// Baseline DDL. Every statement is `IF NOT EXISTS`, so replaying it on an
/// initialised database is harmless.
pub const SCHEMA_STATEMENTS: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS store_meta (
        key TEXT PRIMARY KEY,
        value TEXT
    );",
    "CREATE TABLE IF NOT EXISTS assemblies (
        name TEXT PRIMARY KEY,
        version TEXT NOT NULL,
        culture TEXT,
        public_key_token TEXT,
        content_hash TEXT NOT NULL,
        type_count INTEGER NOT NULL,
        payload_json TEXT NOT NULL,
        saved_at TEXT DEFAULT CURRENT_TIMESTAMP
    );",
    "CREATE TABLE IF NOT EXISTS symbols (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        kind TEXT NOT NULL,
        assembly TEXT NOT NULL REFERENCES assemblies(name) ON DELETE CASCADE,
        full_name TEXT NOT NULL,
        name TEXT NOT NULL,
        name_hash INTEGER NOT NULL,
        visibility TEXT NOT NULL,
        UNIQUE(kind, assembly, full_name)
    );",
    "CREATE TABLE IF NOT EXISTS migration_history (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        from_version INTEGER NOT NULL,
        to_version INTEGER NOT NULL,
        status TEXT NOT NULL,
        error_message TEXT,
        created_at TEXT DEFAULT CURRENT_TIMESTAMP
    );",
    "CREATE INDEX IF NOT EXISTS idx_assemblies_hash ON assemblies(content_hash);",
    "CREATE INDEX IF NOT EXISTS idx_symbols_name_hash ON symbols(name_hash);",
    "CREATE INDEX IF NOT EXISTS idx_symbols_assembly ON symbols(assembly);",
    "CREATE INDEX IF NOT EXISTS idx_symbols_name_nocase ON symbols(name COLLATE NOCASE);",
];

// ─── Migration framework ────────────────────────────────────────────────────

/// Run all pending migrations from the stored version up to
/// [`SCHEMA_VERSION`]. Each step runs inside its own SAVEPOINT, so a failure
/// rolls back only that step and is recorded in `migration_history`.
pub fn migrate_schema(conn: &Connection) -> IlGraphResult<()> {
    let mut current_version = get_schema_version(conn);

    while current_version < SCHEMA_VERSION {
        let next_version = current_version + 1;
        conn.execute_batch("SAVEPOINT ilgraph_migrate_step;")?;

        let step_result = (|| -> IlGraphResult<()> {
            apply_step(conn, next_version)?;
            set_schema_version(conn, next_version)?;
            record_migration_step(conn, current_version, next_version, "success", None)?;
            conn.execute_batch("RELEASE SAVEPOINT ilgraph_migrate_step;")?;
            Ok(())
        })();

        match step_result {
            Ok(()) => current_version = next_version,
            Err(e) => {
                let _ = conn.execute_batch("ROLLBACK TO SAVEPOINT ilgraph_migrate_step;");
                let _ = conn.execute_batch("RELEASE SAVEPOINT ilgraph_migrate_step;");
                let _ = record_migration_step(
                    conn,
                    current_version,
                    next_version,
                    "failed",
                    Some(&e.to_string()),
                );
                return Err(e);
            }
        }
    }

    Ok(())
}

/// Stored schema version; 0 when absent or unparseable.
pub fn get_schema_version(conn: &Connection) -> i32 {
    let result: Result<String, _> = conn.query_row(
        "SELECT value FROM store_meta WHERE key = 'schema_version';",
        [],
        |row| row.get(0),
    );
    match result {
        Ok(v) => v.parse::<i32>().unwrap_or(0),
        Err(_) => 0,
    }
}

fn set_schema_version(conn: &Connection, version: i32) -> IlGraphResult<()> {
    conn.execute(
        "INSERT INTO store_meta(key, value) \
         VALUES('schema_version', ?1) \
         ON CONFLICT(key) DO UPDATE SET value = excluded.value;",
        rusqlite::params![version.to_string()],
    )?;
    Ok(())
}

fn record_migration_step(
    conn: &Connection,
    from_v: i32,
    to_v: i32,
    status: &str,
    error_msg: Option<&str>,
) -> IlGraphResult<()> {
    conn.execute(
        "INSERT INTO migration_history(from_version, to_version, status, error_message) \
         VALUES (?1, ?2, ?3, ?4);",
        rusqlite::params![from_v, to_v, status, error_msg],
    )?;
    Ok(())
}

// ─── Individual migration steps ─────────────────────────────────────────────

/// Schema changes for the step that ends at `version`. Version 1 is the
/// baseline laid down by [`SCHEMA_STATEMENTS`] and only gets stamped.
fn apply_step(_conn: &Connection, version: i32) -> IlGraphResult<()> {
    match version {
        1 => Ok(()),
        other => Err(IlGraphError::Database(format!(
            "no migration defined for schema v{other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fresh() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        for stmt in SCHEMA_STATEMENTS {
            conn.execute_batch(stmt).unwrap();
        }
        conn
    }

    #[test]
    fn migrates_to_current_version() {
        let conn = fresh();
        assert_eq!(get_schema_version(&conn), 0);
        migrate_schema(&conn).unwrap();
        assert_eq!(get_schema_version(&conn), SCHEMA_VERSION);

        let steps: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM migration_history WHERE status = 'success';",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(steps, SCHEMA_VERSION as i64);
    }

    #[test]
    fn migration_is_idempotent() {
        let conn = fresh();
        migrate_schema(&conn).unwrap();
        migrate_schema(&conn).unwrap();
        let steps: i64 = conn
            .query_row("SELECT COUNT(*) FROM migration_history;", [], |row| row.get(0))
            .unwrap();
        assert_eq!(steps, SCHEMA_VERSION as i64);
        let index_exists: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'index' AND name = 'idx_assemblies_hash';",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(index_exists, 1);
    }

    #[test]
    fn symbols_are_unique_per_kind_assembly_and_name() {
        let conn = fresh();
        conn.execute_batch(
            "INSERT INTO assemblies(name, version, content_hash, type_count, payload_json) \
             VALUES ('App', '1.0.0.0', 'h', 0, '{}');",
        )
        .unwrap();
        let insert = "INSERT INTO symbols(kind, assembly, full_name, name, name_hash, visibility) \
                      VALUES ('method', 'App', ?1, 'M', 7, 'public');";
        conn.execute(insert, ["App.T.M(System.Int32)"]).unwrap();
        conn.execute(insert, ["App.T.M(System.String)"]).unwrap();
        assert!(conn.execute(insert, ["App.T.M(System.Int32)"]).is_err());
    }
}
