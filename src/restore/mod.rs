//! Restore engine: replays a script produced by the dump engine.

use std::path::Path;
use tracing::{debug, info, warn};

use crate::drivers::Connection;
use crate::error::{Error, Result};
use crate::script::{discover_tables, split_statements};
use crate::session::{ForeignKeyGuard, TransactionGuard};
use crate::storage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestoreOptions {
    /// Drop every table the script recreates before replaying it.
    pub drop_existing_tables: bool,
}

impl Default for RestoreOptions {
    fn default() -> Self {
        Self {
            drop_existing_tables: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RestoreReport {
    pub tables_dropped: Vec<String>,
    pub statements_executed: usize,
}

/// Replay the script (or `.zip` archive) at `path` in one transaction.
///
/// Any failing statement rolls the whole restore back, drops included.
pub fn restore<C: Connection + ?Sized>(
    conn: &C,
    path: &Path,
    options: &RestoreOptions,
) -> Result<RestoreReport> {
    let script = storage::read_script(path)?;
    info!("restoring {} ({} bytes)", path.display(), script.len());
    restore_script(conn, &script, options)
}

/// Same as [`restore`], for a script already in memory.
pub fn restore_script<C: Connection + ?Sized>(
    conn: &C,
    script: &str,
    options: &RestoreOptions,
) -> Result<RestoreReport> {
    let statements = split_statements(script, conn.backslash_escapes())?;
    let tables = if options.drop_existing_tables {
        discover_tables(script)?
    } else {
        Vec::new()
    };

    let _fk = ForeignKeyGuard::suspend(conn)?;
    let tx = TransactionGuard::begin(conn)?;

    for table in &tables {
        let sql = format!("DROP TABLE IF EXISTS {}", conn.quote_identifier(table));
        debug!("{}", sql);
        conn.execute(&sql)?;
    }

    for (i, sql) in statements.iter().enumerate() {
        if let Err(e) = conn.execute(sql) {
            warn!("statement #{} failed, rolling back restore", i + 1);
            return Err(Error::statement(i + 1, sql, e));
        }
    }

    tx.commit()?;
    info!(
        "restore complete: {} table(s) dropped, {} statement(s) executed",
        tables.len(),
        statements.len()
    );
    Ok(RestoreReport {
        tables_dropped: tables,
        statements_executed: statements.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::{SqliteDriver, Value};

    fn names(conn: &SqliteDriver) -> Vec<String> {
        conn.list_tables().unwrap()
    }

    #[test]
    fn test_legacy_script_without_manifest() {
        let conn = SqliteDriver::open_in_memory().unwrap();
        conn.execute("CREATE TABLE users (id INTEGER, name TEXT); INSERT INTO users VALUES (9, 'old');")
            .unwrap();

        let script = "\
--
-- Table structure for table `users`
--

CREATE TABLE users (id INTEGER, name TEXT);

INSERT INTO `users` (`id`, `name`) VALUES
('1','semi;colon');
";
        let report = restore_script(&conn, script, &RestoreOptions::default()).unwrap();
        assert_eq!(report.tables_dropped, vec!["users"]);
        assert_eq!(report.statements_executed, 2);

        let rows = conn.query("SELECT * FROM users").unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("name"), Some(&Value::Text("semi;colon".into())));
    }

    #[test]
    fn test_keep_tables_fails_on_existing() {
        let conn = SqliteDriver::open_in_memory().unwrap();
        conn.execute("CREATE TABLE users (id INTEGER)").unwrap();
        let script = "-- Table structure for table `users`\nCREATE TABLE users (id INTEGER);";
        let err = restore_script(
            &conn,
            script,
            &RestoreOptions {
                drop_existing_tables: false,
            },
        )
        .unwrap_err();
        assert!(matches!(err, Error::Statement { index: 1, .. }));
        assert_eq!(names(&conn), vec!["users"]);
    }

    #[test]
    fn test_failure_rolls_back_drops() {
        let conn = SqliteDriver::open_in_memory().unwrap();
        conn.execute("CREATE TABLE users (id INTEGER); INSERT INTO users VALUES (1);")
            .unwrap();
        let script = "\
-- Table structure for table `users`
CREATE TABLE users (id INTEGER);
INSERT INTO users VALUES (2);
INSERT INTO nowhere VALUES (3);
";
        let err = restore_script(&conn, script, &RestoreOptions::default()).unwrap_err();
        assert!(matches!(err, Error::Statement { index: 3, .. }));

        let rows = conn.query("SELECT id FROM users").unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("id"), Some(&Value::Integer(1)));
        assert!(conn.inner().is_autocommit());
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let conn = SqliteDriver::open_in_memory().unwrap();
        let err = restore(&conn, Path::new("/nonexistent/backup.sql"), &RestoreOptions::default())
            .unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
