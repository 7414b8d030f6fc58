//! Dump engine: writes a database's structure and rows to a script.

use chrono::{DateTime, Local};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::drivers::Connection;
use crate::error::{Error, Result};
use crate::script::{self, Manifest, TableSelection, ValueStyle};
use crate::session::{ForeignKeyGuard, TransactionGuard};
use crate::storage::{self, naming, ARCHIVE_EXTENSION, DEFAULT_COMPRESSION_LEVEL};
use crate::utils::hash::sha256_file;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackupOptions {
    /// Write INSERT statements, not just table structure.
    pub include_data: bool,
    /// Pack the script into a `.zip` and delete the plain script.
    pub archive: bool,
    pub value_style: ValueStyle,
    /// Deflate level, 1-9.
    pub compression_level: u32,
}

impl Default for BackupOptions {
    fn default() -> Self {
        Self {
            include_data: true,
            archive: false,
            value_style: ValueStyle::Quoted,
            compression_level: DEFAULT_COMPRESSION_LEVEL,
        }
    }
}

/// What a finished dump produced.
#[derive(Debug, Clone)]
pub struct BackupResult {
    pub path: PathBuf,
    pub file_name: String,
    pub size_bytes: u64,
    /// Tables written, in script order.
    pub tables: Vec<String>,
    /// Hex SHA-256 of the final file.
    pub checksum: String,
    pub archived: bool,
    pub duration: Duration,
}

/// Dump `selection` into a new file under `folder`.
///
/// Foreign-key checks are off and a single transaction is open for the
/// whole dump. On any failure the transaction is rolled back, the checks
/// are restored and the partially written file is removed.
pub fn backup<C: Connection + ?Sized>(
    conn: &C,
    folder: &Path,
    selection: &TableSelection,
    options: &BackupOptions,
) -> Result<BackupResult> {
    let started = Instant::now();
    let explicit = match selection {
        TableSelection::Only(tables) if tables.is_empty() => return Err(Error::EmptySelection),
        TableSelection::Only(tables) => Some(tables.as_slice()),
        TableSelection::All => None,
    };

    let _fk = ForeignKeyGuard::suspend(conn)?;
    let tx = TransactionGuard::begin(conn)?;

    let database = conn.database_name()?;
    let tables = match explicit {
        Some(tables) => tables.to_vec(),
        None => conn.list_tables()?,
    };

    let now = Local::now();
    let base = naming::base_name(&database, explicit, now);
    let (script_path, file) = naming::create_unique(folder, &base)?;
    info!(
        "dumping {} table(s) from {} database '{}' to {}",
        tables.len(),
        conn.name(),
        database,
        script_path.display()
    );

    let produced = (|| -> Result<PathBuf> {
        write_script(conn, file, &database, &tables, options, now)?;
        let out = if options.archive {
            storage::archive_script(&script_path, options.compression_level)?
        } else {
            script_path.clone()
        };
        tx.commit()?;
        Ok(out)
    })();

    let path = match produced {
        Ok(path) => path,
        Err(e) => {
            warn!("dump failed, removing partial output: {}", e);
            remove_partial(&script_path);
            remove_partial(&script_path.with_extension(ARCHIVE_EXTENSION));
            return Err(e);
        }
    };

    let size_bytes = fs::metadata(&path)?.len();
    let checksum = sha256_file(&path)?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    info!("backup complete: {} ({} bytes)", file_name, size_bytes);
    Ok(BackupResult {
        path,
        file_name,
        size_bytes,
        tables,
        checksum,
        archived: options.archive,
        duration: started.elapsed(),
    })
}

fn remove_partial(path: &Path) {
    if path.exists() {
        if let Err(e) = fs::remove_file(path) {
            warn!("could not remove {}: {}", path.display(), e);
        }
    }
}

fn write_script<C: Connection + ?Sized>(
    conn: &C,
    file: File,
    database: &str,
    tables: &[String],
    options: &BackupOptions,
    now: DateTime<Local>,
) -> Result<()> {
    let mut out = BufWriter::new(file);

    writeln!(out, "{}{}", script::GENERATED_ON, now.format(script::TIMESTAMP_FORMAT))?;
    if let Some(version) = conn.server_version() {
        writeln!(out, "{}{}", script::SERVER_VERSION, version)?;
    }
    let manifest = Manifest::new(database, tables.to_vec(), options.include_data);
    writeln!(out, "{}", manifest.to_line()?)?;
    writeln!(out)?;
    writeln!(out, "{};", conn.foreign_key_pragma(false))?;
    writeln!(out)?;

    for table in tables {
        write_table(conn, &mut out, table, options)?;
    }

    // Triggers go in last so replaying the INSERTs does not fire them and
    // every table their bodies name already exists.
    for table in tables {
        let triggers = conn.trigger_statements(table)?;
        if triggers.is_empty() {
            continue;
        }
        writeln!(out, "{}", script::triggers_header(conn, table))?;
        for trigger in &triggers {
            writeln!(out, "{};", trigger)?;
        }
        writeln!(out)?;
    }

    writeln!(out, "{}", script::END_OF_DUMP)?;
    out.flush()?;
    Ok(())
}

fn write_table<C: Connection + ?Sized, W: Write>(
    conn: &C,
    out: &mut W,
    table: &str,
    options: &BackupOptions,
) -> Result<()> {
    let create = conn.create_statement(table)?;
    writeln!(out, "{}", script::structure_header(conn, table))?;
    writeln!(out, "{};", create)?;
    for index in conn.index_statements(table)? {
        writeln!(out, "{};", index)?;
    }
    writeln!(out)?;

    if options.include_data {
        write_rows(conn, out, table, options.value_style)?;
    } else {
        debug!("{}: structure only", table);
    }
    Ok(())
}

fn write_rows<C: Connection + ?Sized, W: Write>(
    conn: &C,
    out: &mut W,
    table: &str,
    style: ValueStyle,
) -> Result<()> {
    let columns: Vec<String> = conn
        .insertable_columns(table)?
        .iter()
        .map(|c| conn.quote_identifier(c))
        .collect();
    let rows = conn.query(&format!(
        "SELECT {} FROM {}",
        columns.join(", "),
        conn.quote_identifier(table)
    ))?;

    match script::insert_statement(conn, table, &rows, style) {
        Some(insert) => {
            writeln!(out, "{}", script::data_header(conn, table))?;
            writeln!(out, "{}", insert)?;
            writeln!(out)?;
            debug!("{}: {} row(s), {} bytes", table, rows.len(), insert.len());
        }
        None => {
            writeln!(out, "{}", script::no_data_comment(conn, table))?;
            writeln!(out)?;
            debug!("{}: empty", table);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::SqliteDriver;

    fn seeded() -> SqliteDriver {
        let conn = SqliteDriver::open_in_memory().unwrap();
        conn.execute(
            "CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT);
             CREATE TABLE empty (id INTEGER);
             INSERT INTO users VALUES (1, 'ann'), (2, 'bob');",
        )
        .unwrap();
        conn
    }

    #[test]
    fn test_script_layout() {
        let conn = seeded();
        let dir = tempfile::tempdir().unwrap();
        let result = backup(&conn, dir.path(), &TableSelection::All, &BackupOptions::default()).unwrap();

        let text = fs::read_to_string(&result.path).unwrap();
        assert!(text.starts_with(script::GENERATED_ON));
        assert!(text.contains("PRAGMA foreign_keys=OFF;"));
        assert!(text.contains("-- Table structure for table `users`"));
        assert!(text.contains("INSERT INTO `users` (`id`, `name`) VALUES\n('1','ann'),\n('2','bob');"));
        assert!(text.contains("-- No data found for table `empty`"));
        assert!(text.trim_end().ends_with(script::END_OF_DUMP));
        assert_eq!(result.tables, vec!["users", "empty"]);
        assert_eq!(result.size_bytes, text.len() as u64);
        assert_eq!(result.checksum.len(), 64);
        assert!(result.file_name.starts_with("backup_memory-"));
    }

    #[test]
    fn test_indexes_follow_table_and_triggers_come_last() {
        let conn = seeded();
        conn.execute(
            "CREATE INDEX users_name ON users (name);
             CREATE TRIGGER users_touch AFTER UPDATE ON users BEGIN
                 UPDATE users SET name = upper(new.name) WHERE id = new.id;
             END;",
        )
        .unwrap();
        let dir = tempfile::tempdir().unwrap();
        let result = backup(&conn, dir.path(), &TableSelection::All, &BackupOptions::default()).unwrap();

        let text = fs::read_to_string(&result.path).unwrap();
        let create = text.find("CREATE TABLE users").unwrap();
        let index = text.find("CREATE INDEX users_name ON users (name);").unwrap();
        let insert = text.find("INSERT INTO `users`").unwrap();
        let empty = text.find("-- No data found for table `empty`").unwrap();
        let trigger = text.find("-- Triggers for table `users`").unwrap();
        assert!(create < index && index < insert);
        assert!(empty < trigger);
        assert!(text.contains("END;\n"));
    }

    #[test]
    fn test_fk_checks_and_autocommit_restored() {
        let conn = seeded();
        let dir = tempfile::tempdir().unwrap();
        backup(&conn, dir.path(), &TableSelection::All, &BackupOptions::default()).unwrap();
        assert!(conn.inner().is_autocommit());
        let fk = conn.query("PRAGMA foreign_keys").unwrap();
        assert_eq!(fk[0].values().next(), Some(&crate::drivers::Value::Integer(1)));
    }

    #[test]
    fn test_missing_table_leaves_no_file() {
        let conn = seeded();
        let dir = tempfile::tempdir().unwrap();
        let err = backup(
            &conn,
            dir.path(),
            &TableSelection::only(["users", "ghost"]),
            &BackupOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::Database(_)));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
        assert!(conn.inner().is_autocommit());
    }

    #[test]
    fn test_empty_selection_rejected() {
        let conn = seeded();
        let dir = tempfile::tempdir().unwrap();
        let err = backup(&conn, dir.path(), &TableSelection::Only(vec![]), &BackupOptions::default())
            .unwrap_err();
        assert!(matches!(err, Error::EmptySelection));
    }
}
