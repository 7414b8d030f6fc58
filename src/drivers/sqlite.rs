use rusqlite::types::ValueRef;
use std::path::Path;

use super::{Connection, Row, Value};
use crate::error::{Error, Result};

/// SQLite session backed by rusqlite.
pub struct SqliteDriver {
    conn: rusqlite::Connection,
}

impl SqliteDriver {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = rusqlite::Connection::open(path)?;
        conn.execute_batch("PRAGMA foreign_keys = ON")?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = rusqlite::Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON")?;
        Ok(Self { conn })
    }

    pub fn inner(&self) -> &rusqlite::Connection {
        &self.conn
    }

    /// `sqlite_master` entries of `kind` attached to `table`. Automatic
    /// indexes have no `sql` and are recreated by the table itself.
    fn schema_entries(&self, table: &str, kind: &str) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT sql FROM sqlite_master \
             WHERE tbl_name = ?1 AND type = ?2 AND sql IS NOT NULL \
             ORDER BY rowid",
        )?;
        let entries = stmt
            .query_map([table, kind], |r| r.get::<_, String>(0))?
            .map(|sql| sql.map(|s| s.trim_end().trim_end_matches(';').to_string()))
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(entries)
    }
}

fn to_value(v: ValueRef<'_>) -> Value {
    match v {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Integer(i),
        ValueRef::Real(f) => Value::Real(f),
        ValueRef::Text(t) => match std::str::from_utf8(t) {
            Ok(s) => Value::Text(s.to_string()),
            Err(_) => Value::TextBytes(t.to_vec()),
        },
        ValueRef::Blob(b) => Value::Blob(b.to_vec()),
    }
}

impl Connection for SqliteDriver {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn execute(&self, sql: &str) -> Result<()> {
        self.conn.execute_batch(sql)?;
        Ok(())
    }

    fn query(&self, sql: &str) -> Result<Vec<Row>> {
        let mut stmt = self.conn.prepare(sql)?;
        let names: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let mut rows = stmt.query([])?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let mut columns = Vec::with_capacity(names.len());
            for (i, name) in names.iter().enumerate() {
                columns.push((name.clone(), to_value(row.get_ref(i)?)));
            }
            out.push(Row::new(columns));
        }
        Ok(out)
    }

    fn begin(&self) -> Result<()> {
        self.execute("BEGIN")
    }

    fn commit(&self) -> Result<()> {
        self.execute("COMMIT")
    }

    fn rollback(&self) -> Result<()> {
        self.execute("ROLLBACK")
    }

    fn database_name(&self) -> Result<String> {
        let name = self
            .conn
            .path()
            .filter(|p| !p.is_empty())
            .and_then(|p| Path::new(p).file_stem())
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "memory".to_string());
        Ok(name)
    }

    fn server_version(&self) -> Option<String> {
        Some(format!("SQLite {}", rusqlite::version()))
    }

    fn list_tables(&self) -> Result<Vec<String>> {
        // Shadow tables belong to a virtual table and are recreated with it.
        let mut stmt = self.conn.prepare(
            "SELECT name FROM sqlite_master \
             WHERE type = 'table' AND name NOT LIKE 'sqlite_%' \
             AND name NOT IN ( \
                 SELECT name FROM pragma_table_list \
                 WHERE schema = 'main' AND type = 'shadow') \
             ORDER BY rowid",
        )?;
        let names = stmt
            .query_map([], |r| r.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(names)
    }

    fn create_statement(&self, table: &str) -> Result<String> {
        let sql = self.conn.query_row(
            "SELECT sql FROM sqlite_master WHERE type = 'table' AND name = ?1",
            [table],
            |r| r.get::<_, String>(0),
        )?;
        Ok(sql.trim_end().trim_end_matches(';').to_string())
    }

    fn index_statements(&self, table: &str) -> Result<Vec<String>> {
        self.schema_entries(table, "index")
    }

    fn trigger_statements(&self, table: &str) -> Result<Vec<String>> {
        self.schema_entries(table, "trigger")
    }

    fn insertable_columns(&self, table: &str) -> Result<Vec<String>> {
        // hidden: 1 = virtual-table hidden, 2 = generated virtual, 3 = generated stored
        let mut stmt = self
            .conn
            .prepare("SELECT name FROM pragma_table_xinfo(?1) WHERE hidden = 0 ORDER BY cid")?;
        let names = stmt
            .query_map([table], |r| r.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        if names.is_empty() {
            return Err(Error::Format(format!("table '{}' has no insertable columns", table)));
        }
        Ok(names)
    }

    fn foreign_key_pragma(&self, enabled: bool) -> String {
        format!("PRAGMA foreign_keys={}", if enabled { "ON" } else { "OFF" })
    }

    fn quote_identifier(&self, ident: &str) -> String {
        format!("`{}`", ident.replace('`', "``"))
    }

    fn quote_literal(&self, text: &str) -> String {
        format!("'{}'", text.replace('\'', "''"))
    }
}
