//! The textual script format shared by dump and restore.
//!
//! ```text
//! -- Generated on: 2026-10-17 12:00:00
//! -- Server version: SQLite 3.46.0
//! -- sqlsnap-manifest: {"version":1,...}
//!
//! PRAGMA foreign_keys=OFF;
//!
//! --
//! -- Table structure for table `users`
//! --
//!
//! CREATE TABLE users (...);
//! CREATE INDEX users_name ON users (name);
//!
//! --
//! -- Dumping data for table `users`
//! --
//!
//! INSERT INTO `users` (`id`, `name`) VALUES
//! ('1','ann'),
//! ('2','bob');
//!
//! --
//! -- Triggers for table `users`
//! --
//!
//! CREATE TRIGGER users_touch AFTER UPDATE ON users BEGIN ... END;
//!
//! -- End of database backup process
//! ```

use crate::drivers::{Connection, Row, Value};

pub mod manifest;
pub mod markers;
pub mod tokenizer;

pub use manifest::Manifest;
pub use markers::discover_tables;
pub use tokenizer::split_statements;

pub const GENERATED_ON: &str = "-- Generated on: ";
pub const SERVER_VERSION: &str = "-- Server version: ";
pub const END_OF_DUMP: &str = "-- End of database backup process";
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Which tables a dump covers.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TableSelection {
    /// Every table the catalog reports at dump time.
    #[default]
    All,
    /// Exactly these tables, in this order, without duplicates.
    Only(Vec<String>),
}

impl TableSelection {
    /// Build an explicit selection, dropping repeated names but keeping first-seen order.
    pub fn only<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut out: Vec<String> = Vec::new();
        for name in names {
            let name = name.into();
            if !out.contains(&name) {
                out.push(name);
            }
        }
        TableSelection::Only(out)
    }
}

/// How row values are written into INSERT statements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValueStyle {
    /// Every value stringified and quoted; NULL becomes `''`.
    #[default]
    Quoted,
    /// NULL and numbers written bare, text quoted.
    Typed,
}

pub fn structure_header<C: Connection + ?Sized>(conn: &C, table: &str) -> String {
    format!(
        "--\n-- Table structure for table {}\n--\n",
        conn.quote_identifier(table)
    )
}

pub fn data_header<C: Connection + ?Sized>(conn: &C, table: &str) -> String {
    format!(
        "--\n-- Dumping data for table {}\n--\n",
        conn.quote_identifier(table)
    )
}

pub fn triggers_header<C: Connection + ?Sized>(conn: &C, table: &str) -> String {
    format!("--\n-- Triggers for table {}\n--\n", conn.quote_identifier(table))
}

pub fn no_data_comment<C: Connection + ?Sized>(conn: &C, table: &str) -> String {
    format!("-- No data found for table {}", conn.quote_identifier(table))
}

pub fn render_value<C: Connection + ?Sized>(conn: &C, value: &Value, style: ValueStyle) -> String {
    match (value, style) {
        (Value::Blob(bytes), _) => format!("X'{}'", hex::encode(bytes)),
        (Value::Null, ValueStyle::Quoted) => conn.quote_literal(""),
        (Value::Null, ValueStyle::Typed) => "NULL".to_string(),
        (Value::Integer(i), ValueStyle::Quoted) => conn.quote_literal(&i.to_string()),
        (Value::Integer(i), ValueStyle::Typed) => i.to_string(),
        (Value::Real(f), ValueStyle::Quoted) => conn.quote_literal(&f.to_string()),
        (Value::Real(f), ValueStyle::Typed) => render_real(*f),
        (Value::Text(s), _) => conn.quote_literal(s),
        (Value::TextBytes(bytes), _) => format!("CAST(X'{}' AS TEXT)", hex::encode(bytes)),
    }
}

// Bare floats must stay floats on replay, and NaN/inf have no literal.
fn render_real(f: f64) -> String {
    if !f.is_finite() {
        "NULL".to_string()
    } else if f.fract() == 0.0 && f.abs() < 1e15 {
        format!("{:.1}", f)
    } else {
        f.to_string()
    }
}

/// One multi-row INSERT for `rows`; column order comes from the first row.
/// Returns `None` for an empty slice.
pub fn insert_statement<C: Connection + ?Sized>(
    conn: &C,
    table: &str,
    rows: &[Row],
    style: ValueStyle,
) -> Option<String> {
    let first = rows.first()?;
    let columns: Vec<String> = first
        .column_names()
        .map(|c| conn.quote_identifier(c))
        .collect();

    let tuples: Vec<String> = rows
        .iter()
        .map(|row| {
            let vals: Vec<String> = row.values().map(|v| render_value(conn, v, style)).collect();
            format!("({})", vals.join(","))
        })
        .collect();

    Some(format!(
        "INSERT INTO {} ({}) VALUES\n{};",
        conn.quote_identifier(table),
        columns.join(", "),
        tuples.join(",\n")
    ))
}
