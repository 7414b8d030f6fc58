use crate::error::Result;

pub mod selector;
pub mod sqlite;

pub use sqlite::SqliteDriver;

/// A single column value as returned by a driver.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    /// TEXT whose bytes are not valid UTF-8, kept verbatim.
    TextBytes(Vec<u8>),
    Blob(Vec<u8>),
}

/// One result row: column names paired with values, in select order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    columns: Vec<(String, Value)>,
}

impl Row {
    pub fn new(columns: Vec<(String, Value)>) -> Self {
        Self { columns }
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.columns.iter().map(|(_, v)| v)
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// What the dump and restore engines need from a database session.
///
/// The engines only borrow a connection for the length of one operation;
/// opening and closing it is the caller's business. Dialect-specific
/// pieces (catalog, "show create", quoting, the foreign-key pragma) live
/// here too so the engines stay dialect-agnostic.
pub trait Connection {
    fn name(&self) -> &'static str;

    /// Run a statement that produces no rows.
    fn execute(&self, sql: &str) -> Result<()>;

    /// Run a query and collect every row.
    fn query(&self, sql: &str) -> Result<Vec<Row>>;

    fn begin(&self) -> Result<()>;
    fn commit(&self) -> Result<()>;
    fn rollback(&self) -> Result<()>;

    /// Name of the database the session is attached to.
    fn database_name(&self) -> Result<String>;

    /// Server version string, when cheaply available.
    fn server_version(&self) -> Option<String> {
        None
    }

    /// Every user table, in catalog order.
    fn list_tables(&self) -> Result<Vec<String>>;

    /// The table's creation statement as the database reports it, without a trailing `;`.
    fn create_statement(&self, table: &str) -> Result<String>;

    /// Index definitions that belong to `table` and are not part of its
    /// creation statement.
    fn index_statements(&self, _table: &str) -> Result<Vec<String>> {
        Ok(Vec::new())
    }

    fn trigger_statements(&self, _table: &str) -> Result<Vec<String>> {
        Ok(Vec::new())
    }

    /// Columns a dump reads and writes back, in table order. Generated and
    /// hidden columns are left out since they cannot be inserted into.
    fn insertable_columns(&self, table: &str) -> Result<Vec<String>>;

    /// The session pragma that turns foreign-key enforcement on or off.
    fn foreign_key_pragma(&self, enabled: bool) -> String;

    fn set_foreign_key_checks(&self, enabled: bool) -> Result<()> {
        self.execute(&self.foreign_key_pragma(enabled))
    }

    fn quote_identifier(&self, ident: &str) -> String;

    /// Wrap text in a string literal, escaping as the dialect requires.
    fn quote_literal(&self, text: &str) -> String;

    /// Whether `\` escapes the next character inside string literals.
    fn backslash_escapes(&self) -> bool {
        false
    }
}
