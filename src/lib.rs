//! Logical dump and restore for SQL databases.
//!
//! A dump writes each table's creation statement and rows to a plain SQL
//! script; a restore replays that script inside a single transaction.

pub mod config;
pub mod drivers;
pub mod dump;
pub mod error;
pub mod restore;
pub mod script;
pub mod session;
pub mod snapshotter;
pub mod storage;
pub mod utils;

pub use drivers::{Connection, Row, SqliteDriver, Value};
pub use dump::{BackupOptions, BackupResult};
pub use error::{Error, Result};
pub use restore::{RestoreOptions, RestoreReport};
pub use script::{TableSelection, ValueStyle};
pub use snapshotter::Snapshotter;
pub use storage::BackupEntry;
