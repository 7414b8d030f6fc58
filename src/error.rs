//! Error types for sqlsnap.

use std::io;
use std::path::PathBuf;

/// Result type alias for dump and restore operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Everything a dump or restore can fail with.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The backup folder could not be created or made writable.
    #[error("cannot prepare backup folder '{path}': {source}")]
    Setup {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// IO error while writing or reading a script or archive.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Driver-level database error.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A script statement failed during restore.
    #[error("statement #{index} failed ({preview}): {source}")]
    Statement {
        index: usize,
        preview: String,
        #[source]
        source: Box<Error>,
    },

    /// The restore input is not a usable script.
    #[error("malformed script: {0}")]
    Format(String),

    /// Packing or unpacking an archive failed.
    #[error("archive error: {0}")]
    Archive(String),

    /// An explicit table list was given but it was empty.
    #[error("no tables selected")]
    EmptySelection,

    /// The target string does not name a supported database.
    #[error("unsupported target '{0}'")]
    UnsupportedTarget(String),

    /// Manifest (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn statement(index: usize, sql: &str, source: Error) -> Self {
        Error::Statement {
            index,
            preview: preview(sql),
            source: Box::new(source),
        }
    }
}

/// First line of a statement, capped at 60 chars, for error messages.
fn preview(sql: &str) -> String {
    let first = sql
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty() && !l.starts_with("--"))
        .unwrap_or("");
    let mut out: String = first.chars().take(60).collect();
    if first.chars().count() > 60 {
        out.push_str("...");
    }
    out
}
