use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::storage::DEFAULT_COMPRESSION_LEVEL;

pub const DEFAULT_CONFIG_FILE: &str = "sqlsnap.json";
pub const DEFAULT_BACKUP_FOLDER: &str = "backup";

/// Defaults for the command line, read from `sqlsnap.json`.
///
/// Every field is optional in the file; flags given on the command line
/// win over whatever is stored here.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Database target, e.g. `sqlite://app.db`.
    pub database: Option<String>,
    pub backup_folder: PathBuf,
    pub include_data: bool,
    pub archive: bool,
    pub compression_level: u32,
    pub drop_existing_tables: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database: None,
            backup_folder: PathBuf::from(DEFAULT_BACKUP_FOLDER),
            include_data: true,
            archive: false,
            compression_level: DEFAULT_COMPRESSION_LEVEL,
            drop_existing_tables: true,
        }
    }
}

impl Settings {
    /// Load settings from `path`, or from `sqlsnap.json` in the working
    /// directory when no path is given. A missing default file yields the
    /// defaults; a missing explicit file is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (path, required) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        };
        if !required && !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(&path)?;
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_json::from_str(&content)?)
    }
}
