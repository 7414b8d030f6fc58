//! The one-line manifest written into every script header.
//!
//! Restore reads the table list from here instead of pattern-matching
//! structure comments.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::error::Result;

pub const MANIFEST_PREFIX: &str = "-- sqlsnap-manifest: ";
pub const MANIFEST_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub version: u32,
    pub database: String,
    /// Tables in the order their structure blocks appear.
    pub tables: Vec<String>,
    pub include_data: bool,
    pub created_at: DateTime<Local>,
}

impl Manifest {
    pub fn new(database: &str, tables: Vec<String>, include_data: bool) -> Self {
        Self {
            version: MANIFEST_VERSION,
            database: database.to_string(),
            tables,
            include_data,
            created_at: Local::now(),
        }
    }

    /// The full comment line, without a trailing newline.
    pub fn to_line(&self) -> Result<String> {
        Ok(format!("{}{}", MANIFEST_PREFIX, serde_json::to_string(self)?))
    }

    /// Find and parse the manifest line in a script, if there is one.
    ///
    /// Only the comment header before the first statement is searched, so a
    /// data value that happens to contain the prefix is never mistaken for it.
    pub fn find(script: &str) -> Result<Option<Self>> {
        for line in script.lines() {
            let line = line.trim();
            if let Some(json) = line.strip_prefix(MANIFEST_PREFIX) {
                return Ok(Some(serde_json::from_str(json)?));
            }
            if !line.is_empty() && !line.starts_with("--") {
                break;
            }
        }
        Ok(None)
    }
}
