//! Backup file naming.
//!
//! `backup_<database>[-<t1>_<t2>...]-<YYYYmmdd_HHMMSS>[-N].sql`
//!
//! Two dumps of the same tables inside one second get `-1`, `-2`, ...
//! suffixes. A name counts as taken if either the script or its archive
//! already exists.

use chrono::{DateTime, Local};
use std::fs::{File, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::{ARCHIVE_EXTENSION, SCRIPT_EXTENSION};
use crate::error::Result;

pub const FILE_PREFIX: &str = "backup_";
const STAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

pub fn base_name(database: &str, tables: Option<&[String]>, at: DateTime<Local>) -> String {
    let mut name = format!("{}{}", FILE_PREFIX, sanitize(database));
    if let Some(tables) = tables {
        let joined: Vec<String> = tables.iter().map(|t| sanitize(t)).collect();
        name.push('-');
        name.push_str(&joined.join("_"));
    }
    name.push('-');
    name.push_str(&at.format(STAMP_FORMAT).to_string());
    name
}

/// Create a fresh, empty script file for `base`, picking the first free suffix.
pub fn create_unique(folder: &Path, base: &str) -> Result<(PathBuf, File)> {
    let mut attempt = 0u32;
    loop {
        let stem = if attempt == 0 {
            base.to_string()
        } else {
            format!("{}-{}", base, attempt)
        };
        attempt += 1;

        if folder.join(format!("{}.{}", stem, ARCHIVE_EXTENSION)).exists() {
            continue;
        }
        let path = folder.join(format!("{}.{}", stem, SCRIPT_EXTENSION));
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => return Ok((path, file)),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(e.into()),
        }
    }
}

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}
