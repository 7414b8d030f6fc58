use chrono::{DateTime, Local};
use std::fmt::Display;
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::{Error, Result};

pub mod naming;

pub const SCRIPT_EXTENSION: &str = "sql";
pub const ARCHIVE_EXTENSION: &str = "zip";
pub const DEFAULT_COMPRESSION_LEVEL: u32 = 6;

/// A backup file found in the backup folder.
#[derive(Debug, Clone)]
pub struct BackupEntry {
    pub path: PathBuf,
    pub file_name: String,
    pub size_bytes: u64,
    pub modified: DateTime<Local>,
    pub archived: bool,
}

/// Make sure `folder` exists and can be written to.
pub fn ensure_folder(folder: &Path) -> Result<()> {
    let setup = |source| Error::Setup {
        path: folder.to_path_buf(),
        source,
    };

    fs::create_dir_all(folder).map_err(setup)?;

    let mut perms = fs::metadata(folder).map_err(setup)?.permissions();
    if perms.readonly() {
        #[allow(clippy::permissions_set_readonly_false)]
        perms.set_readonly(false);
        fs::set_permissions(folder, perms).map_err(setup)?;
        debug!("cleared read-only flag on {}", folder.display());
    }

    let probe = folder.join(".sqlsnap-probe");
    File::create(&probe).map_err(setup)?;
    fs::remove_file(&probe).map_err(setup)?;
    Ok(())
}

pub fn is_archive(path: &Path) -> bool {
    path.to_string_lossy().ends_with(&format!(".{}", ARCHIVE_EXTENSION))
}

fn archive_error(path: &Path, e: impl Display) -> Error {
    Error::Archive(format!("{}: {}", path.display(), e))
}

/// Pack `script` into a zip holding just that file, then delete it.
/// The archive sits next to the script with the `.zip` extension.
pub fn archive_script(script: &Path, level: u32) -> Result<PathBuf> {
    let archive_path = script.with_extension(ARCHIVE_EXTENSION);
    let entry_name = script
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| Error::Archive(format!("'{}' has no file name", script.display())))?;

    let packed = (|| -> Result<()> {
        let mut source = File::open(script)?;
        let mut zip = ZipWriter::new(File::create(&archive_path)?);
        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .compression_level(Some(i64::from(level.clamp(1, 9))));
        zip.start_file(entry_name, options)
            .map_err(|e| archive_error(&archive_path, e))?;
        io::copy(&mut source, &mut zip)?;
        zip.finish().map_err(|e| archive_error(&archive_path, e))?;
        Ok(())
    })();
    if let Err(e) = packed {
        let _ = fs::remove_file(&archive_path);
        return Err(e);
    }

    fs::remove_file(script)?;
    debug!("archived {} -> {}", script.display(), archive_path.display());
    Ok(archive_path)
}

/// Read a script, unpacking it first if `path` is an archive.
pub fn read_script(path: &Path) -> Result<String> {
    if !is_archive(path) {
        return Ok(fs::read_to_string(path)?);
    }

    let mut archive = ZipArchive::new(File::open(path)?).map_err(|e| archive_error(path, e))?;
    let mut script: Option<String> = None;

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i).map_err(|e| archive_error(path, e))?;
        if entry.is_dir() {
            continue;
        }
        if script.is_some() {
            return Err(Error::Archive(format!(
                "{} holds more than one file",
                path.display()
            )));
        }
        let mut text = String::new();
        entry.read_to_string(&mut text)?;
        script = Some(text);
    }

    script.ok_or_else(|| Error::Archive(format!("{} is empty", path.display())))
}

/// Backups in `folder`, newest first.
pub fn list_backups(folder: &Path) -> Result<Vec<BackupEntry>> {
    let mut entries = Vec::new();

    for entry in WalkDir::new(folder).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|e| Error::Io(e.into()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let file_name = entry.file_name().to_string_lossy().to_string();
        let archived = is_archive(entry.path());
        let is_script = file_name.ends_with(&format!(".{}", SCRIPT_EXTENSION));
        if !file_name.starts_with(naming::FILE_PREFIX) || !(archived || is_script) {
            continue;
        }
        let md = entry.metadata().map_err(|e| Error::Io(e.into()))?;
        entries.push(BackupEntry {
            path: entry.path().to_path_buf(),
            file_name,
            size_bytes: md.len(),
            modified: md.modified().map(DateTime::<Local>::from)?,
            archived,
        });
    }

    entries.sort_by(|a, b| b.modified.cmp(&a.modified).then(b.file_name.cmp(&a.file_name)));
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_ensure_folder_creates_nested() {
        let dir = tempfile::tempdir().unwrap();
        let folder = dir.path().join("a").join("b");
        ensure_folder(&folder).unwrap();
        assert!(folder.is_dir());
        assert!(!folder.join(".sqlsnap-probe").exists());
    }

    #[test]
    fn test_ensure_folder_fails_on_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("taken");
        fs::write(&file, "x").unwrap();
        assert!(matches!(ensure_folder(&file), Err(Error::Setup { .. })));
    }

    #[test]
    fn test_archive_holds_single_entry_and_removes_script() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("backup_db-20261017_120000.sql");
        let content = "CREATE TABLE t (x);\n";
        File::create(&script).unwrap().write_all(content.as_bytes()).unwrap();

        let archive = archive_script(&script, DEFAULT_COMPRESSION_LEVEL).unwrap();
        assert_eq!(
            archive.file_name().unwrap().to_string_lossy(),
            "backup_db-20261017_120000.zip"
        );
        assert!(!script.exists());
        assert_eq!(read_script(&archive).unwrap(), content);

        let mut zip = ZipArchive::new(File::open(&archive).unwrap()).unwrap();
        assert_eq!(zip.len(), 1);
        assert_eq!(zip.by_index(0).unwrap().name(), "backup_db-20261017_120000.sql");
    }

    #[test]
    fn test_list_backups_filters_and_flags() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("backup_a-1.sql"), "x").unwrap();
        fs::write(dir.path().join("notes.txt"), "x").unwrap();
        fs::write(dir.path().join("backup_b-2.zip"), "xx").unwrap();

        let list = list_backups(dir.path()).unwrap();
        let mut names: Vec<_> = list.iter().map(|e| e.file_name.as_str()).collect();
        names.sort();
        assert_eq!(names, vec!["backup_a-1.sql", "backup_b-2.zip"]);
        assert!(list.iter().any(|e| e.archived && e.size_bytes == 2));
    }
}
