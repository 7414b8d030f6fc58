use std::path::{Path, PathBuf};

use crate::drivers::Connection;
use crate::dump::{self, BackupOptions, BackupResult};
use crate::error::Result;
use crate::restore::{self, RestoreOptions, RestoreReport};
use crate::script::TableSelection;
use crate::storage::{self, BackupEntry};

/// Dump and restore against one borrowed connection and backup folder.
///
/// ```no_run
/// use sqlsnap::{BackupOptions, RestoreOptions, Snapshotter, SqliteDriver, TableSelection};
///
/// # fn main() -> sqlsnap::Result<()> {
/// let conn = SqliteDriver::open("app.db")?;
/// let snap = Snapshotter::new(&conn, "backup")?;
/// let result = snap.backup(&TableSelection::All, &BackupOptions::default())?;
/// snap.restore(&result.path, &RestoreOptions::default())?;
/// # Ok(())
/// # }
/// ```
pub struct Snapshotter<'a, C: Connection + ?Sized> {
    conn: &'a C,
    folder: PathBuf,
}

impl<'a, C: Connection + ?Sized> Snapshotter<'a, C> {
    /// Fails with `Error::Setup` if the folder cannot be created or written.
    pub fn new<P: AsRef<Path>>(conn: &'a C, folder: P) -> Result<Self> {
        let folder = folder.as_ref().to_path_buf();
        storage::ensure_folder(&folder)?;
        Ok(Self { conn, folder })
    }

    pub fn backup(&self, selection: &TableSelection, options: &BackupOptions) -> Result<BackupResult> {
        dump::backup(self.conn, &self.folder, selection, options)
    }

    pub fn restore<P: AsRef<Path>>(&self, path: P, options: &RestoreOptions) -> Result<RestoreReport> {
        restore::restore(self.conn, path.as_ref(), options)
    }

    pub fn list(&self) -> Result<Vec<BackupEntry>> {
        storage::list_backups(&self.folder)
    }
}
