//! Scoped session state: foreign-key suspension and transactions.
//!
//! Both guards undo their effect on drop, so every exit path of a dump or
//! restore (including `?`) leaves the session as it found it.

use tracing::{debug, warn};

use crate::drivers::Connection;
use crate::error::Result;

/// Foreign-key enforcement switched off until dropped.
pub struct ForeignKeyGuard<'a, C: Connection + ?Sized> {
    conn: &'a C,
}

impl<'a, C: Connection + ?Sized> ForeignKeyGuard<'a, C> {
    pub fn suspend(conn: &'a C) -> Result<Self> {
        conn.set_foreign_key_checks(false)?;
        debug!("foreign key checks suspended");
        Ok(Self { conn })
    }
}

impl<C: Connection + ?Sized> Drop for ForeignKeyGuard<'_, C> {
    fn drop(&mut self) {
        match self.conn.set_foreign_key_checks(true) {
            Ok(()) => debug!("foreign key checks restored"),
            Err(e) => warn!("failed to re-enable foreign key checks: {}", e),
        }
    }
}

/// An open transaction; rolled back on drop unless committed.
pub struct TransactionGuard<'a, C: Connection + ?Sized> {
    conn: &'a C,
    done: bool,
}

impl<'a, C: Connection + ?Sized> TransactionGuard<'a, C> {
    pub fn begin(conn: &'a C) -> Result<Self> {
        conn.begin()?;
        Ok(Self { conn, done: false })
    }

    pub fn commit(mut self) -> Result<()> {
        self.done = true;
        self.conn.commit()
    }

    pub fn rollback(mut self) -> Result<()> {
        self.done = true;
        self.conn.rollback()
    }
}

impl<C: Connection + ?Sized> Drop for TransactionGuard<'_, C> {
    fn drop(&mut self) {
        if self.done {
            return;
        }
        warn!("rolling back unfinished transaction");
        if let Err(e) = self.conn.rollback() {
            warn!("rollback failed: {}", e);
        }
    }
}
