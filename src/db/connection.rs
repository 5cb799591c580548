use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::debug;
use rusqlite::Connection;

use crate::error::{LogError, Result};

/// How long a connection waits on a lock held by another process before the
/// operation fails with a storage error.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const CREATE_QSO_TABLE: &str = "CREATE TABLE IF NOT EXISTS qso (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    call TEXT NOT NULL CHECK (call <> ''),
    mode TEXT,
    freq REAL,
    power REAL,
    datetime TEXT,
    qth_prov TEXT,
    qth_city TEXT,
    rst_sent TEXT,
    rst_recv TEXT,
    content TEXT,
    device TEXT,
    addtime TEXT
)";

/// Handle to the on-disk contact log.
///
/// The store only remembers where the database lives. Every public operation
/// opens its own connection, runs to completion (committing or rolling back)
/// and drops the connection before returning, so no SQLite handle outlives a
/// single call.
#[derive(Debug, Clone)]
pub struct Store {
    path: PathBuf,
}

impl Store {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the SQLite file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the data directory and the `qso` table if they are missing.
    /// Safe to call on every startup; existing rows are never touched.
    pub fn initialize(&self) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(LogError::io("create data directory", parent))?;
        }

        let conn = self.connect()?;
        conn.execute(CREATE_QSO_TABLE, [])
            .map_err(LogError::storage("create qso table"))?;
        debug!("qso schema ready at {}", self.path.display());
        Ok(())
    }

    /// Open a short-lived connection for one operation.
    pub(crate) fn connect(&self) -> Result<Connection> {
        let conn = Connection::open(&self.path).map_err(LogError::storage("open database"))?;
        conn.busy_timeout(BUSY_TIMEOUT)
            .map_err(LogError::storage("configure database"))?;
        Ok(conn)
    }
}
