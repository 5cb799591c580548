use std::fs;
use std::io;
use std::path::Path;

use chrono::{DateTime, TimeZone};
use log::info;

use crate::error::{LogError, Result};

use super::Store;

/// Suggested file name for a backup taken at `now`.
pub fn default_backup_name<Tz: TimeZone>(now: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!("hamlog_backup_{}.db", now.format("%Y%m%d_%H%M%S"))
}

impl Store {
    /// Copy the whole database file to `destination`. Returns the number of
    /// bytes written.
    pub fn backup_to(&self, destination: &Path) -> Result<u64> {
        if !self.path().exists() {
            return Err(LogError::io("back up database", self.path())(io::Error::new(
                io::ErrorKind::NotFound,
                "database file does not exist",
            )));
        }

        if same_file(self.path(), destination) {
            return Err(LogError::io("back up database", destination)(same_file_error()));
        }

        let bytes = fs::copy(self.path(), destination)
            .map_err(LogError::io("back up database", destination))?;
        info!(
            "backed up {} to {} ({bytes} bytes)",
            self.path().display(),
            destination.display()
        );
        Ok(bytes)
    }

    /// Overwrite the database file with `source`. Running processes keep
    /// seeing the old data until they restart.
    pub fn restore_from(&self, source: &Path) -> Result<u64> {
        if !source.is_file() {
            return Err(LogError::io("restore database", source)(io::Error::new(
                io::ErrorKind::NotFound,
                "backup file does not exist",
            )));
        }

        if same_file(source, self.path()) {
            return Err(LogError::io("restore database", source)(same_file_error()));
        }

        let bytes = fs::copy(source, self.path())
            .map_err(LogError::io("restore database", self.path()))?;
        info!(
            "restored {} from {} ({bytes} bytes)",
            self.path().display(),
            source.display()
        );
        Ok(bytes)
    }
}

/// Copying a file onto itself truncates it, so both sides are resolved
/// through links and `..` before comparing. A path that cannot be resolved
/// (typically one that does not exist yet) is never the same file.
fn same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

fn same_file_error() -> io::Error {
    io::Error::new(
        io::ErrorKind::InvalidInput,
        "source and destination are the same file",
    )
}
