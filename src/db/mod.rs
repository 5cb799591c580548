//! Record store: the single `qso` table behind a connection-per-operation
//! handle.

mod backup;
mod connection;
mod qsos;

pub use backup::default_backup_name;
pub use connection::Store;
