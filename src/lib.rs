//! Core library for HamLog, a personal amateur radio contact log.
//!
//! The pieces are deliberately independent: [`db::Store`] owns the SQLite
//! table, [`adif`] converts between stored contacts and ADIF text, and
//! [`stats`] summarizes a list of contacts. The `hamlog` binary wires them to
//! a command line through [`cli`], but any other front end can call the same
//! functions; none of them prompt, print or hold state between calls.
pub mod adif;
pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod stats;

/// Persistence entry points.
pub use db::{default_backup_name, Store};

/// Error type and result alias shared by every module.
pub use error::{LogError, Result};

/// Domain types other layers manipulate.
pub use models::{NewQso, Qso, QsoCandidate, QsoField, SearchField};

pub use config::{AppPaths, Settings};
pub use stats::count_by_mode;
