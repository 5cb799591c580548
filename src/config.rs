//! Configuration: where the log lives on disk, and the operator's JSON
//! settings file (entry-form defaults and the presentation theme).
//!
//! Paths are resolved once and handed to each component explicitly; nothing
//! here is process-global.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use directories::BaseDirs;
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::error::{LogError, Result};
use crate::models::QsoField;

/// Folder name used beneath the user's home directory for application data.
const DATA_DIR_NAME: &str = ".hamlog";
/// SQLite file name stored inside the application data directory.
const DB_FILE_NAME: &str = "hamlog.db";
/// Settings file name stored next to the database.
const SETTINGS_FILE_NAME: &str = "config.json";
/// Environment variable that overrides the data directory.
pub const DATA_DIR_ENV: &str = "HAMLOG_DATA_DIR";

/// Filesystem locations used by one running instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppPaths {
    pub data_dir: PathBuf,
    pub database: PathBuf,
    pub settings: PathBuf,
}

impl AppPaths {
    /// Lay out the database and settings file inside `data_dir`.
    pub fn in_dir(data_dir: impl Into<PathBuf>) -> Self {
        let data_dir = data_dir.into();
        Self {
            database: data_dir.join(DB_FILE_NAME),
            settings: data_dir.join(SETTINGS_FILE_NAME),
            data_dir,
        }
    }

    /// Resolve the data directory: explicit override, then `HAMLOG_DATA_DIR`,
    /// then `~/.hamlog`, then the current directory when no home is known.
    pub fn resolve(override_dir: Option<&Path>) -> Self {
        if let Some(dir) = override_dir {
            return Self::in_dir(dir);
        }
        if let Some(dir) = std::env::var_os(DATA_DIR_ENV).filter(|v| !v.is_empty()) {
            return Self::in_dir(dir);
        }
        match BaseDirs::new() {
            Some(base) => Self::in_dir(base.home_dir().join(DATA_DIR_NAME)),
            None => {
                warn!("could not locate home directory, using the working directory");
                Self::in_dir(".")
            }
        }
    }
}

/// Contents of `config.json`.
///
/// Keys this version does not know about are carried through `extra` so a
/// save never discards them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Field identifier to default value for the entry form.
    #[serde(default)]
    pub defaults: BTreeMap<String, String>,
    /// Presentation theme name. Not interpreted by the core.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Settings {
    /// Load settings, degrading to empty settings if the file is missing or
    /// unreadable.
    pub fn load(path: &Path) -> Self {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Self::default(),
            Err(err) => {
                warn!("could not read settings {}: {err}", path.display());
                return Self::default();
            }
        };

        serde_json::from_str(&content).unwrap_or_else(|err| {
            warn!("ignoring malformed settings {}: {err}", path.display());
            Self::default()
        })
    }

    /// Write settings as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self).map_err(|err| {
            LogError::io("serialize settings", path)(std::io::Error::other(err))
        })?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(LogError::io("create settings directory", parent))?;
        }
        fs::write(path, content).map_err(LogError::io("save settings", path))?;
        info!("saved settings to {}", path.display());
        Ok(())
    }

    /// Record a default for the entry form. Canonical fields are upper-cased;
    /// an empty value clears the default.
    pub fn set_default(&mut self, field: &str, value: &str) -> Result<()> {
        let field: QsoField = field.parse()?;
        if value.is_empty() {
            self.defaults.remove(field.as_str());
        } else {
            self.defaults
                .insert(field.as_str().to_string(), field.canonicalize(value));
        }
        Ok(())
    }

    pub fn default_for(&self, field: QsoField) -> Option<&str> {
        self.defaults.get(field.as_str()).map(String::as_str)
    }

    pub fn set_theme(&mut self, theme: &str) {
        self.theme = Some(theme.to_string());
    }
}
