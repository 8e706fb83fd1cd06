//! Store configuration persistence.
//!
//! Where the note store lives and how long ordinary operations wait on a
//! locked database, kept in a JSON file at a caller-chosen location.

use crate::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Fixed identifier of the note store.
pub const DEFAULT_STORE_NAME: &str = "noteDB";

const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// Persisted store settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StoreConfig {
    /// Directory holding the store file.
    pub directory: PathBuf,
    /// Store identifier; the file is `<name>.sqlite3`.
    pub name: String,
    /// How long a read or write waits on a lock held by another session.
    pub busy_timeout_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            directory: default_store_directory(),
            name: DEFAULT_STORE_NAME.to_string(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
        }
    }
}

impl StoreConfig {
    /// A config with default settings rooted at `directory`.
    pub fn in_directory<P: AsRef<Path>>(directory: P) -> Self {
        Self {
            directory: directory.as_ref().to_path_buf(),
            ..Self::default()
        }
    }

    /// Full path of the store file.
    pub fn db_path(&self) -> PathBuf {
        self.directory.join(format!("{}.sqlite3", self.name))
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}

/// Returns the default store directory: `<data dir>/notemark`.
pub fn default_store_directory() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".local")
                .join("share")
        })
        .join("notemark")
}

/// Loads the config from `path`; returns defaults if the file is missing or corrupt.
pub fn load_config<P: AsRef<Path>>(path: P) -> StoreConfig {
    match fs::read_to_string(path.as_ref()) {
        Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
            log::warn!("ignoring corrupt store config {}: {e}", path.as_ref().display());
            StoreConfig::default()
        }),
        Err(_) => StoreConfig::default(),
    }
}

/// Saves the config to `path`, creating parent directories as needed.
pub fn save_config<P: AsRef<Path>>(path: P, config: &StoreConfig) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(config)?;
    fs::write(path, json)?;
    Ok(())
}
