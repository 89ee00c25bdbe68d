//! Persistent storage collaborator.
//!
//! The engine persists the requested theme through the [`ThemeStorage`]
//! get/set contract. Either call may fail; the engine traces and swallows
//! the failure and continues with its in-memory state (best-effort
//! persistence).

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use tracing::{debug, warn};

use crate::error::{Result, ThemeKitError};

/// Key-value store for the user's explicit theme choice.
pub trait ThemeStorage: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// Ephemeral in-process storage. Never fails.
#[derive(Default)]
pub struct MemoryStorage {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ThemeStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self
            .entries
            .lock()
            .ok()
            .and_then(|e| e.get(key).cloned()))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(key.to_string(), value.to_string());
        }
        Ok(())
    }
}

/// File-backed storage: a flat JSON string map, read on every `get` and
/// rewritten on every `set`.
///
/// A missing file reads as empty. A malformed file makes `get` fail (the
/// engine falls back to the configured default) and is overwritten on the
/// next `set`.
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    /// Storage at the default location, `~/.theme-kit/settings.json`.
    pub fn new() -> Self {
        FileStorage {
            path: Self::default_path(),
        }
    }

    /// Storage at a user-supplied path; `~` is expanded.
    pub fn at(path: &str) -> Self {
        FileStorage {
            path: PathBuf::from(shellexpand::tilde(path).as_ref()),
        }
    }

    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .map(|h| h.join(".theme-kit").join("settings.json"))
            .unwrap_or_else(|| std::env::temp_dir().join("theme-kit-settings.json"))
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    fn read_map(&self) -> Result<BTreeMap<String, String>> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "Settings file not found, reading as empty");
                return Ok(BTreeMap::new());
            }
            Err(e) => {
                return Err(ThemeKitError::Storage {
                    key: self.path.display().to_string(),
                    source: e,
                })
            }
        };
        Ok(serde_json::from_str(&contents)?)
    }

    fn write_map(&self, map: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| ThemeKitError::Storage {
                key: self.path.display().to_string(),
                source: e,
            })?;
        }
        let contents = serde_json::to_string_pretty(map)?;
        fs::write(&self.path, contents).map_err(|e| ThemeKitError::Storage {
            key: self.path.display().to_string(),
            source: e,
        })
    }
}

impl Default for FileStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl ThemeStorage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.read_map()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        // A corrupt settings file should not make persistence fail forever;
        // start over with a fresh map.
        let mut map = match self.read_map() {
            Ok(map) => map,
            Err(e) => {
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Settings file unreadable, rewriting from scratch"
                );
                BTreeMap::new()
            }
        };
        map.insert(key.to_string(), value.to_string());
        self.write_map(&map)
    }
}
