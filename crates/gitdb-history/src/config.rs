//! Persistent per-store settings (`.gitdb/config.toml`).

use std::fs;
use std::path::Path;

use gitdb_store::{write_atomic, SyncMode};
use serde::{Deserialize, Serialize};

use crate::error::{HistoryError, HistoryResult};

/// On-disk format understood by this version.
pub const FORMAT_VERSION: u32 = 1;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct StoreConfig {
    pub format_version: u32,
    /// Durability of object and `HEAD` writes.
    pub sync: SyncMode,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            format_version: FORMAT_VERSION,
            sync: SyncMode::default(),
        }
    }
}

impl StoreConfig {
    pub fn load(path: &Path) -> HistoryResult<Self> {
        let text = fs::read_to_string(path).map_err(|e| HistoryError::io(path, e))?;
        let config: Self = toml::from_str(&text).map_err(|e| HistoryError::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        if config.format_version != FORMAT_VERSION {
            return Err(HistoryError::Config {
                path: path.to_path_buf(),
                reason: format!(
                    "unsupported format version {} (expected {FORMAT_VERSION})",
                    config.format_version
                ),
            });
        }
        Ok(config)
    }

    /// Written atomically: the presence of a parseable config file marks a
    /// fully initialized store.
    pub fn save(&self, path: &Path) -> HistoryResult<()> {
        let text = toml::to_string_pretty(self).map_err(|e| HistoryError::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        write_atomic(path, text.as_bytes(), self.sync)?;
        Ok(())
    }
}
