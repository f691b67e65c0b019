use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// Message recorded when a save does not supply one.
pub const DEFAULT_MESSAGE: &str = "some message";

/// The message to record for a save given `message`.
pub fn message_or_default(message: &str) -> &str {
    if message.is_empty() {
        DEFAULT_MESSAGE
    } else {
        message
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct EngineConfig {
    /// Also write each saved file to `<root>/<path>` after it is committed.
    pub materialize_worktree: bool,
}

impl EngineConfig {
    pub fn load(path: &Path) -> EngineResult<Self> {
        let text = fs::read_to_string(path).map_err(|source| EngineError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text).map_err(|reason| EngineError::Config {
            path: path.to_path_buf(),
            reason,
        })
    }

    pub fn from_toml(text: &str) -> Result<Self, String> {
        toml::from_str(text).map_err(|e| e.to_string())
    }
}
