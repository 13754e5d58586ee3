use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Local slot storage for the cached transcript and profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding the slot files. Empty means the platform data dir.
    pub data_dir: String,
    pub chat_slot: String,
    pub profile_slot: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: String::new(),
            chat_slot: "stress2health_chat".into(),
            profile_slot: "stress2health_userName".into(),
        }
    }
}

impl StorageConfig {
    /// Resolve the slot directory.
    ///
    /// On Linux: `~/.local/share/stress2health`
    /// On macOS: `~/Library/Application Support/stress2health`
    pub fn resolved_data_dir(&self) -> Option<PathBuf> {
        if !self.data_dir.is_empty() {
            return Some(PathBuf::from(&self.data_dir));
        }
        dirs::data_dir().map(|d| d.join("stress2health"))
    }
}
