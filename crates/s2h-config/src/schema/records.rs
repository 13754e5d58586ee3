use serde::{Deserialize, Serialize};

/// Hosted record store (Supabase-compatible REST + auth).
///
/// Leaving `url` empty disables both history and sign-in.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordsConfig {
    pub url: String,
    pub anon_key: String,
    pub table: String,
}

impl Default for RecordsConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            anon_key: String::new(),
            table: "user_health_data".into(),
        }
    }
}

impl RecordsConfig {
    pub fn is_configured(&self) -> bool {
        !self.url.trim().is_empty() && !self.anon_key.trim().is_empty()
    }
}
