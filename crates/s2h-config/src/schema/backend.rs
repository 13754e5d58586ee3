use serde::{Deserialize, Serialize};

/// Chat inference backend endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Base URL; `/chat` and `/health` are appended.
    pub url: String,
    /// TCP connect timeout in seconds (valid range: 1-60).
    pub connect_timeout: u32,
    /// Whole-request timeout in seconds (valid range: 1-600).
    pub request_timeout: u32,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:5001".into(),
            connect_timeout: 10,
            request_timeout: 60,
        }
    }
}
