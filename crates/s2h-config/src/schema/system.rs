//! Logging configuration.

use serde::{Deserialize, Serialize};

/// Log level.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Warning,
    Error,
}

impl LogLevel {
    /// Filter directive for `tracing_subscriber::EnvFilter`.
    pub fn directive(&self) -> &'static str {
        match self {
            LogLevel::Debug => "s2h=debug,s2h_chat=debug,s2h_config=debug",
            LogLevel::Info => "s2h=info,s2h_chat=info,s2h_config=info",
            LogLevel::Warning => "s2h=warn,s2h_chat=warn,s2h_config=warn",
            LogLevel::Error => "s2h=error,s2h_chat=error,s2h_config=error",
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: LogLevel,
}
