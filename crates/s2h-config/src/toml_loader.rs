//! Reading, and first-run creation of, the TOML config file.

use std::path::{Path, PathBuf};

use s2h_common::ConfigError;
use tracing::{info, warn};

use crate::schema::AppConfig;
use crate::validation;

const APP_DIR: &str = "stress2health";
const FILE_NAME: &str = "config.toml";

fn io_error(action: &str, path: &Path, err: std::io::Error) -> ConfigError {
    ConfigError::ParseError(format!("{action} {}: {err}", path.display()))
}

/// Parse the file at `path`. Missing keys take their defaults; a file that
/// parses but fails validation is replaced wholesale by the defaults.
pub fn load_from_path(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }
        Err(e) => return Err(io_error("cannot read", path, e)),
    };

    let config: AppConfig = toml::from_str(&content)
        .map_err(|e| ConfigError::ParseError(format!("{}: {e}", path.display())))?;

    match validation::validate(&config) {
        Ok(()) => {
            info!(path = %path.display(), "config loaded");
            Ok(config)
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "invalid config, using defaults");
            Ok(AppConfig::default())
        }
    }
}

/// Load `<config_dir>/stress2health/config.toml`, writing a commented
/// template there first if nothing exists yet.
pub fn load_default() -> Result<AppConfig, ConfigError> {
    let path = default_config_path()?;
    if path.exists() {
        return load_from_path(&path);
    }
    create_default_config(&path)?;
    Ok(AppConfig::default())
}

pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    dirs::config_dir()
        .map(|dir| dir.join(APP_DIR).join(FILE_NAME))
        .ok_or_else(|| ConfigError::ParseError("no platform config directory".into()))
}

/// Write the commented template to `path`, creating parent directories.
pub fn create_default_config(path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| io_error("cannot create", parent, e))?;
    }
    std::fs::write(path, default_config_toml()).map_err(|e| io_error("cannot write", path, e))?;
    info!(path = %path.display(), "wrote default config");
    Ok(())
}

fn default_config_toml() -> &'static str {
    r##"# Stress2Health client configuration
# Every key is optional; uncomment a line to change it.

[backend]
# url = "http://localhost:5001"
# connect_timeout = 10   # seconds, 1-60
# request_timeout = 60   # seconds, 1-600

[storage]
# data_dir = ""          # empty = platform data directory
# chat_slot = "stress2health_chat"
# profile_slot = "stress2health_userName"

[records]
# Leave url empty to run without sign-in and history.
# url = "https://your-project.supabase.co"
# anon_key = ""
# table = "user_health_data"

[logging]
# level = "INFO"         # DEBUG, INFO, WARNING, ERROR
"##
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_from_path(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(_)));
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r##"
[backend]
url = "http://10.0.0.5:5001"

[records]
url = "https://abc.supabase.co"
anon_key = "anon"
"##,
        )
        .unwrap();

        let config = load_from_path(&path).unwrap();
        assert_eq!(config.backend.url, "http://10.0.0.5:5001");
        assert!(config.records.is_configured());
        assert_eq!(config.backend.request_timeout, 60);
        assert_eq!(config.records.table, "user_health_data");
        assert_eq!(config.storage.chat_slot, "stress2health_chat");
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[backend\nurl = ").unwrap();

        let err = load_from_path(&path).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn invalid_values_fall_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[backend]\nurl = \"not a url\"\n").unwrap();

        let config = load_from_path(&path).unwrap();
        assert_eq!(config.backend.url, "http://localhost:5001");
    }

    #[test]
    fn created_default_config_parses() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        create_default_config(&path).unwrap();

        let config = load_from_path(&path).unwrap();
        assert_eq!(config.backend.url, "http://localhost:5001");
        assert!(!config.records.is_configured());
    }

    #[test]
    fn default_path_is_under_app_dir() {
        if let Ok(path) = default_config_path() {
            assert!(path.ends_with("stress2health/config.toml"));
        }
    }
}
