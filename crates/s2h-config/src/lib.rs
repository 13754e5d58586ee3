//! Stress2Health client configuration.
//!
//! TOML-based configuration with environment overrides and validation.
//! All sections use defaults so partial configs work out of the box.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! let config = s2h_config::load_config(None).expect("failed to load config");
//! println!("{}", config.backend.url);
//! ```

pub mod schema;
pub mod toml_loader;
pub mod validation;

pub use schema::{
    AppConfig, BackendConfig, LogLevel, LoggingConfig, RecordsConfig, StorageConfig,
    CONFIG_SCHEMA_VERSION,
};

use std::path::Path;

use s2h_common::ConfigError;

pub const ENV_BACKEND_URL: &str = "S2H_BACKEND_URL";
pub const ENV_SUPABASE_URL: &str = "S2H_SUPABASE_URL";
pub const ENV_SUPABASE_ANON_KEY: &str = "S2H_SUPABASE_ANON_KEY";

/// Load config from `path` (or the platform default path), apply
/// environment overrides, and validate the result.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut config = match path {
        Some(p) => toml_loader::load_from_path(p)?,
        None => toml_loader::load_default()?,
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    validation::validate(&config)?;
    Ok(config)
}

/// Defaults plus environment overrides. Overrides that fail validation are
/// dropped with a warning.
pub fn defaults_with_env(lookup: impl Fn(&str) -> Option<String>) -> AppConfig {
    let mut config = AppConfig::default();
    apply_env_overrides(&mut config, lookup);
    match validation::validate(&config) {
        Ok(()) => config,
        Err(e) => {
            tracing::warn!(error = %e, "ignoring invalid environment overrides");
            AppConfig::default()
        }
    }
}

/// Overlay values from the environment. `lookup` returns the variable's
/// value, if set; blank values are ignored.
pub fn apply_env_overrides(config: &mut AppConfig, lookup: impl Fn(&str) -> Option<String>) {
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(url) = get(ENV_BACKEND_URL) {
        tracing::debug!(%url, "backend url overridden from environment");
        config.backend.url = url;
    }
    if let Some(url) = get(ENV_SUPABASE_URL) {
        config.records.url = url;
    }
    if let Some(key) = get(ENV_SUPABASE_ANON_KEY) {
        config.records.anon_key = key;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn config_schema_version_is_1() {
        assert_eq!(CONFIG_SCHEMA_VERSION, 1);
    }

    #[test]
    fn env_overrides_backend_and_records() {
        let mut config = AppConfig::default();
        apply_env_overrides(
            &mut config,
            env(&[
                (ENV_BACKEND_URL, "http://backend:9000"),
                (ENV_SUPABASE_URL, "https://x.supabase.co"),
                (ENV_SUPABASE_ANON_KEY, "anon-key"),
            ]),
        );
        assert_eq!(config.backend.url, "http://backend:9000");
        assert!(config.records.is_configured());
    }

    #[test]
    fn blank_env_values_are_ignored() {
        let mut config = AppConfig::default();
        apply_env_overrides(&mut config, env(&[(ENV_BACKEND_URL, "  ")]));
        assert_eq!(config.backend.url, "http://localhost:5001");
    }

    #[test]
    fn defaults_with_env_keeps_valid_overrides() {
        let config = defaults_with_env(env(&[(ENV_BACKEND_URL, "http://backend:9000")]));
        assert_eq!(config.backend.url, "http://backend:9000");
    }

    #[test]
    fn defaults_with_env_rejects_invalid_backend_url() {
        let config = defaults_with_env(env(&[(ENV_BACKEND_URL, "localhost:5001")]));
        assert_eq!(config.backend.url, "http://localhost:5001");
    }

    #[test]
    fn load_config_from_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[logging]\nlevel = \"DEBUG\"\n").unwrap();

        let config = load_config(Some(path.as_path())).unwrap();
        assert_eq!(config.logging.level, LogLevel::Debug);
    }
}
