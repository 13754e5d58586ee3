//! Configuration validation.
//!
//! Checks URL schemes, timeout ranges, and slot names, collecting every
//! problem into a single `ConfigError`.

use crate::schema::AppConfig;
use s2h_common::ConfigError;

/// Run all validations on a config, collecting all errors.
pub fn validate(config: &AppConfig) -> Result<(), ConfigError> {
    let mut errors: Vec<String> = Vec::new();

    validate_backend(&mut errors, config);
    validate_storage(&mut errors, config);
    validate_records(&mut errors, config);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(errors.join("; ")))
    }
}

fn validate_backend(errors: &mut Vec<String>, config: &AppConfig) {
    validate_http_url(errors, "backend.url", &config.backend.url);
    validate_range(errors, "backend.connect_timeout", config.backend.connect_timeout, 1, 60);
    validate_range(errors, "backend.request_timeout", config.backend.request_timeout, 1, 600);
}

fn validate_storage(errors: &mut Vec<String>, config: &AppConfig) {
    let storage = &config.storage;
    for (name, slot) in [
        ("storage.chat_slot", &storage.chat_slot),
        ("storage.profile_slot", &storage.profile_slot),
    ] {
        if slot.trim().is_empty() {
            errors.push(format!("{name} must not be empty"));
        } else if slot.contains(['/', '\\']) {
            errors.push(format!("{name} = {slot:?} must not contain path separators"));
        }
    }
    if storage.chat_slot == storage.profile_slot {
        errors.push("storage.chat_slot and storage.profile_slot must differ".into());
    }
}

fn validate_records(errors: &mut Vec<String>, config: &AppConfig) {
    let records = &config.records;
    if records.url.trim().is_empty() {
        return;
    }
    validate_http_url(errors, "records.url", &records.url);
    if records.table.trim().is_empty() {
        errors.push("records.table must not be empty".into());
    }
}

fn validate_http_url(errors: &mut Vec<String>, name: &str, value: &str) {
    if !(value.starts_with("http://") || value.starts_with("https://")) {
        errors.push(format!("{name} = {value:?} must start with http:// or https://"));
    }
}

fn validate_range(errors: &mut Vec<String>, name: &str, value: u32, min: u32, max: u32) {
    if value < min || value > max {
        errors.push(format!("{name} = {value} is out of range [{min}, {max}]"));
    }
}
