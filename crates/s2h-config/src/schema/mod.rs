//! Configuration schema types for the Stress2Health client.
//!
//! All structs use `serde(default)` so partial configs work correctly.

mod backend;
mod records;
mod storage;
mod system;

pub use backend::*;
pub use records::*;
pub use storage::*;
pub use system::*;

use serde::{Deserialize, Serialize};

/// Current config schema version.
pub const CONFIG_SCHEMA_VERSION: u32 = 1;

/// Root configuration.
///
/// Only override what you want to change.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub backend: BackendConfig,
    pub storage: StorageConfig,
    pub records: RecordsConfig,
    pub logging: LoggingConfig,
}
