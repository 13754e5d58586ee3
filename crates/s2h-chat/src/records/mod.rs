//! Identity-scoped record store for completed assessments.

mod supabase;

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};

use crate::identity::Identity;
use crate::HealthData;

pub use supabase::SupabaseRecords;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WriteThroughError {
    #[error("record store unavailable: {0}")]
    Unavailable(String),
    #[error("record store unreachable: {0}")]
    Transport(String),
    #[error("record store rejected request (HTTP {status}): {body}")]
    Rejected { status: u16, body: String },
    #[error("unexpected record store response: {0}")]
    Decode(String),
}

/// Row identity returned by an insert.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InsertedRecord {
    #[serde(deserialize_with = "id_as_string")]
    pub id: String,
    pub created_at: String,
}

/// One stored assessment, newest first when fetched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthRecord {
    #[serde(deserialize_with = "id_as_string")]
    pub id: String,
    #[serde(flatten)]
    pub data: HealthData,
    pub created_at: String,
}

#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn insert(
        &self,
        data: &HealthData,
        identity: Option<&Identity>,
    ) -> Result<InsertedRecord, WriteThroughError>;

    async fn fetch_history(
        &self,
        identity: Option<&Identity>,
    ) -> Result<Vec<HealthRecord>, WriteThroughError>;
}

/// Fetch history, treating a missing store like a missing identity.
pub async fn fetch_history_from(
    store: Option<&dyn RecordStore>,
    identity: Option<&Identity>,
) -> Result<Vec<HealthRecord>, WriteThroughError> {
    match store {
        Some(store) => store.fetch_history(identity).await,
        None => Err(WriteThroughError::Unavailable(
            "record store not configured".into(),
        )),
    }
}

/// Row ids may be serial integers or UUID strings.
fn id_as_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!("unsupported id: {other}"))),
    }
}
