//! PostgREST-backed record store (Supabase `rest/v1`).

use async_trait::async_trait;
use tracing::debug;

use crate::identity::Identity;
use crate::HealthData;

use super::{HealthRecord, InsertedRecord, RecordStore, WriteThroughError};

const HISTORY_COLUMNS: &str =
    "id,stress_level,sleep_hours,bmi,activity_level,health_risks,created_at";

pub struct SupabaseRecords {
    url: String,
    anon_key: String,
    table: String,
    http: reqwest::Client,
}

impl SupabaseRecords {
    pub fn new(url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            url: url.into().trim_end_matches('/').to_string(),
            anon_key: anon_key.into(),
            table: "user_health_data".to_string(),
            http: reqwest::Client::new(),
        }
    }

    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    fn table_url(&self) -> String {
        format!("{}/rest/v1/{}", self.url, self.table)
    }

    fn require<'a>(identity: Option<&'a Identity>) -> Result<&'a Identity, WriteThroughError> {
        identity.ok_or_else(|| WriteThroughError::Unavailable("no signed-in user".into()))
    }

    /// `apikey` plus a bearer token: the user's session when present,
    /// otherwise the anon key.
    fn authorized(&self, req: reqwest::RequestBuilder, identity: &Identity) -> reqwest::RequestBuilder {
        let bearer = identity.access_token.as_deref().unwrap_or(&self.anon_key);
        req.header("apikey", &self.anon_key).bearer_auth(bearer)
    }

    async fn read_body(response: reqwest::Response) -> Result<String, WriteThroughError> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| WriteThroughError::Transport(e.to_string()))?;
        if !status.is_success() {
            return Err(WriteThroughError::Rejected {
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }
}

#[async_trait]
impl RecordStore for SupabaseRecords {
    async fn insert(
        &self,
        data: &HealthData,
        identity: Option<&Identity>,
    ) -> Result<InsertedRecord, WriteThroughError> {
        let identity = Self::require(identity)?;
        let row = serde_json::json!({
            "user_id": identity.user_id,
            "stress_level": data.stress_level,
            "sleep_hours": data.sleep_hours,
            "bmi": data.bmi,
            "activity_level": data.activity_level,
            "health_risks": data.health_risks,
        });

        debug!(table = %self.table, user_id = %identity.user_id, "inserting health record");

        let request = self
            .http
            .post(self.table_url())
            .query(&[("select", "id,created_at")])
            .header("Prefer", "return=representation")
            .json(&row);
        let response = self
            .authorized(request, identity)
            .send()
            .await
            .map_err(|e| WriteThroughError::Transport(e.to_string()))?;

        let body = Self::read_body(response).await?;
        let mut rows: Vec<InsertedRecord> =
            serde_json::from_str(&body).map_err(|e| WriteThroughError::Decode(e.to_string()))?;
        if rows.is_empty() {
            return Err(WriteThroughError::Decode("insert returned no rows".into()));
        }
        Ok(rows.swap_remove(0))
    }

    async fn fetch_history(
        &self,
        identity: Option<&Identity>,
    ) -> Result<Vec<HealthRecord>, WriteThroughError> {
        let identity = Self::require(identity)?;

        let request = self
            .http
            .get(self.table_url())
            .query(&[("select", HISTORY_COLUMNS), ("order", "created_at.desc")]);
        let response = self
            .authorized(request, identity)
            .send()
            .await
            .map_err(|e| WriteThroughError::Transport(e.to_string()))?;

        let body = Self::read_body(response).await?;
        serde_json::from_str(&body).map_err(|e| WriteThroughError::Decode(e.to_string()))
    }
}
