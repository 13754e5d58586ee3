//! HTTP backend client, request building, and response parsing.

use async_trait::async_trait;
use tracing::{debug, warn};

use s2h_common::SessionId;

use crate::{ChatError, ChatReply, HealthData};

use super::config::HttpBackendConfig;
use super::{ChatBackend, EMPTY_REPLY_PLACEHOLDER, GENERIC_BACKEND_ERROR};

/// Chat backend reached over HTTP (`POST /chat`).
pub struct HttpBackend {
    pub(crate) config: HttpBackendConfig,
    pub(crate) http: reqwest::Client,
}

impl HttpBackend {
    pub fn new(config: HttpBackendConfig) -> Self {
        let http = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .build()
            .unwrap_or_else(|e| {
                warn!(error = %e, "HTTP client builder failed, using defaults");
                reqwest::Client::new()
            });
        Self { config, http }
    }

    pub fn base_url(&self) -> &str {
        self.config.base()
    }

    /// Probe `GET /health`.
    pub async fn health(&self) -> Result<(), ChatError> {
        let url = format!("{}/health", self.config.base());
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| self.connectivity_error(&e))?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(ChatError::Backend(format!("health check failed: HTTP {status}")))
        }
    }

    pub(crate) fn build_request_body(
        text: &str,
        session_id: Option<&SessionId>,
    ) -> serde_json::Value {
        serde_json::json!({
            "message": text,
            "session_id": session_id.map(SessionId::as_str),
        })
    }

    /// Parse a 2xx body. An `error` field still means failure.
    pub(crate) fn parse_response(json: serde_json::Value) -> Result<ChatReply, ChatError> {
        if let Some(err) = json["error"].as_str().filter(|e| !e.is_empty()) {
            return Err(ChatError::Backend(err.to_string()));
        }

        let reply = json["reply"]
            .as_str()
            .filter(|r| !r.trim().is_empty())
            .unwrap_or(EMPTY_REPLY_PLACEHOLDER)
            .to_string();

        let session_id = json["session_id"]
            .as_str()
            .and_then(SessionId::from_backend);

        let health_data = match json.get("health_data") {
            None | Some(serde_json::Value::Null) => None,
            Some(raw) => match serde_json::from_value::<HealthData>(raw.clone()) {
                Ok(data) => Some(data),
                Err(e) => {
                    warn!(error = %e, "discarding malformed health_data");
                    None
                }
            },
        };

        Ok(ChatReply {
            reply,
            session_id,
            health_data,
        })
    }

    /// Pull the `error` string out of a failure body, if it has one.
    pub(crate) fn error_from_body(body: &str) -> ChatError {
        let message = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|json| json["error"].as_str().map(String::from))
            .filter(|e| !e.is_empty())
            .unwrap_or_else(|| GENERIC_BACKEND_ERROR.to_string());
        ChatError::Backend(message)
    }

    fn connectivity_error(&self, err: &reqwest::Error) -> ChatError {
        debug!(
            error = %err,
            connect = err.is_connect(),
            timeout = err.is_timeout(),
            "backend unreachable"
        );
        ChatError::Connectivity(format!(
            "Unable to connect to backend. Make sure it's running on {}.",
            self.config.base()
        ))
    }
}

#[async_trait]
impl ChatBackend for HttpBackend {
    async fn send(
        &self,
        text: &str,
        session_id: Option<&SessionId>,
    ) -> Result<ChatReply, ChatError> {
        let url = format!("{}/chat", self.config.base());
        let body = Self::build_request_body(text, session_id);

        debug!(%url, has_session = session_id.is_some(), "chat request");

        let response = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.connectivity_error(&e))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            debug!(%status, "backend returned failure status");
            return Err(Self::error_from_body(&text));
        }

        let json: serde_json::Value = response.json().await.map_err(|e| {
            warn!(error = %e, "backend reply is not valid JSON");
            ChatError::Backend(GENERIC_BACKEND_ERROR.to_string())
        })?;

        Self::parse_response(json)
    }
}
