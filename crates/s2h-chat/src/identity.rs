//! Identity context and password sign-in against the hosted auth service.

use std::fmt;

use serde::Deserialize;
use tracing::{debug, info};

/// The signed-in user, as seen by the record store.
#[derive(Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: String,
    pub email: Option<String>,
    /// Bearer token for row-level-security scoped requests.
    pub access_token: Option<String>,
}

impl Identity {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            email: None,
            access_token: None,
        }
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity")
            .field("user_id", &self.user_id)
            .field("email", &self.email)
            .field("access_token", &self.access_token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Accessor the session controller consults before a write-through.
pub trait IdentitySource: Send + Sync {
    fn current(&self) -> Option<Identity>;
}

/// An identity fixed at start-up (or none, for guests).
#[derive(Debug, Clone, Default)]
pub struct StaticIdentity(Option<Identity>);

impl StaticIdentity {
    pub fn anonymous() -> Self {
        Self(None)
    }

    pub fn signed_in(identity: Identity) -> Self {
        Self(Some(identity))
    }
}

impl IdentitySource for StaticIdentity {
    fn current(&self) -> Option<Identity> {
        self.0.clone()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("auth service unreachable: {0}")]
    Transport(String),
    #[error("{0}")]
    Rejected(String),
    #[error("check {0} for a confirmation link, then sign in")]
    ConfirmationRequired(String),
    #[error("unexpected auth response: {0}")]
    Decode(String),
}

#[derive(Deserialize)]
struct AuthUser {
    id: String,
    #[serde(default)]
    email: Option<String>,
}

/// Either a full session or, when email confirmation is on, a bare user.
#[derive(Deserialize)]
struct AuthResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    user: Option<AuthUser>,
    #[serde(default)]
    email: Option<String>,
}

/// Password auth against a GoTrue-compatible service (`/auth/v1`).
pub struct SupabaseAuth {
    url: String,
    anon_key: String,
    http: reqwest::Client,
}

impl SupabaseAuth {
    pub fn new(url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            url: url.into().trim_end_matches('/').to_string(),
            anon_key: anon_key.into(),
            http: reqwest::Client::new(),
        }
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        let url = format!("{}/auth/v1/token?grant_type=password", self.url);
        let identity = self.post(&url, email, password).await?;
        info!(user_id = %identity.user_id, "signed in");
        Ok(identity)
    }

    pub async fn sign_up(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        let url = format!("{}/auth/v1/signup", self.url);
        let identity = self.post(&url, email, password).await?;
        info!(user_id = %identity.user_id, "signed up");
        Ok(identity)
    }

    async fn post(&self, url: &str, email: &str, password: &str) -> Result<Identity, AuthError> {
        debug!(%url, "auth request");
        let response = self
            .http
            .post(url)
            .header("apikey", &self.anon_key)
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await
            .map_err(|e| AuthError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AuthError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(AuthError::Rejected(rejection_message(&body, status)));
        }

        let parsed: AuthResponse =
            serde_json::from_str(&body).map_err(|e| AuthError::Decode(e.to_string()))?;

        match (parsed.access_token, parsed.user) {
            (Some(token), Some(user)) => Ok(Identity {
                user_id: user.id,
                email: user.email.or_else(|| Some(email.to_string())),
                access_token: Some(token),
            }),
            (None, _) => Err(AuthError::ConfirmationRequired(
                parsed.email.unwrap_or_else(|| email.to_string()),
            )),
            (Some(_), None) => Err(AuthError::Decode("session without user".into())),
        }
    }
}

fn rejection_message(body: &str, status: reqwest::StatusCode) -> String {
    let json: serde_json::Value = serde_json::from_str(body).unwrap_or_default();
    ["error_description", "msg", "message", "error"]
        .iter()
        .find_map(|key| json[*key].as_str().map(String::from))
        .unwrap_or_else(|| format!("auth failed: HTTP {status}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn static_identity_yields_what_it_holds() {
        assert!(StaticIdentity::anonymous().current().is_none());
        let id = StaticIdentity::signed_in(Identity::new("u1"));
        assert_eq!(id.current().unwrap().user_id, "u1");
    }

    #[test]
    fn debug_redacts_token() {
        let identity = Identity {
            user_id: "u1".into(),
            email: None,
            access_token: Some("secret-token".into()),
        };
        let out = format!("{identity:?}");
        assert!(!out.contains("secret-token"));
        assert!(out.contains("[REDACTED]"));
    }

    #[tokio::test]
    async fn sign_in_returns_identity() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .and(query_param("grant_type", "password"))
            .and(header("apikey", "anon"))
            .and(body_json(json!({ "email": "a@b.co", "password": "pw" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "jwt",
                "user": { "id": "u1", "email": "a@b.co" }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let auth = SupabaseAuth::new(server.uri(), "anon");
        let identity = auth.sign_in("a@b.co", "pw").await.unwrap();
        assert_eq!(identity.user_id, "u1");
        assert_eq!(identity.access_token.as_deref(), Some("jwt"));
        assert_eq!(identity.email.as_deref(), Some("a@b.co"));
    }

    #[tokio::test]
    async fn bad_credentials_are_rejected_with_service_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": "invalid_grant",
                "error_description": "Invalid login credentials"
            })))
            .mount(&server)
            .await;

        let auth = SupabaseAuth::new(server.uri(), "anon");
        let err = auth.sign_in("a@b.co", "nope").await.unwrap_err();
        assert_eq!(err, AuthError::Rejected("Invalid login credentials".into()));
    }

    #[tokio::test]
    async fn sign_up_pending_confirmation() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/signup"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "u2",
                "email": "new@b.co"
            })))
            .mount(&server)
            .await;

        let auth = SupabaseAuth::new(server.uri(), "anon");
        let err = auth.sign_up("new@b.co", "pw123456").await.unwrap_err();
        assert_eq!(err, AuthError::ConfirmationRequired("new@b.co".into()));
    }

    #[tokio::test]
    async fn sign_up_with_autoconfirm_signs_in() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/signup"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "jwt2",
                "user": { "id": "u3" }
            })))
            .mount(&server)
            .await;

        let auth = SupabaseAuth::new(format!("{}/", server.uri()), "anon");
        let identity = auth.sign_up("c@b.co", "pw123456").await.unwrap();
        assert_eq!(identity.user_id, "u3");
        assert_eq!(identity.email.as_deref(), Some("c@b.co"));
    }
}
