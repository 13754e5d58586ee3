//! Conversation core for the Stress2Health client.
//!
//! Provides:
//! - An HTTP client for the chat inference backend
//! - Slot-based local persistence of the transcript and profile
//! - The session controller (optimistic echo, retry, reset, stale-reply discard)
//! - Write-through of completed assessments to a hosted record store
//! - Password sign-in against the hosted auth service

pub mod backend;
pub mod identity;
pub mod records;
pub mod session;
pub mod store;

use serde::{Deserialize, Serialize};

use s2h_common::SessionId;

pub use backend::{ChatBackend, HttpBackend, HttpBackendConfig};
pub use identity::{AuthError, Identity, IdentitySource, StaticIdentity, SupabaseAuth};
pub use records::{HealthRecord, InsertedRecord, RecordStore, SupabaseRecords, WriteThroughError};
pub use session::{SessionController, SessionState, TurnOutcome};
pub use store::{FileStore, KeyValueStore, MemoryStore, PersistenceError, Session, SessionStore};

/// Completed assessment emitted by the backend once it has enough answers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthData {
    pub stress_level: String,
    pub sleep_hours: f64,
    pub bmi: f64,
    pub activity_level: String,
    /// Risk summary text.
    pub health_risks: String,
}

/// One backend reply, normalized.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatReply {
    pub reply: String,
    pub session_id: Option<SessionId>,
    pub health_data: Option<HealthData>,
}

/// Errors that reach the user through the controller's error slot.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChatError {
    #[error("{0}")]
    Connectivity(String),
    #[error("{0}")]
    Backend(String),
}
