//! Transcript envelope and profile slot on top of a `KeyValueStore`.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use s2h_common::{Message, SessionId};

use super::kv::{KeyValueStore, PersistenceError};

pub const DEFAULT_CHAT_SLOT: &str = "stress2health_chat";
pub const DEFAULT_PROFILE_SLOT: &str = "stress2health_userName";

/// A restorable conversation.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub session_id: Option<SessionId>,
    pub transcript: Vec<Message>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Envelope {
    messages: Vec<Message>,
    #[serde(default)]
    session_id: Option<SessionId>,
    /// Unix milliseconds.
    #[serde(default)]
    saved_at: i64,
}

#[derive(Clone)]
pub struct SessionStore {
    kv: Arc<dyn KeyValueStore>,
    chat_slot: String,
    profile_slot: String,
}

impl SessionStore {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self {
            kv,
            chat_slot: DEFAULT_CHAT_SLOT.to_string(),
            profile_slot: DEFAULT_PROFILE_SLOT.to_string(),
        }
    }

    pub fn with_slots(mut self, chat: impl Into<String>, profile: impl Into<String>) -> Self {
        self.chat_slot = chat.into();
        self.profile_slot = profile.into();
        self
    }

    /// Read the saved conversation. Absent, unreadable, corrupt, and
    /// empty-transcript envelopes all yield `None`.
    pub fn load(&self) -> Option<Session> {
        let raw = match self.kv.get(&self.chat_slot) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                debug!(slot = %self.chat_slot, error = %e, "session slot unreadable");
                return None;
            }
        };

        let envelope: Envelope = match serde_json::from_str(&raw) {
            Ok(envelope) => envelope,
            Err(e) => {
                debug!(slot = %self.chat_slot, error = %e, "ignoring corrupt session envelope");
                return None;
            }
        };

        if envelope.messages.is_empty() {
            return None;
        }

        Some(Session {
            session_id: envelope.session_id,
            transcript: envelope.messages,
        })
    }

    /// Overwrite the envelope, stamping the current time.
    pub fn save(
        &self,
        transcript: &[Message],
        session_id: Option<&SessionId>,
    ) -> Result<(), PersistenceError> {
        let envelope = Envelope {
            messages: transcript.to_vec(),
            session_id: session_id.cloned(),
            saved_at: chrono::Utc::now().timestamp_millis(),
        };
        let json = serde_json::to_string(&envelope)?;
        self.kv.set(&self.chat_slot, &json)
    }

    pub fn clear(&self) -> Result<(), PersistenceError> {
        self.kv.remove(&self.chat_slot)
    }

    /// Timestamp of the last save, in Unix milliseconds.
    pub fn saved_at(&self) -> Option<i64> {
        let raw = self.kv.get(&self.chat_slot).ok()??;
        serde_json::from_str::<Envelope>(&raw)
            .ok()
            .map(|envelope| envelope.saved_at)
    }

    pub fn display_name(&self) -> Option<String> {
        match self.kv.get(&self.profile_slot) {
            Ok(name) => name.filter(|n| !n.trim().is_empty()),
            Err(e) => {
                debug!(slot = %self.profile_slot, error = %e, "profile slot unreadable");
                None
            }
        }
    }

    /// Store a trimmed display name. Blank names are ignored.
    pub fn set_display_name(&self, name: &str) -> Result<(), PersistenceError> {
        let name = name.trim();
        if name.is_empty() {
            return Ok(());
        }
        self.kv.set(&self.profile_slot, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn store() -> (Arc<MemoryStore>, SessionStore) {
        let kv = Arc::new(MemoryStore::new());
        (kv.clone(), SessionStore::new(kv))
    }

    fn sid(raw: &str) -> SessionId {
        SessionId::from_backend(raw).unwrap()
    }

    #[test]
    fn load_on_empty_store_is_none() {
        let (_, store) = store();
        assert!(store.load().is_none());
    }

    #[test]
    fn save_then_load_round_trips() {
        let (_, store) = store();
        let transcript = vec![Message::seed(), Message::user("I slept badly")];
        store.save(&transcript, Some(&sid("abc"))).unwrap();

        let session = store.load().unwrap();
        assert_eq!(session.transcript, transcript);
        assert_eq!(session.session_id, Some(sid("abc")));
    }

    #[test]
    fn save_without_session_id_loads_none() {
        let (_, store) = store();
        store.save(&[Message::seed(), Message::user("hi")], None).unwrap();
        assert_eq!(store.load().unwrap().session_id, None);
    }

    #[test]
    fn envelope_uses_camel_case_keys() {
        let (kv, store) = store();
        store.save(&[Message::seed()], Some(&sid("abc"))).unwrap();
        let raw = kv.get(DEFAULT_CHAT_SLOT).unwrap().unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(json["sessionId"], "abc");
        assert!(json["savedAt"].as_i64().unwrap() > 0);
        assert_eq!(json["messages"][0]["sender"], "bot");
    }

    #[test]
    fn corrupt_envelope_is_none() {
        let (kv, store) = store();
        kv.set(DEFAULT_CHAT_SLOT, "{not json").unwrap();
        assert!(store.load().is_none());
    }

    #[test]
    fn empty_transcript_is_none() {
        let (kv, store) = store();
        kv.set(DEFAULT_CHAT_SLOT, r#"{"messages":[],"sessionId":"x","savedAt":1}"#)
            .unwrap();
        assert!(store.load().is_none());
    }

    #[test]
    fn envelope_without_session_id_still_loads() {
        let (kv, store) = store();
        kv.set(
            DEFAULT_CHAT_SLOT,
            r#"{"messages":[{"text":"hi","sender":"user","timestamp":"10:00"}]}"#,
        )
        .unwrap();
        let session = store.load().unwrap();
        assert_eq!(session.transcript.len(), 1);
        assert_eq!(session.session_id, None);
    }

    #[test]
    fn clear_twice_leaves_slot_absent() {
        let (kv, store) = store();
        store.save(&[Message::seed()], None).unwrap();
        store.clear().unwrap();
        assert_eq!(kv.get(DEFAULT_CHAT_SLOT).unwrap(), None);
        store.clear().unwrap();
        assert_eq!(kv.get(DEFAULT_CHAT_SLOT).unwrap(), None);
    }

    #[test]
    fn custom_slots_are_used() {
        let kv = Arc::new(MemoryStore::new());
        let store = SessionStore::new(kv.clone()).with_slots("chat2", "name2");
        store.save(&[Message::seed()], None).unwrap();
        store.set_display_name("Sam").unwrap();
        assert!(kv.get("chat2").unwrap().is_some());
        assert_eq!(kv.get("name2").unwrap().as_deref(), Some("Sam"));
        assert_eq!(kv.get(DEFAULT_CHAT_SLOT).unwrap(), None);
    }

    #[test]
    fn display_name_is_trimmed_and_blank_ignored() {
        let (_, store) = store();
        assert_eq!(store.display_name(), None);
        store.set_display_name("  Ada  ").unwrap();
        assert_eq!(store.display_name().as_deref(), Some("Ada"));
        store.set_display_name("   ").unwrap();
        assert_eq!(store.display_name().as_deref(), Some("Ada"));
    }

    #[test]
    fn display_name_survives_session_clear() {
        let (_, store) = store();
        store.set_display_name("Ada").unwrap();
        store.save(&[Message::seed()], None).unwrap();
        store.clear().unwrap();
        assert_eq!(store.display_name().as_deref(), Some("Ada"));
    }

    #[test]
    fn saved_at_reflects_last_save() {
        let (_, store) = store();
        assert_eq!(store.saved_at(), None);
        store.save(&[Message::seed()], None).unwrap();
        assert!(store.saved_at().unwrap() > 0);
    }
}
