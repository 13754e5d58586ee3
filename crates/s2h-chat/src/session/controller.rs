//! Session controller: transcript state machine over the backend and store.

use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, info, warn};

use s2h_common::{new_correlation_id, Message, SessionId};

use crate::backend::ChatBackend;
use crate::identity::IdentitySource;
use crate::records::RecordStore;
use crate::store::SessionStore;
use crate::HealthData;

use super::types::{PendingTurn, SessionState, TurnOutcome};

struct Inner {
    transcript: Vec<Message>,
    session_id: Option<SessionId>,
    error: Option<String>,
    last_attempted: Option<String>,
    state: SessionState,
    /// Bumped by `reset`; replies tagged with an older epoch are dropped.
    epoch: u64,
}

impl Inner {
    fn fresh(epoch: u64) -> Self {
        Self {
            transcript: vec![Message::seed()],
            session_id: None,
            error: None,
            last_attempted: None,
            state: SessionState::Idle,
            epoch,
        }
    }
}

/// Owns the visible conversation and coordinates one chat turn at a time.
///
/// The lock is never held across an `.await`, so a shared
/// `Arc<SessionController>` can be reset while a turn is in flight.
pub struct SessionController {
    inner: Mutex<Inner>,
    store: SessionStore,
    backend: Arc<dyn ChatBackend>,
    identity: Arc<dyn IdentitySource>,
    /// Resolved once at construction; `None` disables write-through.
    records: Option<Arc<dyn RecordStore>>,
}

impl SessionController {
    /// Start from a fresh seed transcript, ignoring anything stored.
    pub fn new(
        store: SessionStore,
        backend: Arc<dyn ChatBackend>,
        identity: Arc<dyn IdentitySource>,
    ) -> Self {
        Self {
            inner: Mutex::new(Inner::fresh(0)),
            store,
            backend,
            identity,
            records: None,
        }
    }

    /// Resume the stored conversation when there is one.
    pub fn restore(
        store: SessionStore,
        backend: Arc<dyn ChatBackend>,
        identity: Arc<dyn IdentitySource>,
    ) -> Self {
        let controller = Self::new(store, backend, identity);
        if let Some(saved) = controller.store.load() {
            info!(
                messages = saved.transcript.len(),
                has_session = saved.session_id.is_some(),
                "restored previous conversation"
            );
            let mut inner = controller.lock();
            inner.transcript = saved.transcript;
            inner.session_id = saved.session_id;
            drop(inner);
        }
        controller
    }

    pub fn with_records(mut self, records: Arc<dyn RecordStore>) -> Self {
        self.records = Some(records);
        self
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Send one user turn.
    ///
    /// Blank input is rejected without touching state. Otherwise the user
    /// message is appended before the request leaves.
    pub async fn send(&self, text: &str) -> TurnOutcome {
        if text.trim().is_empty() {
            return TurnOutcome::Rejected;
        }

        let turn = self.begin_turn(text);
        debug!(
            turn = %turn.correlation_id,
            epoch = turn.epoch,
            has_session = turn.session_id.is_some(),
            "sending chat turn"
        );

        let result = self.backend.send(text, turn.session_id.as_ref()).await;

        let mut inner = self.lock();
        if inner.epoch != turn.epoch {
            debug!(turn = %turn.correlation_id, "discarding reply for a reset session");
            return TurnOutcome::Stale;
        }

        match result {
            Ok(reply) => {
                inner.transcript.push(Message::bot(reply.reply.as_str()));
                inner.session_id = reply.session_id;
                inner.state = SessionState::Idle;
                self.persist(&inner);
                drop(inner);

                let write_through = reply
                    .health_data
                    .and_then(|data| self.spawn_write_through(data, &turn.correlation_id));
                TurnOutcome::Replied {
                    reply: reply.reply,
                    write_through,
                }
            }
            Err(e) => {
                let message = e.to_string();
                warn!(turn = %turn.correlation_id, error = %message, "chat turn failed");
                inner.error = Some(message.clone());
                inner.state = SessionState::ErrorShown;
                TurnOutcome::Failed(message)
            }
        }
    }

    /// Re-send the text of the failed turn verbatim.
    pub async fn retry(&self) -> TurnOutcome {
        let text = {
            let inner = self.lock();
            match (&inner.state, &inner.last_attempted) {
                (SessionState::ErrorShown, Some(text)) => text.clone(),
                _ => return TurnOutcome::NothingToRetry,
            }
        };
        self.send(&text).await
    }

    /// Drop the conversation and start over from the seed message.
    pub fn reset(&self) {
        let mut inner = self.lock();
        if let Err(e) = self.store.clear() {
            debug!(error = %e, "stored session not cleared");
        }
        let next_epoch = inner.epoch.wrapping_add(1);
        *inner = Inner::fresh(next_epoch);
        info!(epoch = next_epoch, "conversation reset");
    }

    pub fn transcript(&self) -> Vec<Message> {
        self.lock().transcript.clone()
    }

    pub fn session_id(&self) -> Option<SessionId> {
        self.lock().session_id.clone()
    }

    pub fn error(&self) -> Option<String> {
        self.lock().error.clone()
    }

    pub fn state(&self) -> SessionState {
        self.lock().state
    }

    pub fn last_attempted(&self) -> Option<String> {
        self.lock().last_attempted.clone()
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn records_enabled(&self) -> bool {
        self.records.is_some()
    }

    fn begin_turn(&self, text: &str) -> PendingTurn {
        let mut inner = self.lock();
        inner.transcript.push(Message::user(text));
        inner.error = None;
        inner.last_attempted = Some(text.to_string());
        inner.state = SessionState::Sending;
        self.persist(&inner);
        PendingTurn {
            epoch: inner.epoch,
            session_id: inner.session_id.clone(),
            correlation_id: new_correlation_id(),
        }
    }

    /// Best-effort save. The seed-only transcript is never written.
    fn persist(&self, inner: &Inner) {
        if inner.transcript.len() <= 1 && inner.session_id.is_none() {
            return;
        }
        if let Err(e) = self.store.save(&inner.transcript, inner.session_id.as_ref()) {
            debug!(error = %e, "session not persisted");
        }
    }

    fn spawn_write_through(
        &self,
        data: HealthData,
        turn: &str,
    ) -> Option<tokio::task::JoinHandle<()>> {
        let records = self.records.clone()?;
        let Some(identity) = self.identity.current() else {
            debug!(turn = %turn, "no signed-in user, health data not saved");
            return None;
        };

        let turn = turn.to_string();
        Some(tokio::spawn(async move {
            match records.insert(&data, Some(&identity)).await {
                Ok(record) => {
                    info!(turn = %turn, record_id = %record.id, "health data saved");
                }
                Err(e) => {
                    warn!(turn = %turn, error = %e, "failed to save health data");
                }
            }
        }))
    }
}
