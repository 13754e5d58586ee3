//! Session state and turn outcomes.

use s2h_common::SessionId;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Sending,
    ErrorShown,
}

/// What a `send` or `retry` call did.
#[derive(Debug)]
pub enum TurnOutcome {
    /// Input was blank; nothing changed.
    Rejected,
    /// `retry` with no failed turn to repeat.
    NothingToRetry,
    /// Bot reply appended. `write_through` is the spawned record-store task,
    /// if one was started.
    Replied {
        reply: String,
        write_through: Option<JoinHandle<()>>,
    },
    /// The turn failed; the message is now the visible error.
    Failed(String),
    /// The session was reset while the request was in flight; the response
    /// was discarded.
    Stale,
}

/// Snapshot taken when a turn leaves for the backend.
pub(super) struct PendingTurn {
    pub(super) epoch: u64,
    pub(super) session_id: Option<SessionId>,
    pub(super) correlation_id: String,
}
