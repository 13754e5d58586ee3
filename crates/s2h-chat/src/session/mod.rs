//! Conversation session management.
//!
//! `SessionController` owns the visible transcript and drives one chat turn
//! at a time through the backend, persisting after every mutation and
//! forwarding completed assessments to the record store.

mod controller;
mod types;


pub use controller::SessionController;
pub use types::{SessionState, TurnOutcome};
