//! Local session persistence.
//!
//! Storage is a cache for continuity across restarts, not a durability
//! guarantee: every read failure degrades to "no prior session" and every
//! write failure is reported as a `PersistenceError` for the caller to drop.

mod kv;
mod session_store;

pub use kv::{FileStore, KeyValueStore, MemoryStore, PersistenceError};
pub use session_store::{Session, SessionStore, DEFAULT_CHAT_SLOT, DEFAULT_PROFILE_SLOT};
