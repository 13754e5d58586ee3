//! Remote conversation client.
//!
//! `ChatBackend` is the transport seam the session controller talks to;
//! `HttpBackend` is the production implementation over reqwest.

mod client;
mod config;


use async_trait::async_trait;

use s2h_common::SessionId;

use crate::{ChatError, ChatReply};

pub use client::HttpBackend;
pub use config::HttpBackendConfig;

/// Substituted when the backend answers successfully with no reply text.
pub const EMPTY_REPLY_PLACEHOLDER: &str = "I'm here to help! Could you tell me more?";

/// Surfaced when the backend fails without saying why.
pub const GENERIC_BACKEND_ERROR: &str = "Unable to connect to AI service";

#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Send one user turn. `session_id` is `None` until the backend has
    /// issued one.
    async fn send(&self, text: &str, session_id: Option<&SessionId>)
        -> Result<ChatReply, ChatError>;
}
