pub mod errors;
pub mod id;
pub mod types;

pub use errors::{ConfigError, S2hError};
pub use id::{new_correlation_id, SessionId};
pub use types::{display_time, Message, Sender, SEED_GREETING};

pub type Result<T> = std::result::Result<T, S2hError>;
