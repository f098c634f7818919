//! Error types for the session layer.

use pso_records::RecordError;
use thiserror::Error;

/// Errors raised while driving a client session.
#[derive(Error, Debug)]
pub enum SessionError {
    /// Another session already holds the character slot.
    #[error("Character slot {slot} of {username} is already in use")]
    SlotActive {
        /// Account name.
        username: String,
        /// Zero-based slot.
        slot: usize,
    },

    /// A record operation failed.
    #[error(transparent)]
    Record(#[from] RecordError),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The tracing subscriber could not be installed.
    #[error("Logging setup failed: {0}")]
    Logging(String),
}

/// Convenience Result type alias.
pub type Result<T> = std::result::Result<T, SessionError>;
