//! Error types for emberplay.
//!
//! Most lifecycle operations deliberately report failure through boolean
//! returns or no-ops (see the player documentation); this error type covers
//! the fallible query and configuration paths.

use thiserror::Error;

/// Result type for emberplay operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for emberplay operations.
#[derive(Debug, Error)]
pub enum Error {
    /// No live player instance is available for a capability query.
    #[error("No player available for support checks")]
    NoSupportCheckPlayer,

    /// A frame could not be decrypted by the EME implementation.
    #[error("Decryption failed: {0}")]
    Decryption(String),

    /// A configuration document could not be parsed.
    #[error("Invalid config: {0}")]
    InvalidConfig(#[from] serde_json::Error),
}

impl Error {
    /// Create a new Decryption error.
    pub fn decryption<S: Into<String>>(msg: S) -> Self {
        Self::Decryption(msg.into())
    }
}
