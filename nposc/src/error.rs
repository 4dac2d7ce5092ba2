//! Error types for the OSC codec and transport

use std::io;

/// Result type alias for OSC operations
pub type Result<T> = std::result::Result<T, OscError>;

#[derive(Debug, thiserror::Error)]
pub enum OscError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The packet ends before the announced content
    #[error("Truncated OSC packet")]
    Truncated,

    /// A string is not null terminated or not valid UTF-8
    #[error("Invalid OSC string")]
    InvalidString,

    #[error("Unsupported OSC type tag '{0}'")]
    UnsupportedTag(char),

    /// Addresses must start with '/'
    #[error("Invalid OSC address: {0}")]
    BadAddress(String),
}
