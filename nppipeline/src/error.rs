//! Error types for the now-playing pipeline

use std::io;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Errors raised by the pipeline components
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// `send` was called on a gate whose transport never opened
    #[error("Transport is not open")]
    TransportNotOpen,

    /// The transport could not be opened
    #[error("Failed to open transport: {0}")]
    TransportOpen(#[source] io::Error),

    /// A datagram could not be sent
    #[error("Failed to send on transport: {0}")]
    TransportSend(#[source] io::Error),

    /// Credential renewal was rejected or could not be performed
    #[error("Credential renewal failed: {0}")]
    Renewal(String),
}

impl PipelineError {
    /// Create a renewal error from any displayable cause
    pub fn renewal(msg: impl ToString) -> Self {
        Self::Renewal(msg.to_string())
    }
}
