//! Display transport strategy and its readiness gate

use crate::error::{PipelineError, Result};
use crate::readiness::{ReadinessCoordinator, Signal};
use async_trait::async_trait;
use std::io;
use tracing::{debug, info, warn};

/// A fire-and-forget channel to a display surface
///
/// Implementations own their socket. `open` is called once by the
/// [`TransportGate`]; `send` is only called after `open` succeeded.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Short description of the peer, for logs
    fn describe(&self) -> String;

    /// Opens the underlying socket
    async fn open(&mut self) -> io::Result<()>;

    /// Initial datagram sent right after opening
    async fn handshake(&self) -> io::Result<()> {
        Ok(())
    }

    /// Transmits one display message
    async fn send(&self, message: &str) -> io::Result<()>;

    /// Largest message the peer accepts, in characters (`None`: unbounded)
    fn max_message_len(&self) -> Option<usize> {
        None
    }
}

/// Owns a [`Transport`] and its open/not-open state
///
/// Opening raises [`Signal::TRANSPORT`] on the coordinator.
pub struct TransportGate<T> {
    transport: T,
    readiness: ReadinessCoordinator,
    open: bool,
}

impl<T: Transport> TransportGate<T> {
    pub fn new(transport: T, readiness: ReadinessCoordinator) -> Self {
        readiness.register(Signal::TRANSPORT);
        Self {
            transport,
            readiness,
            open: false,
        }
    }

    /// Opens the transport, raises the transport signal and sends the handshake
    ///
    /// A failed handshake is logged only; the transport stays open.
    pub async fn open(&mut self) -> Result<()> {
        if self.open {
            return Ok(());
        }

        self.transport
            .open()
            .await
            .map_err(PipelineError::TransportOpen)?;
        self.open = true;
        info!(peer = %self.transport.describe(), "Transport opened");

        self.readiness.raise(Signal::TRANSPORT);

        if let Err(e) = self.transport.handshake().await {
            warn!(peer = %self.transport.describe(), "Transport handshake failed: {}", e);
        }

        Ok(())
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Sends a payload to the peer
    ///
    /// Send errors are logged here; the returned error lets callers count
    /// them but is never retried.
    pub async fn send(&self, payload: &str) -> Result<()> {
        if !self.open {
            return Err(PipelineError::TransportNotOpen);
        }

        match self.transport.send(payload).await {
            Ok(()) => {
                debug!(peer = %self.transport.describe(), len = payload.len(), "Payload sent");
                Ok(())
            }
            Err(e) => {
                warn!(peer = %self.transport.describe(), "Failed to send payload: {}", e);
                Err(PipelineError::TransportSend(e))
            }
        }
    }

    pub fn max_message_len(&self) -> Option<usize> {
        self.transport.max_message_len()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }
}
