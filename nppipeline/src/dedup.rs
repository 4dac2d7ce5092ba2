//! Suppression of consecutive identical display messages

use crate::transport::{Transport, TransportGate};
use tracing::{debug, trace};

/// What [`DedupDispatcher::dispatch`] did with a message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Same as the last message handed to the transport
    Suppressed,
    Sent,
    /// Handed to the transport, which reported an error
    SendFailed,
}

/// Forwards a message only when it differs from the previous one
///
/// The last message is remembered after every send attempt, failed or not,
/// so a failing transport is not hammered with the same datagram.
pub struct DedupDispatcher<T> {
    gate: TransportGate<T>,
    last_sent: Option<String>,
}

impl<T: Transport> DedupDispatcher<T> {
    pub fn new(gate: TransportGate<T>) -> Self {
        Self {
            gate,
            last_sent: None,
        }
    }

    pub async fn dispatch(&mut self, message: String) -> DispatchOutcome {
        if self.last_sent.as_deref() == Some(message.as_str()) {
            trace!("Message unchanged, not sent");
            return DispatchOutcome::Suppressed;
        }

        let outcome = match self.gate.send(&message).await {
            Ok(()) => {
                debug!(message = %message, "Display updated");
                DispatchOutcome::Sent
            }
            Err(_) => DispatchOutcome::SendFailed,
        };
        self.last_sent = Some(message);
        outcome
    }

    pub fn last_sent(&self) -> Option<&str> {
        self.last_sent.as_deref()
    }

    pub fn gate(&self) -> &TransportGate<T> {
        &self.gate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::readiness::ReadinessCoordinator;
    use crate::transport::testing::RecordingTransport;

    async fn dispatcher(transport: RecordingTransport) -> DedupDispatcher<RecordingTransport> {
        let mut gate = TransportGate::new(transport, ReadinessCoordinator::new());
        gate.open().await.unwrap();
        DedupDispatcher::new(gate)
    }

    #[tokio::test]
    async fn test_identical_message_sent_once() {
        let transport = RecordingTransport::default();
        let mut dispatcher = dispatcher(transport.clone()).await;

        assert_eq!(dispatcher.dispatch("a".into()).await, DispatchOutcome::Sent);
        assert_eq!(
            dispatcher.dispatch("a".into()).await,
            DispatchOutcome::Suppressed
        );
        assert_eq!(transport.sent(), vec!["a"]);
    }

    #[tokio::test]
    async fn test_changed_message_is_sent() {
        let transport = RecordingTransport::default();
        let mut dispatcher = dispatcher(transport.clone()).await;

        dispatcher.dispatch("a".into()).await;
        dispatcher.dispatch("b".into()).await;
        dispatcher.dispatch("a".into()).await;
        assert_eq!(transport.sent(), vec!["a", "b", "a"]);
        assert_eq!(dispatcher.last_sent(), Some("a"));
    }

    #[tokio::test]
    async fn test_failed_send_still_updates_cache() {
        let transport = RecordingTransport::default();
        let mut dispatcher = dispatcher(transport.clone()).await;

        transport.set_fail_send(true);
        assert_eq!(
            dispatcher.dispatch("a".into()).await,
            DispatchOutcome::SendFailed
        );
        transport.set_fail_send(false);
        assert_eq!(
            dispatcher.dispatch("a".into()).await,
            DispatchOutcome::Suppressed
        );
        assert_eq!(transport.sent().len(), 1);
    }
}
