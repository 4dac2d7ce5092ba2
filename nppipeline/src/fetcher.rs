//! Snapshot source strategy and the readiness-guarded fetcher

use crate::readiness::ReadinessCoordinator;
use crate::snapshot::{FetchOutcome, PlaybackSnapshot};
use async_trait::async_trait;
use tracing::{debug, warn};

/// Tells whether an error means the credential was rejected
pub trait AuthClassify {
    fn is_auth_error(&self) -> bool;
}

/// A remote "currently playing" endpoint
///
/// `Ok(None)` means nothing is playing.
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    type Error: std::error::Error + AuthClassify + Send;

    fn name(&self) -> &str;

    async fn current_snapshot(&self) -> Result<Option<PlaybackSnapshot>, Self::Error>;
}

/// Performs the periodic query, only while every readiness signal is up
pub struct SnapshotFetcher<S> {
    source: S,
    readiness: ReadinessCoordinator,
}

impl<S: SnapshotSource> SnapshotFetcher<S> {
    pub fn new(source: S, readiness: ReadinessCoordinator) -> Self {
        Self { source, readiness }
    }

    /// Queries the source and classifies the result
    ///
    /// Returns [`FetchOutcome::Skipped`] without any network call when a
    /// readiness signal is down.
    pub async fn fetch(&self) -> FetchOutcome {
        if !self.readiness.all_raised() {
            debug!(source = self.source.name(), "Not ready, fetch skipped");
            return FetchOutcome::Skipped;
        }

        match self.source.current_snapshot().await {
            Ok(Some(snapshot)) => FetchOutcome::Snapshot(snapshot),
            Ok(None) => FetchOutcome::NoContent,
            Err(e) if e.is_auth_error() => {
                warn!(source = self.source.name(), "Credential rejected: {}", e);
                FetchOutcome::AuthFailure(e.to_string())
            }
            Err(e) => {
                warn!(source = self.source.name(), "Fetch failed: {}", e);
                FetchOutcome::TransientFailure(e.to_string())
            }
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    #[derive(Debug, thiserror::Error)]
    pub enum FakeError {
        #[error("token expired")]
        Expired,
        #[error("server error")]
        Server,
    }

    impl AuthClassify for FakeError {
        fn is_auth_error(&self) -> bool {
            matches!(self, FakeError::Expired)
        }
    }

    pub type Scripted = Result<Option<PlaybackSnapshot>, FakeError>;

    /// Source replaying scripted responses, then repeating the last snapshot
    ///
    /// The first `slow_calls` queries take `latency` to answer.
    #[derive(Clone, Default)]
    pub struct ScriptedSource {
        pub script: Arc<Mutex<VecDeque<Scripted>>>,
        pub calls: Arc<Mutex<usize>>,
        pub fallback: Option<PlaybackSnapshot>,
        pub latency: Duration,
        pub slow_calls: usize,
        pub in_flight: Arc<Mutex<usize>>,
        pub max_in_flight: Arc<Mutex<usize>>,
    }

    impl ScriptedSource {
        pub fn push(&self, response: Scripted) {
            self.script.lock().unwrap().push_back(response);
        }

        pub fn calls(&self) -> usize {
            *self.calls.lock().unwrap()
        }

        pub fn max_in_flight(&self) -> usize {
            *self.max_in_flight.lock().unwrap()
        }
    }

    #[async_trait]
    impl SnapshotSource for ScriptedSource {
        type Error = FakeError;

        fn name(&self) -> &str {
            "scripted"
        }

        async fn current_snapshot(&self) -> Result<Option<PlaybackSnapshot>, FakeError> {
            let call = {
                let mut calls = self.calls.lock().unwrap();
                *calls += 1;
                *calls
            };
            {
                let mut in_flight = self.in_flight.lock().unwrap();
                *in_flight += 1;
                let mut max = self.max_in_flight.lock().unwrap();
                *max = (*max).max(*in_flight);
            }
            if call <= self.slow_calls {
                tokio::time::sleep(self.latency).await;
            }
            *self.in_flight.lock().unwrap() -= 1;

            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(self.fallback.clone()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::{FakeError, ScriptedSource};
    use super::*;
    use crate::readiness::Signal;

    fn ready() -> ReadinessCoordinator {
        let readiness = ReadinessCoordinator::new();
        readiness.register(Signal::CREDENTIAL);
        readiness.register(Signal::TRANSPORT);
        readiness.raise(Signal::CREDENTIAL);
        readiness.raise(Signal::TRANSPORT);
        readiness
    }

    fn song() -> PlaybackSnapshot {
        PlaybackSnapshot::new("Song", vec!["Artist".into()], true, 30_000, 120_000)
    }

    #[tokio::test]
    async fn test_skips_without_network_when_not_ready() {
        let readiness = ready();
        readiness.lower(Signal::CREDENTIAL);
        let source = ScriptedSource::default();
        let fetcher = SnapshotFetcher::new(source.clone(), readiness);

        assert_eq!(fetcher.fetch().await, FetchOutcome::Skipped);
        assert_eq!(source.calls(), 0);
    }

    #[tokio::test]
    async fn test_classifies_responses() {
        let source = ScriptedSource::default();
        source.push(Ok(Some(song())));
        source.push(Ok(None));
        source.push(Err(FakeError::Expired));
        source.push(Err(FakeError::Server));
        let fetcher = SnapshotFetcher::new(source.clone(), ready());

        assert_eq!(fetcher.fetch().await, FetchOutcome::Snapshot(song()));
        assert_eq!(fetcher.fetch().await, FetchOutcome::NoContent);
        assert!(matches!(fetcher.fetch().await, FetchOutcome::AuthFailure(_)));
        assert_eq!(
            fetcher.fetch().await,
            FetchOutcome::TransientFailure("server error".to_string())
        );
        assert_eq!(source.calls(), 4);
    }
}
