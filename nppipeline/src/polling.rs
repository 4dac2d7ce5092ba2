//! The polling loop
//!
//! ```text
//! WaitingForReadiness --(system ready)--> Active
//! ```
//!
//! The transition happens once, on the coordinator's one-shot event. While
//! `Active` the loop ticks on a fixed interval and each tick runs
//! fetch → format → dispatch inline. A tick that is still running when the
//! next one is due makes the interval skip the missed ticks, so fetches never
//! overlap.
//!
//! On an authorization failure the credential signal is lowered and a
//! renewal is spawned without blocking the tick. Following ticks see the
//! lowered signal and skip until the renewal raises it again. While the
//! credential stays down after the system has been ready once (a failed
//! renewal, scheduled or not), the loop starts a new renewal every
//! [`RENEWAL_RETRY_TICKS`] ticks, never more than one at a time.

use crate::dedup::{DedupDispatcher, DispatchOutcome};
use crate::error::Result;
use crate::fetcher::{SnapshotFetcher, SnapshotSource};
use crate::formatter::Formatter;
use crate::readiness::{ReadinessCoordinator, Signal};
use crate::snapshot::FetchOutcome;
use crate::transport::Transport;
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, trace, warn};

/// Skipped ticks between two renewal attempts while the credential is down
pub const RENEWAL_RETRY_TICKS: u32 = 6;

/// Something able to replace a rejected credential
///
/// Implementations raise [`Signal::CREDENTIAL`] themselves on success.
#[async_trait]
pub trait CredentialRenewer: Send + Sync {
    async fn renew(&self) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    WaitingForReadiness,
    Active,
}

/// What a single tick did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// A readiness signal was down
    Skipped,
    /// Nothing is playing
    Idle,
    Dispatched(DispatchOutcome),
    /// The credential was rejected and a renewal was started
    RenewalTriggered,
    /// The credential was still down and a new renewal attempt was started
    RenewalRetried,
    TransientFailure,
}

pub struct PollingLoop<S, T> {
    fetcher: SnapshotFetcher<S>,
    formatter: Box<dyn Formatter>,
    dispatcher: DedupDispatcher<T>,
    renewer: Arc<dyn CredentialRenewer>,
    readiness: ReadinessCoordinator,
    interval: Duration,
    state: LoopState,
    renewal_in_flight: Arc<AtomicBool>,
    ticks_since_renewal: u32,
}

impl<S, T> PollingLoop<S, T>
where
    S: SnapshotSource + 'static,
    T: Transport + 'static,
{
    pub fn new(
        fetcher: SnapshotFetcher<S>,
        formatter: Box<dyn Formatter>,
        dispatcher: DedupDispatcher<T>,
        renewer: Arc<dyn CredentialRenewer>,
        readiness: ReadinessCoordinator,
        interval: Duration,
    ) -> Self {
        Self {
            fetcher,
            formatter,
            dispatcher,
            renewer,
            readiness,
            interval: interval.max(Duration::from_millis(1)),
            state: LoopState::WaitingForReadiness,
            renewal_in_flight: Arc::new(AtomicBool::new(false)),
            ticks_since_renewal: 0,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Runs one fetch → format → dispatch cycle
    pub async fn tick(&mut self) -> TickOutcome {
        if !self.readiness.all_raised() {
            if self.renewal_due() {
                info!("Credential still missing, retrying renewal");
                self.spawn_renewal();
                return TickOutcome::RenewalRetried;
            }
            trace!(signals = ?self.readiness.snapshot(), "Tick skipped");
            return TickOutcome::Skipped;
        }

        match self.fetcher.fetch().await {
            FetchOutcome::Skipped => TickOutcome::Skipped,
            FetchOutcome::NoContent => {
                trace!("Nothing playing");
                TickOutcome::Idle
            }
            FetchOutcome::Snapshot(snapshot) => {
                let message = self.formatter.format(&snapshot);
                TickOutcome::Dispatched(self.dispatcher.dispatch(message).await)
            }
            FetchOutcome::AuthFailure(reason) => {
                self.readiness.lower(Signal::CREDENTIAL);
                info!(reason = %reason, "Credential rejected, renewing");

                self.spawn_renewal();
                TickOutcome::RenewalTriggered
            }
            FetchOutcome::TransientFailure(reason) => {
                debug!(reason = %reason, "Tick skipped after fetch failure");
                TickOutcome::TransientFailure
            }
        }
    }

    /// Counts a skipped tick and tells whether a renewal should be retried
    ///
    /// Only once the system has been ready: before the first grant there is
    /// nothing to renew.
    fn renewal_due(&mut self) -> bool {
        let credential_down = self.readiness.snapshot().get(&Signal::CREDENTIAL) == Some(&false);
        if !credential_down
            || !self.readiness.has_fired()
            || self.renewal_in_flight.load(Ordering::Acquire)
        {
            return false;
        }
        self.ticks_since_renewal = self.ticks_since_renewal.saturating_add(1);
        self.ticks_since_renewal >= RENEWAL_RETRY_TICKS
    }

    fn spawn_renewal(&mut self) {
        self.ticks_since_renewal = 0;
        if self.renewal_in_flight.swap(true, Ordering::AcqRel) {
            debug!("Renewal already in flight");
            return;
        }

        let renewer = Arc::clone(&self.renewer);
        let in_flight = Arc::clone(&self.renewal_in_flight);
        tokio::spawn(async move {
            if let Err(e) = renewer.renew().await {
                error!("Credential renewal failed: {}", e);
            }
            in_flight.store(false, Ordering::Release);
        });
    }

    /// Waits for system ready, then ticks forever
    pub async fn run(mut self) {
        info!("Polling loop waiting for readiness");
        self.readiness.wait_ready().await;
        self.state = LoopState::Active;
        info!(interval_ms = self.interval.as_millis() as u64, "Polling loop active");

        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            interval.tick().await;
            if let TickOutcome::Dispatched(DispatchOutcome::SendFailed) = self.tick().await {
                warn!("Display message could not be delivered");
            }
        }
    }
}
