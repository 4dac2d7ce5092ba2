//! Readiness coordination
//!
//! A [`ReadinessCoordinator`] tracks a small set of named boolean signals
//! (the credential and the transport socket in practice) and fires a single
//! *system ready* event the first time every registered signal is true at
//! once. After that the event never fires again: signals keep toggling
//! (the credential drops on an authorization failure and comes back after
//! renewal) and callers that need the live state read [`ReadinessCoordinator::snapshot`]
//! or [`ReadinessCoordinator::all_raised`] on every use.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, RwLock};
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Name of a readiness signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Signal(&'static str);

impl Signal {
    /// A usable access credential is held
    pub const CREDENTIAL: Signal = Signal("credential");
    /// The outbound datagram socket is open
    pub const TRANSPORT: Signal = Signal("transport");

    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    pub fn name(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Point-in-time copy of every signal value
pub type ReadinessState = BTreeMap<Signal, bool>;

struct Inner {
    signals: RwLock<ReadinessState>,
    ready_tx: watch::Sender<bool>,
}

/// Shared handle on the readiness signals
///
/// Cloning is cheap; every clone observes the same signals.
#[derive(Clone)]
pub struct ReadinessCoordinator {
    inner: Arc<Inner>,
}

impl Default for ReadinessCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ReadinessCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReadinessCoordinator")
            .field("signals", &self.snapshot())
            .field("fired", &self.has_fired())
            .finish()
    }
}

impl ReadinessCoordinator {
    pub fn new() -> Self {
        let (ready_tx, _) = watch::channel(false);
        Self {
            inner: Arc::new(Inner {
                signals: RwLock::new(BTreeMap::new()),
                ready_tx,
            }),
        }
    }

    /// Adds a signal, initially lowered
    ///
    /// Registering an existing signal keeps its current value.
    pub fn register(&self, signal: Signal) {
        let mut signals = self.inner.signals.write().unwrap();
        signals.entry(signal).or_insert(false);
        debug!(%signal, "Readiness signal registered");
    }

    /// Raises a signal
    ///
    /// Returns `true` if this call is the one that fired *system ready*.
    pub fn raise(&self, signal: Signal) -> bool {
        let mut signals = self.inner.signals.write().unwrap();

        match signals.insert(signal, true) {
            Some(true) => return false,
            Some(false) => info!(%signal, "Readiness signal raised"),
            None => warn!(%signal, "Raising a signal that was never registered"),
        }

        let all_raised = signals.values().all(|raised| *raised);
        if all_raised && !*self.inner.ready_tx.borrow() {
            self.inner.ready_tx.send_replace(true);
            info!("All readiness signals raised, system ready");
            return true;
        }

        false
    }

    /// Lowers a signal
    ///
    /// The one-shot *system ready* event is unaffected.
    pub fn lower(&self, signal: Signal) {
        let mut signals = self.inner.signals.write().unwrap();
        if let Some(true) = signals.insert(signal, false) {
            info!(%signal, "Readiness signal lowered");
        }
    }

    /// Current value of a signal (`false` if unknown)
    pub fn is_raised(&self, signal: Signal) -> bool {
        self.inner
            .signals
            .read()
            .unwrap()
            .get(&signal)
            .copied()
            .unwrap_or(false)
    }

    /// `true` when at least one signal is registered and all are raised
    pub fn all_raised(&self) -> bool {
        let signals = self.inner.signals.read().unwrap();
        !signals.is_empty() && signals.values().all(|raised| *raised)
    }

    /// Copy of every signal value
    pub fn snapshot(&self) -> ReadinessState {
        self.inner.signals.read().unwrap().clone()
    }

    /// Whether *system ready* has already fired
    pub fn has_fired(&self) -> bool {
        *self.inner.ready_tx.borrow()
    }

    /// Receiver that flips to `true` once, when *system ready* fires
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.inner.ready_tx.subscribe()
    }

    /// Waits for *system ready*
    ///
    /// Returns immediately if it already fired.
    pub async fn wait_ready(&self) {
        let mut rx = self.subscribe();
        // The sender lives as long as `self`, so this cannot observe a closed channel.
        let _ = rx.wait_for(|ready| *ready).await;
    }
}
