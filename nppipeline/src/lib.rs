//! Readiness-gated now-playing pipeline
//!
//! This crate holds everything between "a playback source can be queried"
//! and "a display transport can receive a datagram":
//!
//! - [`readiness`]: named readiness signals and the one-shot *system ready* event
//! - [`transport`]: the [`Transport`] strategy and the [`TransportGate`] guarding it
//! - [`fetcher`]: the [`SnapshotSource`] strategy and the guarded [`SnapshotFetcher`]
//! - [`formatter`]: display strategies turning a snapshot into a bounded string
//! - [`dedup`]: suppression of consecutive identical messages
//! - [`polling`]: the fixed-interval loop tying it all together
//!
//! Concrete sources (Spotify) and transports (OSC over UDP) live in their own
//! crates and plug in through the traits re-exported here.
//!
//! # Example
//!
//! ```no_run
//! use nppipeline::{
//!     ChatboxFormatter, DedupDispatcher, PollingLoop, ReadinessCoordinator, Signal,
//!     SnapshotFetcher, TransportGate,
//! };
//! # use nppipeline::{CredentialRenewer, SnapshotSource, Transport};
//! # use std::sync::Arc;
//! # use std::time::Duration;
//! # async fn run<S: SnapshotSource + 'static, T: Transport + 'static>(
//! #     source: S, transport: T, renewer: Arc<dyn CredentialRenewer>,
//! # ) -> Result<(), nppipeline::PipelineError> {
//! let readiness = ReadinessCoordinator::new();
//! readiness.register(Signal::CREDENTIAL);
//! readiness.register(Signal::TRANSPORT);
//!
//! let mut gate = TransportGate::new(transport, readiness.clone());
//! gate.open().await?;
//!
//! let polling = PollingLoop::new(
//!     SnapshotFetcher::new(source, readiness.clone()),
//!     Box::new(ChatboxFormatter::default()),
//!     DedupDispatcher::new(gate),
//!     renewer,
//!     readiness,
//!     Duration::from_secs(5),
//! );
//! polling.run().await;
//! # Ok(())
//! # }
//! ```

pub mod config_ext;
pub mod dedup;
pub mod error;
pub mod fetcher;
pub mod formatter;
pub mod polling;
pub mod readiness;
pub mod snapshot;
pub mod transport;

pub use config_ext::PipelineConfigExt;
pub use dedup::{DedupDispatcher, DispatchOutcome};
pub use error::{PipelineError, Result};
pub use fetcher::{AuthClassify, SnapshotFetcher, SnapshotSource};
pub use formatter::{
    Charset, ChatboxFormatter, CompactFormatter, DisplayStyle, Formatter, PROGRESS_BAR_WIDTH,
    progress_bar,
};
pub use polling::{CredentialRenewer, LoopState, PollingLoop, RENEWAL_RETRY_TICKS, TickOutcome};
pub use readiness::{ReadinessCoordinator, ReadinessState, Signal};
pub use snapshot::{FetchOutcome, PlaybackSnapshot};
pub use transport::{Transport, TransportGate};

pub use async_trait::async_trait;
