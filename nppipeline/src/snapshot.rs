//! Playback snapshot and fetch outcomes

/// Point-in-time read of what is currently playing
///
/// Built fresh on every successful fetch and never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackSnapshot {
    pub track_name: String,
    /// Artist names in the order returned by the source
    pub artist_names: Vec<String>,
    pub is_playing: bool,
    pub progress_ms: u64,
    pub duration_ms: u64,
}

impl PlaybackSnapshot {
    pub fn new(
        track_name: impl Into<String>,
        artist_names: Vec<String>,
        is_playing: bool,
        progress_ms: u64,
        duration_ms: u64,
    ) -> Self {
        Self {
            track_name: track_name.into(),
            artist_names,
            is_playing,
            progress_ms,
            duration_ms,
        }
    }

    /// Artists joined with `", "`, duplicates kept
    pub fn joined_artists(&self) -> String {
        self.artist_names.join(", ")
    }
}

/// Classified result of one fetch attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// A readiness signal was down; no request was made
    Skipped,
    /// Nothing is currently playing
    NoContent,
    Snapshot(PlaybackSnapshot),
    /// The credential was rejected (expired or invalid)
    AuthFailure(String),
    /// Network, rate limit or server error
    TransientFailure(String),
}
