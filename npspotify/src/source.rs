//! Source "currently playing" branchée sur le pipeline

use crate::client::SpotifyClient;
use crate::credential::CredentialManager;
use crate::error::{Result, SpotifyError};
use async_trait::async_trait;
use nppipeline::{PlaybackSnapshot, SnapshotSource};
use std::sync::Arc;

/// Lecture en cours de l'utilisateur authentifié
#[derive(Clone)]
pub struct SpotifyPlayback {
    client: Arc<SpotifyClient>,
    credentials: CredentialManager,
}

impl SpotifyPlayback {
    pub fn new(client: Arc<SpotifyClient>, credentials: CredentialManager) -> Self {
        Self {
            client,
            credentials,
        }
    }
}

#[async_trait]
impl SnapshotSource for SpotifyPlayback {
    type Error = SpotifyError;

    fn name(&self) -> &str {
        "spotify"
    }

    async fn current_snapshot(&self) -> Result<Option<PlaybackSnapshot>> {
        let access_token = self
            .credentials
            .access_token()
            .ok_or(SpotifyError::NotAuthenticated)?;
        self.client.currently_playing(&access_token).await
    }
}
