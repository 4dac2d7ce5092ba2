//! Lecture en cours

use crate::client::SpotifyClient;
use crate::error::Result;
use crate::models::CurrentlyPlaying;
use nppipeline::PlaybackSnapshot;
use reqwest::StatusCode;
use tracing::debug;

impl SpotifyClient {
    /// Récupère ce que l'utilisateur écoute
    ///
    /// `Ok(None)` quand rien n'est en lecture (HTTP 204 ou `item: null`).
    pub async fn currently_playing(&self, access_token: &str) -> Result<Option<PlaybackSnapshot>> {
        let url = format!("{}/me/player/currently-playing", self.api_base);
        debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .bearer_auth(access_token)
            .query(&[("additional_types", "track,episode")])
            .send()
            .await?;

        if response.status() == StatusCode::NO_CONTENT {
            return Ok(None);
        }

        let playing: CurrentlyPlaying = Self::handle_response(response).await?;
        Ok(playing.into_snapshot())
    }
}
