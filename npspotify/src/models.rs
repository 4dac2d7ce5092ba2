//! Modèles de données de l'API Spotify
//!
//! Seuls les champs utiles au now-playing sont désérialisés.

use nppipeline::PlaybackSnapshot;
use serde::Deserialize;

/// Réponse de `POST /api/token`
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: String,
    /// Durée de vie en secondes
    pub expires_in: u64,
    /// Absent des réponses de refresh quand Spotify garde le même
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
}

/// Erreur renvoyée par `/api/token` (OAuth)
#[derive(Debug, Clone, Deserialize)]
pub struct TokenErrorBody {
    pub error: String,
    #[serde(default)]
    pub error_description: Option<String>,
}

impl TokenErrorBody {
    pub fn message(&self) -> String {
        match &self.error_description {
            Some(description) => format!("{}: {}", self.error, description),
            None => self.error.clone(),
        }
    }
}

/// Erreur renvoyée par l'API Web (`{"error": {"status": 401, "message": "..."}}`)
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorDetail {
    pub status: u16,
    #[serde(default)]
    pub message: String,
}

/// Réponse de `GET /me/player/currently-playing`
#[derive(Debug, Clone, Deserialize)]
pub struct CurrentlyPlaying {
    #[serde(default)]
    pub is_playing: bool,
    #[serde(default)]
    pub progress_ms: Option<u64>,
    #[serde(default)]
    pub currently_playing_type: Option<String>,
    #[serde(default)]
    pub item: Option<PlayingItem>,
}

/// Piste ou épisode de podcast
#[derive(Debug, Clone, Deserialize)]
pub struct PlayingItem {
    pub name: String,
    #[serde(default)]
    pub duration_ms: u64,
    #[serde(default)]
    pub artists: Vec<ArtistRef>,
    /// Présent pour les épisodes
    #[serde(default)]
    pub show: Option<ShowRef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ArtistRef {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ShowRef {
    pub name: String,
}

impl CurrentlyPlaying {
    /// Convertit la réponse en snapshot, `None` si rien n'est en lecture
    pub fn into_snapshot(self) -> Option<PlaybackSnapshot> {
        let item = self.item?;

        let artist_names = if item.artists.is_empty() {
            item.show.map(|show| vec![show.name]).unwrap_or_default()
        } else {
            item.artists.into_iter().map(|a| a.name).collect()
        };

        Some(PlaybackSnapshot::new(
            item.name,
            artist_names,
            self.is_playing,
            self.progress_ms.unwrap_or(0),
            item.duration_ms,
        ))
    }
}
