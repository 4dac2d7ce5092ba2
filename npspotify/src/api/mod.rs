//! Endpoints de l'API Spotify
//!
//! - [`auth`] : URL d'autorisation et endpoint `/api/token` (accounts)
//! - [`player`] : lecture en cours (`/me/player/currently-playing`)

pub mod auth;
pub mod player;

/// Scopes nécessaires au now-playing
pub const DEFAULT_SCOPES: &[&str] = &["user-read-playback-state", "user-read-currently-playing"];
