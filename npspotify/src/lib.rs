//! # npspotify - Source Spotify pour le now-playing
//!
//! Cette crate fournit :
//!
//! - [`SpotifyClient`] : client HTTP des services accounts (OAuth) et Web API
//! - [`CredentialManager`] : cycle de vie du credential (grant, renouvellement
//!   programmé à mi-vie, signal `credential` du pipeline)
//! - [`SpotifyPlayback`] : implémentation de [`nppipeline::SnapshotSource`]
//! - [`SpotifyAuthExt`] : routes `/login` et `/callback` sur un `npserver::Server`
//! - [`SpotifyConfigExt`] : client id/secret, redirect URI et scopes dans npconfig
//!
//! ## Erreurs
//!
//! Toutes les opérations retournent [`Result<T>`], alias de
//! `std::result::Result<T, SpotifyError>`. [`SpotifyError::is_auth_error`]
//! distingue un token refusé (qui déclenche un renouvellement) des erreurs
//! transitoires.

pub mod api;
pub mod client;
pub mod config_ext;
pub mod credential;
pub mod error;
pub mod models;
pub mod server_ext;
pub mod source;

pub use api::DEFAULT_SCOPES;
pub use client::{ClientBuilder, SpotifyClient};
pub use config_ext::SpotifyConfigExt;
pub use credential::{
    Credential, CredentialManager, MIN_RENEWAL_DELAY, TokenEndpoint, renewal_delay,
};
pub use error::{Result, SpotifyError};
pub use models::{CurrentlyPlaying, TokenResponse};
pub use server_ext::SpotifyAuthExt;
pub use source::SpotifyPlayback;
