//! Extension pour intégrer la configuration Spotify dans npconfig
//!
//! ```yaml
//! spotify:
//!   client_id: "..."
//!   client_secret: "..."
//!   redirect_uri: "http://localhost:8888/callback"
//!   scopes:
//!     - user-read-playback-state
//!     - user-read-currently-playing
//! ```

use crate::api::DEFAULT_SCOPES;
use crate::client::DEFAULT_REDIRECT_URI;
use anyhow::{Result, anyhow};
use npconfig::Config;
use serde_yaml::Value;

/// Trait d'extension pour gérer les credentials d'application Spotify
pub trait SpotifyConfigExt {
    /// Récupère le client id de l'application Spotify
    ///
    /// # Errors
    ///
    /// Retourne une erreur si le client id n'est pas configuré
    fn get_spotify_client_id(&self) -> Result<String>;

    fn set_spotify_client_id(&self, client_id: &str) -> Result<()>;

    /// Récupère le client secret de l'application Spotify
    ///
    /// # Errors
    ///
    /// Retourne une erreur si le secret n'est pas configuré
    fn get_spotify_client_secret(&self) -> Result<String>;

    fn set_spotify_client_secret(&self, client_secret: &str) -> Result<()>;

    /// Récupère le couple (client id, client secret)
    fn get_spotify_credentials(&self) -> Result<(String, String)>;

    fn get_spotify_redirect_uri(&self) -> Result<String>;

    fn get_spotify_scopes(&self) -> Result<Vec<String>>;
}

fn required_value(config: &Config, key: &str) -> Result<String> {
    match config.get_string(&["spotify", key]) {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(anyhow!(
            "spotify.{} is not configured: set it in {} or export NOWPLAYING_CONFIG__SPOTIFY__{}",
            key,
            config.path(),
            key.to_uppercase()
        )),
    }
}

impl SpotifyConfigExt for Config {
    fn get_spotify_client_id(&self) -> Result<String> {
        required_value(self, "client_id")
    }

    fn set_spotify_client_id(&self, client_id: &str) -> Result<()> {
        self.set_value(&["spotify", "client_id"], Value::String(client_id.to_string()))
    }

    fn get_spotify_client_secret(&self) -> Result<String> {
        required_value(self, "client_secret")
    }

    fn set_spotify_client_secret(&self, client_secret: &str) -> Result<()> {
        self.set_value(
            &["spotify", "client_secret"],
            Value::String(client_secret.to_string()),
        )
    }

    fn get_spotify_credentials(&self) -> Result<(String, String)> {
        Ok((self.get_spotify_client_id()?, self.get_spotify_client_secret()?))
    }

    fn get_spotify_redirect_uri(&self) -> Result<String> {
        Ok(match self.get_string(&["spotify", "redirect_uri"]) {
            Some(uri) if !uri.trim().is_empty() => uri,
            _ => DEFAULT_REDIRECT_URI.to_string(),
        })
    }

    fn get_spotify_scopes(&self) -> Result<Vec<String>> {
        let scopes = match self.get_value(&["spotify", "scopes"]) {
            Ok(Value::Sequence(seq)) => seq
                .into_iter()
                .filter_map(|v| match v {
                    Value::String(s) => Some(s),
                    _ => None,
                })
                .collect::<Vec<_>>(),
            Ok(Value::String(s)) => s.split_whitespace().map(str::to_string).collect(),
            _ => Vec::new(),
        };

        if scopes.is_empty() {
            Ok(DEFAULT_SCOPES.iter().map(|s| s.to_string()).collect())
        } else {
            Ok(scopes)
        }
    }
}
