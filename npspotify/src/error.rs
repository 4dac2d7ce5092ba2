//! Gestion des erreurs pour le client Spotify

use nppipeline::AuthClassify;
use thiserror::Error;

/// Type Result personnalisé pour npspotify
pub type Result<T> = std::result::Result<T, SpotifyError>;

/// Erreurs possibles lors de l'utilisation du client Spotify
#[derive(Error, Debug)]
pub enum SpotifyError {
    /// Échec de l'échange du code d'autorisation (grant initial)
    #[error("Authorization code exchange failed: {0}")]
    AuthExchange(String),

    /// Échec du renouvellement via le refresh token
    #[error("Token refresh failed: {0}")]
    AuthRefresh(String),

    /// Token refusé par l'API (expiré ou révoqué)
    #[error("Access token rejected: {0}")]
    Unauthorized(String),

    /// Quota dépassé (rate limiting)
    #[error("Rate limit exceeded, please try again later")]
    RateLimitExceeded,

    /// Erreur de l'API Spotify
    #[error("Spotify API error (code {code}): {message}")]
    ApiError { code: u16, message: String },

    /// Aucun credential n'a encore été obtenu
    #[error("Not authenticated, open /login first")]
    NotAuthenticated,

    /// Client id / secret manquants
    #[error("Spotify configuration error: {0}")]
    Configuration(String),

    /// Erreur HTTP
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Erreur de parsing JSON
    #[error("JSON parsing error: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Erreur de configuration (anyhow)
    #[error("Configuration error: {0}")]
    Config(#[from] anyhow::Error),
}

impl SpotifyError {
    /// Crée une erreur API depuis un code de statut HTTP et un message
    pub fn from_status_code(code: u16, message: impl Into<String>) -> Self {
        match code {
            401 => Self::Unauthorized(message.into()),
            429 => Self::RateLimitExceeded,
            _ => Self::ApiError {
                code,
                message: message.into(),
            },
        }
    }

    /// Vérifie si l'erreur signifie que le token d'accès n'est plus valable
    pub fn is_auth_error(&self) -> bool {
        match self {
            SpotifyError::Unauthorized(_) | SpotifyError::NotAuthenticated => true,
            SpotifyError::ApiError { code: 400, message } => {
                let message = message.to_lowercase();
                message.contains("token") && (message.contains("invalid") || message.contains("expired"))
            }
            _ => false,
        }
    }

    /// Vérifie si l'erreur est une erreur de rate limiting
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, SpotifyError::RateLimitExceeded)
    }
}

impl AuthClassify for SpotifyError {
    fn is_auth_error(&self) -> bool {
        SpotifyError::is_auth_error(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status_code() {
        assert!(matches!(
            SpotifyError::from_status_code(401, "The access token expired"),
            SpotifyError::Unauthorized(_)
        ));
        assert!(SpotifyError::from_status_code(429, "").is_rate_limit());
        assert!(matches!(
            SpotifyError::from_status_code(502, "Bad gateway"),
            SpotifyError::ApiError { code: 502, .. }
        ));
    }

    #[test]
    fn test_auth_classification() {
        assert!(SpotifyError::from_status_code(401, "expired").is_auth_error());
        assert!(SpotifyError::NotAuthenticated.is_auth_error());
        assert!(SpotifyError::from_status_code(400, "Invalid access token").is_auth_error());
        assert!(!SpotifyError::from_status_code(400, "Malformed json").is_auth_error());
        assert!(!SpotifyError::RateLimitExceeded.is_auth_error());
        assert!(!SpotifyError::from_status_code(503, "Service unavailable").is_auth_error());
    }
}
