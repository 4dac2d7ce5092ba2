//! Extension de npserver::Server pour l'autorisation Spotify
//!
//! Enregistre les deux routes du flux "authorization code" :
//!
//! - `GET /login` : redirige (302) vers la page d'autorisation Spotify
//! - `GET /callback` : reçoit le code et l'échange contre un credential

use crate::client::SpotifyClient;
use crate::credential::CredentialManager;
use anyhow::Result;
use axum::extract::{Query, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use npserver::Server;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, error, info};
use url::Url;

pub const LOGIN_PATH: &str = "/login";
pub const CALLBACK_PATH: &str = "/callback";

pub const CALLBACK_SUCCESS: &str = "Success! You can now close the window.";

#[derive(Clone)]
struct AuthState {
    client: Arc<SpotifyClient>,
    credentials: CredentialManager,
    scopes: Arc<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct CallbackQuery {
    code: Option<String>,
    error: Option<String>,
    state: Option<String>,
}

/// Trait d'extension pour ajouter l'autorisation Spotify à un serveur npserver
///
/// # Exemple
///
/// ```rust,no_run
/// use npspotify::{CredentialManager, SpotifyAuthExt, SpotifyClient};
/// use nppipeline::ReadinessCoordinator;
/// use npserver::Server;
/// use std::sync::Arc;
///
/// # async fn demo() -> anyhow::Result<()> {
/// let client = Arc::new(SpotifyClient::builder().client_id("id").client_secret("secret").build()?);
/// let credentials = CredentialManager::new(client.clone(), ReadinessCoordinator::new());
///
/// let mut server = Server::new_configured();
/// let login_url = server.init_spotify_auth(client, credentials, vec![]).await?;
/// println!("Authorize at {}", login_url);
/// server.start().await?;
/// # Ok(())
/// # }
/// ```
pub trait SpotifyAuthExt {
    /// Enregistre `/login` et `/callback`
    ///
    /// Retourne l'URL de `/login` à communiquer à l'utilisateur, dérivée
    /// de l'URI de redirection du client.
    async fn init_spotify_auth(
        &mut self,
        client: Arc<SpotifyClient>,
        credentials: CredentialManager,
        scopes: Vec<String>,
    ) -> Result<String>;
}

impl SpotifyAuthExt for Server {
    async fn init_spotify_auth(
        &mut self,
        client: Arc<SpotifyClient>,
        credentials: CredentialManager,
        scopes: Vec<String>,
    ) -> Result<String> {
        let login_url = Url::parse(client.redirect_uri())?.join(LOGIN_PATH)?;

        let state = AuthState {
            client,
            credentials,
            scopes: Arc::new(scopes),
        };
        self.add_handler_with_state(LOGIN_PATH, login, state.clone())
            .await;
        self.add_handler_with_state(CALLBACK_PATH, callback, state)
            .await;

        info!("Spotify authorization routes registered, open {} to log in", login_url);
        Ok(login_url.to_string())
    }
}

async fn login(State(state): State<AuthState>) -> Response {
    match state.client.authorize_url(&state.scopes, None) {
        Ok(url) => {
            debug!("Redirecting to {}", url);
            (StatusCode::FOUND, [(header::LOCATION, url.to_string())]).into_response()
        }
        Err(e) => {
            error!("Could not build authorization URL: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, format!("Login Error: {}", e)).into_response()
        }
    }
}

async fn callback(
    State(state): State<AuthState>,
    Query(query): Query<CallbackQuery>,
) -> (StatusCode, String) {
    if let Some(err) = query.error {
        error!("Callback Error: {}", err);
        return (StatusCode::BAD_REQUEST, format!("Callback Error: {}", err));
    }

    let Some(code) = query.code.filter(|c| !c.is_empty()) else {
        error!("Callback Error: missing code");
        return (
            StatusCode::BAD_REQUEST,
            "Callback Error: missing code".to_string(),
        );
    };
    debug!(state = ?query.state, "Authorization code received");

    match state.credentials.grant(&code).await {
        Ok(_) => (StatusCode::OK, CALLBACK_SUCCESS.to_string()),
        Err(e) => {
            error!("Error getting Tokens: {}", e);
            (StatusCode::BAD_GATEWAY, format!("Error getting Tokens: {}", e))
        }
    }
}
