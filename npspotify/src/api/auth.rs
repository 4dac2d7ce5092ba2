//! Autorisation OAuth (authorization code flow)

use crate::client::SpotifyClient;
use crate::error::Result;
use crate::models::TokenResponse;
use tracing::{debug, info};
use url::Url;

impl SpotifyClient {
    /// URL vers laquelle rediriger l'utilisateur pour autoriser l'application
    pub fn authorize_url(&self, scopes: &[String], state: Option<&str>) -> Result<Url> {
        let mut url = Url::parse(&format!("{}/authorize", self.accounts_base))?;

        url.query_pairs_mut()
            .append_pair("response_type", "code")
            .append_pair("client_id", &self.client_id)
            .append_pair("scope", &scopes.join(" "))
            .append_pair("redirect_uri", &self.redirect_uri);

        if let Some(state) = state {
            url.query_pairs_mut().append_pair("state", state);
        }

        Ok(url)
    }

    /// Échange un code d'autorisation contre un couple access/refresh token
    pub async fn exchange_code(&self, code: &str) -> Result<TokenResponse> {
        info!("Exchanging authorization code for tokens");
        self.token_request(&[
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", &self.redirect_uri),
        ])
        .await
    }

    /// Obtient un nouvel access token à partir du refresh token
    ///
    /// Spotify peut omettre `refresh_token` dans la réponse ; l'appelant
    /// conserve alors l'ancien.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenResponse> {
        debug!("Refreshing access token");
        self.token_request(&[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ])
        .await
    }

    async fn token_request(&self, params: &[(&str, &str)]) -> Result<TokenResponse> {
        let url = format!("{}/api/token", self.accounts_base);
        debug!("POST {} with {} params", url, params.len());

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(params)
            .send()
            .await?;

        Self::handle_response(response).await
    }
}
