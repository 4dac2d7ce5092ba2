//! HTTP client for the Spotify Web API and accounts service

use crate::error::{Result, SpotifyError};
use crate::models::{ApiErrorBody, TokenErrorBody};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};

/// Default accounts service (authorize + token endpoints)
pub const DEFAULT_ACCOUNTS_BASE: &str = "https://accounts.spotify.com";

/// Default Web API base URL
pub const DEFAULT_API_BASE: &str = "https://api.spotify.com/v1";

/// Default timeout for HTTP requests
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Default OAuth redirect URI, served by the local authorization server
pub const DEFAULT_REDIRECT_URI: &str = "http://localhost:8888/callback";

/// Default User-Agent
pub const DEFAULT_USER_AGENT: &str = "npspotify/0.1.0";

/// Spotify HTTP client
///
/// Holds the application credentials (client id/secret) used against the
/// token endpoint; user access tokens are passed per call.
///
/// # Example
///
/// ```no_run
/// use npspotify::SpotifyClient;
///
/// # async fn demo() -> npspotify::Result<()> {
/// let client = SpotifyClient::builder()
///     .client_id("my-client-id")
///     .client_secret("my-secret")
///     .build()?;
/// let token = client.exchange_code("code-from-callback").await?;
/// if let Some(snapshot) = client.currently_playing(&token.access_token).await? {
///     println!("{} by {}", snapshot.track_name, snapshot.joined_artists());
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct SpotifyClient {
    pub(crate) client: Client,
    pub(crate) accounts_base: String,
    pub(crate) api_base: String,
    pub(crate) client_id: String,
    pub(crate) client_secret: String,
    pub(crate) redirect_uri: String,
}

impl SpotifyClient {
    pub fn builder() -> ClientBuilder {
        ClientBuilder::default()
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn redirect_uri(&self) -> &str {
        &self.redirect_uri
    }

    pub fn accounts_base(&self) -> &str {
        &self.accounts_base
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    pub fn http_client(&self) -> &Client {
        &self.client
    }

    /// Checks the status and decodes the JSON body
    pub(crate) async fn handle_response<T: DeserializeOwned>(response: Response) -> Result<T> {
        let status = response.status();
        debug!("Response status: {}", status);

        if !status.is_success() {
            let code = status.as_u16();
            let text = response.text().await.unwrap_or_default();
            let message = error_message(&text);
            warn!("Spotify API error ({}): {}", code, message);
            return Err(SpotifyError::from_status_code(code, message));
        }

        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| {
            warn!("Failed to parse response: {}", e);
            SpotifyError::JsonParse(e)
        })
    }
}

/// Extracts the most useful message from a Spotify error body
fn error_message(body: &str) -> String {
    if let Ok(api) = serde_json::from_str::<ApiErrorBody>(body) {
        return api.error.message;
    }
    if let Ok(oauth) = serde_json::from_str::<TokenErrorBody>(body) {
        return oauth.message();
    }
    body.trim().to_string()
}

/// Builder for configuring a SpotifyClient
#[derive(Debug)]
pub struct ClientBuilder {
    client: Option<Client>,
    accounts_base: String,
    api_base: String,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    timeout: Duration,
    user_agent: String,
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self {
            client: None,
            accounts_base: DEFAULT_ACCOUNTS_BASE.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
            client_id: String::new(),
            client_secret: String::new(),
            redirect_uri: DEFAULT_REDIRECT_URI.to_string(),
            timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl ClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a custom HTTP client
    pub fn client(mut self, client: Client) -> Self {
        self.client = Some(client);
        self
    }

    /// Set the accounts service base URL
    pub fn accounts_base(mut self, url: impl Into<String>) -> Self {
        self.accounts_base = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the Web API base URL
    pub fn api_base(mut self, url: impl Into<String>) -> Self {
        self.api_base = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = client_id.into();
        self
    }

    pub fn client_secret(mut self, client_secret: impl Into<String>) -> Self {
        self.client_secret = client_secret.into();
        self
    }

    pub fn redirect_uri(mut self, redirect_uri: impl Into<String>) -> Self {
        self.redirect_uri = redirect_uri.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Build the client
    ///
    /// Fails when the client id or secret is empty.
    pub fn build(self) -> Result<SpotifyClient> {
        if self.client_id.trim().is_empty() {
            return Err(SpotifyError::Configuration("client id is empty".into()));
        }
        if self.client_secret.trim().is_empty() {
            return Err(SpotifyError::Configuration("client secret is empty".into()));
        }

        let client = match self.client {
            Some(client) => client,
            None => Client::builder()
                .user_agent(&self.user_agent)
                .timeout(self.timeout)
                .build()?,
        };

        Ok(SpotifyClient {
            client,
            accounts_base: self.accounts_base,
            api_base: self.api_base,
            client_id: self.client_id,
            client_secret: self.client_secret,
            redirect_uri: self.redirect_uri,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let builder = ClientBuilder::default();
        assert_eq!(builder.accounts_base, DEFAULT_ACCOUNTS_BASE);
        assert_eq!(builder.api_base, DEFAULT_API_BASE);
        assert_eq!(builder.redirect_uri, DEFAULT_REDIRECT_URI);
        assert_eq!(builder.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_build_requires_credentials() {
        let err = SpotifyClient::builder().client_id("id").build().unwrap_err();
        assert!(matches!(err, SpotifyError::Configuration(_)));

        let client = SpotifyClient::builder()
            .client_id("id")
            .client_secret("secret")
            .api_base("http://127.0.0.1:1234/v1/")
            .build()
            .unwrap();
        assert_eq!(client.api_base(), "http://127.0.0.1:1234/v1");
    }

    #[test]
    fn test_error_message_extraction() {
        assert_eq!(
            error_message(r#"{"error":{"status":401,"message":"The access token expired"}}"#),
            "The access token expired"
        );
        assert_eq!(
            error_message(r#"{"error":"invalid_grant","error_description":"Invalid authorization code"}"#),
            "invalid_grant: Invalid authorization code"
        );
        assert_eq!(error_message(" Bad Gateway "), "Bad Gateway");
    }
}
