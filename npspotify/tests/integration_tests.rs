//! Integration tests for npspotify against a mocked Spotify

use nppipeline::{FetchOutcome, ReadinessCoordinator, Signal, SnapshotFetcher};
use npserver::Server;
use npspotify::{
    CredentialManager, DEFAULT_SCOPES, SpotifyAuthExt, SpotifyClient, SpotifyError,
    SpotifyPlayback,
};
use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// base64("id:secret")
const BASIC_AUTH: &str = "Basic aWQ6c2VjcmV0";

fn client_for(server: &MockServer) -> SpotifyClient {
    SpotifyClient::builder()
        .client_id("id")
        .client_secret("secret")
        .accounts_base(server.uri())
        .api_base(format!("{}/v1", server.uri()))
        .build()
        .unwrap()
}

fn token_json(access: &str, refresh: Option<&str>) -> serde_json::Value {
    let mut body = json!({
        "access_token": access,
        "token_type": "Bearer",
        "expires_in": 3600,
        "scope": "user-read-playback-state user-read-currently-playing"
    });
    if let Some(refresh) = refresh {
        body["refresh_token"] = json!(refresh);
    }
    body
}

fn playing_json() -> serde_json::Value {
    json!({
        "timestamp": 1700000000000u64,
        "progress_ms": 30000,
        "is_playing": true,
        "currently_playing_type": "track",
        "item": {
            "name": "Song",
            "duration_ms": 120000,
            "artists": [{"name": "Artist"}, {"name": "Guest"}]
        }
    })
}

async fn mount_token(server: &MockServer, grant: &str, body: serde_json::Value) {
    Mock::given(method("POST"))
        .and(path("/api/token"))
        .and(header("authorization", BASIC_AUTH))
        .and(body_string_contains(format!("grant_type={}", grant)))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_exchange_code_uses_basic_auth_and_redirect_uri() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/token"))
        .and(header("authorization", BASIC_AUTH))
        .and(body_string_contains("grant_type=authorization_code"))
        .and(body_string_contains("code=abc"))
        .and(body_string_contains("redirect_uri=http%3A%2F%2Flocalhost%3A8888%2Fcallback"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_json("a1", Some("r1"))))
        .expect(1)
        .mount(&server)
        .await;

    let token = client_for(&server).exchange_code("abc").await.unwrap();
    assert_eq!(token.access_token, "a1");
    assert_eq!(token.refresh_token.as_deref(), Some("r1"));
    assert_eq!(token.expires_in, 3600);
}

#[tokio::test]
async fn test_rejected_code_is_an_exchange_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant",
            "error_description": "Invalid authorization code"
        })))
        .mount(&server)
        .await;

    let readiness = ReadinessCoordinator::new();
    let manager = CredentialManager::new(Arc::new(client_for(&server)), readiness.clone());

    let err = manager.grant("expired-code").await.unwrap_err();
    assert!(matches!(err, SpotifyError::AuthExchange(_)));
    assert!(err.to_string().contains("Invalid authorization code"));
    assert!(!readiness.is_raised(Signal::CREDENTIAL));
}

#[tokio::test]
async fn test_refresh_keeps_previous_refresh_token() {
    let server = MockServer::start().await;
    mount_token(&server, "authorization_code", token_json("a1", Some("r1"))).await;
    Mock::given(method("POST"))
        .and(path("/api/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .and(body_string_contains("refresh_token=r1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_json("a2", None)))
        .expect(1)
        .mount(&server)
        .await;

    let readiness = ReadinessCoordinator::new();
    let manager = CredentialManager::new(Arc::new(client_for(&server)), readiness.clone());
    manager.grant("abc").await.unwrap();

    let renewed = manager.renew().await.unwrap();
    assert_eq!(renewed.access_token, "a2");
    assert_eq!(renewed.refresh_token, "r1");
    assert!(readiness.is_raised(Signal::CREDENTIAL));
}

#[tokio::test]
async fn test_currently_playing_snapshot() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/me/player/currently-playing"))
        .and(header("authorization", "Bearer a1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(playing_json()))
        .mount(&server)
        .await;

    let snapshot = client_for(&server)
        .currently_playing("a1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(snapshot.track_name, "Song");
    assert_eq!(snapshot.joined_artists(), "Artist, Guest");
    assert_eq!(snapshot.progress_ms, 30_000);
    assert_eq!(snapshot.duration_ms, 120_000);
}

#[tokio::test]
async fn test_no_content_means_nothing_playing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/me/player/currently-playing"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let playing = client_for(&server).currently_playing("a1").await.unwrap();
    assert!(playing.is_none());
}

#[tokio::test]
async fn test_error_statuses_are_classified() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/me/player/currently-playing"))
        .and(header("authorization", "Bearer stale"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": {"status": 401, "message": "The access token expired"}
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/me/player/currently-playing"))
        .and(header("authorization", "Bearer busy"))
        .respond_with(ResponseTemplate::new(503).set_body_string("Service Unavailable"))
        .mount(&server)
        .await;

    let client = client_for(&server);

    let err = client.currently_playing("stale").await.unwrap_err();
    assert!(matches!(err, SpotifyError::Unauthorized(ref m) if m == "The access token expired"));
    assert!(err.is_auth_error());

    let err = client.currently_playing("busy").await.unwrap_err();
    assert!(matches!(err, SpotifyError::ApiError { code: 503, .. }));
    assert!(!err.is_auth_error());
}

#[tokio::test]
async fn test_fetcher_reports_auth_failure_for_expired_token() {
    let server = MockServer::start().await;
    mount_token(&server, "authorization_code", token_json("a1", Some("r1"))).await;
    Mock::given(method("GET"))
        .and(path("/v1/me/player/currently-playing"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": {"status": 401, "message": "The access token expired"}
        })))
        .mount(&server)
        .await;

    let readiness = ReadinessCoordinator::new();
    readiness.register(Signal::TRANSPORT);
    readiness.raise(Signal::TRANSPORT);

    let client = Arc::new(client_for(&server));
    let manager = CredentialManager::new(client.clone(), readiness.clone());
    let fetcher = SnapshotFetcher::new(SpotifyPlayback::new(client, manager.clone()), readiness);

    // No credential yet: skipped without a request
    assert_eq!(fetcher.fetch().await, FetchOutcome::Skipped);

    manager.grant("abc").await.unwrap();
    assert!(matches!(fetcher.fetch().await, FetchOutcome::AuthFailure(_)));
}

#[tokio::test]
async fn test_login_and_callback_routes() {
    let spotify = MockServer::start().await;
    mount_token(&spotify, "authorization_code", token_json("a1", Some("r1"))).await;

    let readiness = ReadinessCoordinator::new();
    let client = Arc::new(client_for(&spotify));
    let manager = CredentialManager::new(client.clone(), readiness.clone());
    let scopes = DEFAULT_SCOPES.iter().map(|s| s.to_string()).collect();

    let mut server = Server::new("Test", "127.0.0.1", 0);
    let login_url = server
        .init_spotify_auth(client, manager.clone(), scopes)
        .await
        .unwrap();
    assert_eq!(login_url, "http://localhost:8888/login");
    server.start().await.unwrap();
    let base = format!("http://127.0.0.1:{}", server.local_addr().unwrap().port());

    let http = reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap();

    let response = http.get(format!("{}/login", base)).send().await.unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::FOUND);
    let location = response
        .headers()
        .get(reqwest::header::LOCATION)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(location.starts_with(&format!("{}/authorize?", spotify.uri())));
    assert!(location.contains("response_type=code"));

    let response = http
        .get(format!("{}/callback?error=access_denied", base))
        .send()
        .await
        .unwrap();
    assert_eq!(response.text().await.unwrap(), "Callback Error: access_denied");
    assert!(!readiness.is_raised(Signal::CREDENTIAL));

    let response = http
        .get(format!("{}/callback?code=abc&state=xyz", base))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());
    assert_eq!(
        response.text().await.unwrap(),
        "Success! You can now close the window."
    );
    assert!(readiness.is_raised(Signal::CREDENTIAL));
    assert_eq!(manager.access_token().as_deref(), Some("a1"));
}
