use nposc::{OscChatboxTransport, OscConfigExt};
use npconfig::get_config;
use nppipeline::{
    DedupDispatcher, PipelineConfigExt, PollingLoop, ReadinessCoordinator, Signal,
    SnapshotFetcher, TransportGate,
};
use npserver::Server;
use npspotify::{CredentialManager, SpotifyAuthExt, SpotifyClient, SpotifyConfigExt, SpotifyPlayback};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ========== PHASE 1 : Infrastructure ==========
    let config = get_config();
    let mut server = Server::new_configured();
    server.init_logging().await;

    let (client_id, client_secret) = match config.get_spotify_credentials() {
        Ok(credentials) => credentials,
        Err(e) => {
            error!("❌ {}", e);
            return Err(e);
        }
    };

    let client = Arc::new(
        SpotifyClient::builder()
            .client_id(client_id)
            .client_secret(client_secret)
            .redirect_uri(config.get_spotify_redirect_uri()?)
            .build()?,
    );

    let readiness = ReadinessCoordinator::new();
    readiness.register(Signal::CREDENTIAL);
    readiness.register(Signal::TRANSPORT);

    let credentials = CredentialManager::new(client.clone(), readiness.clone());

    // ========== PHASE 2 : Transport et pipeline ==========

    // Le socket OSC est ouvert tout de suite, sans attendre le token
    info!("📡 Opening OSC chatbox transport...");
    let mut gate = TransportGate::new(
        OscChatboxTransport::new(config.get_chatbox_options()?),
        readiness.clone(),
    );
    gate.open().await?;

    let style = config.get_display_style()?;
    info!("🎨 Display style: {}", style);
    let formatter = config.get_formatter(gate.max_message_len())?;

    let polling = PollingLoop::new(
        SnapshotFetcher::new(
            SpotifyPlayback::new(client.clone(), credentials.clone()),
            readiness.clone(),
        ),
        formatter,
        DedupDispatcher::new(gate),
        Arc::new(credentials.clone()),
        readiness.clone(),
        config.get_poll_interval()?,
    );

    // ========== PHASE 3 : Serveur d'autorisation ==========

    let status_readiness = readiness.clone();
    server
        .add_route("/status", move || {
            let readiness = status_readiness.clone();
            async move {
                let signals: BTreeMap<&str, bool> = readiness
                    .snapshot()
                    .into_iter()
                    .map(|(signal, raised)| (signal.name(), raised))
                    .collect();
                serde_json::json!({
                    "ready": readiness.all_raised(),
                    "signals": signals,
                })
            }
        })
        .await;

    let login_url = server
        .init_spotify_auth(client, credentials, config.get_spotify_scopes()?)
        .await?;

    info!("🌐 Starting HTTP server...");
    server.start().await?;

    info!("🔑 Open {} in a browser to authorize Spotify", login_url);

    let polling_task = tokio::spawn(polling.run());

    info!("✅ NowPlaying is ready!");
    info!("Press Ctrl+C to stop...");
    server.wait().await;

    polling_task.abort();
    Ok(())
}
