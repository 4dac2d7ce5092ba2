//! Initialisation du logging et réglage dynamique du niveau
//!
//! Le subscriber `tracing` est construit sur un `Registry` avec un filtre de
//! niveau rechargeable, suivi d'une couche `fmt` pour la console si elle est
//! activée dans la configuration.

use std::sync::{Arc, RwLock};

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use npconfig::get_config;
use serde::{Deserialize, Serialize};
use tracing::Level;
use tracing_subscriber::{
    Registry, filter::LevelFilter, layer::SubscriberExt, reload, util::SubscriberInitExt,
};

const AVAILABLE_LEVELS: [&str; 5] = ["ERROR", "WARN", "INFO", "DEBUG", "TRACE"];

/// État partagé du logging : niveau courant et handle de rechargement
#[derive(Clone)]
pub struct LogState {
    max_level: Arc<RwLock<Level>>,
    reload_handle: reload::Handle<LevelFilter, Registry>,
}

impl LogState {
    pub fn new(initial: Level, reload_handle: reload::Handle<LevelFilter, Registry>) -> Self {
        Self {
            max_level: Arc::new(RwLock::new(initial)),
            reload_handle,
        }
    }

    /// Change le niveau maximum et recharge le filtre du subscriber
    pub fn set_max_level(&self, level: Level) {
        *self.max_level.write().unwrap() = level;

        let level_filter = level_to_levelfilter(level);
        if let Err(e) = self.reload_handle.reload(level_filter) {
            eprintln!("Failed to reload log level filter: {}", e);
        } else {
            tracing::info!(level = %level, "Log level changed");
        }
    }

    pub fn get_max_level(&self) -> Level {
        *self.max_level.read().unwrap()
    }
}

/// Initialise le système de logging à partir de la configuration
///
/// Lit `host.logger.min_level` (défaut `INFO`) et `host.logger.enable_console`.
/// Un second appel ne remplace pas le subscriber global déjà installé.
pub fn init_logging() -> LogState {
    let config = get_config();

    let level = config
        .get_log_min_level()
        .ok()
        .and_then(|l| string_to_level(&l))
        .unwrap_or(Level::INFO);

    let (filter, reload_handle) = reload::Layer::new(level_to_levelfilter(level));
    let log_state = LogState::new(level, reload_handle);

    // L'ordre est important : le filtre doit être appliqué en premier
    let subscriber = Registry::default().with(filter);

    let enable_console = config.get_log_enable_console().unwrap_or(true);

    let installed = if enable_console {
        subscriber
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_level(true)
                    .with_ansi(true),
            )
            .try_init()
    } else {
        subscriber.try_init()
    };

    if let Err(e) = installed {
        eprintln!("Logging already initialised: {}", e);
    }

    log_state
}

/// Request body pour la configuration du logging
#[derive(Debug, Deserialize)]
pub struct LogSetupRequest {
    pub level: String,
}

/// Response pour la configuration du logging
#[derive(Debug, Serialize)]
pub struct LogSetupResponse {
    pub current_level: String,
    pub available_levels: Vec<String>,
}

impl LogSetupResponse {
    fn from_state(state: &LogState) -> Self {
        Self {
            current_level: level_to_string(state.get_max_level()),
            available_levels: AVAILABLE_LEVELS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// GET /log_setup
pub async fn log_setup_get(State(state): State<LogState>) -> impl IntoResponse {
    Json(LogSetupResponse::from_state(&state))
}

/// POST /log_setup
pub async fn log_setup_post(
    State(state): State<LogState>,
    Json(req): Json<LogSetupRequest>,
) -> impl IntoResponse {
    match string_to_level(&req.level) {
        Some(level) => {
            state.set_max_level(level);
            (StatusCode::OK, Json(LogSetupResponse::from_state(&state))).into_response()
        }
        None => (
            StatusCode::BAD_REQUEST,
            format!("Unknown log level: {}", req.level),
        )
            .into_response(),
    }
}

/// Crée le router pour l'API de gestion des logs
pub fn create_logs_router(log_state: LogState) -> axum::Router {
    use axum::routing::get;
    axum::Router::new()
        .route("/log_setup", get(log_setup_get).post(log_setup_post))
        .with_state(log_state)
}

fn string_to_level(s: &str) -> Option<Level> {
    match s.trim().to_uppercase().as_str() {
        "ERROR" => Some(Level::ERROR),
        "WARN" => Some(Level::WARN),
        "INFO" => Some(Level::INFO),
        "DEBUG" => Some(Level::DEBUG),
        "TRACE" => Some(Level::TRACE),
        _ => None,
    }
}

fn level_to_string(level: Level) -> String {
    match level {
        Level::ERROR => "ERROR",
        Level::WARN => "WARN",
        Level::INFO => "INFO",
        Level::DEBUG => "DEBUG",
        Level::TRACE => "TRACE",
    }
    .to_string()
}

fn level_to_levelfilter(level: Level) -> LevelFilter {
    match level {
        Level::ERROR => LevelFilter::ERROR,
        Level::WARN => LevelFilter::WARN,
        Level::INFO => LevelFilter::INFO,
        Level::DEBUG => LevelFilter::DEBUG,
        Level::TRACE => LevelFilter::TRACE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    fn detached_state() -> (reload::Layer<LevelFilter, Registry>, LogState) {
        let (layer, handle) = reload::Layer::new(LevelFilter::INFO);
        (layer, LogState::new(Level::INFO, handle))
    }

    #[test]
    fn test_string_to_level() {
        assert_eq!(string_to_level("debug"), Some(Level::DEBUG));
        assert_eq!(string_to_level(" Warn "), Some(Level::WARN));
        assert_eq!(string_to_level("verbose"), None);
    }

    #[test]
    fn test_set_max_level() {
        let (_layer, state) = detached_state();
        state.set_max_level(Level::TRACE);
        assert_eq!(state.get_max_level(), Level::TRACE);
    }

    #[tokio::test]
    async fn test_log_setup_post_rejects_unknown_level() {
        let (_layer, state) = detached_state();
        let app = create_logs_router(state.clone());

        let response = app
            .oneshot(
                Request::post("/log_setup")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"level":"loud"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(state.get_max_level(), Level::INFO);
    }

    #[tokio::test]
    async fn test_log_setup_post_changes_level() {
        let (_layer, state) = detached_state();
        let app = create_logs_router(state.clone());

        let response = app
            .oneshot(
                Request::post("/log_setup")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"level":"debug"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(state.get_max_level(), Level::DEBUG);
    }
}
