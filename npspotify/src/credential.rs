//! Cycle de vie du credential Spotify
//!
//! Le [`CredentialManager`] détient le couple access/refresh token courant,
//! lève le signal `credential` du coordinateur de readiness et programme le
//! renouvellement à la moitié de la durée de vie du token.
//!
//! Invariants :
//! - après un grant ou un renouvellement réussi, exactement un timer de
//!   renouvellement est en attente
//! - un renouvellement refusé abaisse le signal et ne reprogramme rien ; la
//!   boucle de polling relance alors le renouvellement périodiquement
//! - les renouvellements concurrents sont sérialisés ; un appel qui attendait
//!   pendant qu'un autre renouvelait réutilise le token obtenu

use crate::client::SpotifyClient;
use crate::error::{Result, SpotifyError};
use crate::models::TokenResponse;
use async_trait::async_trait;
use chrono::Utc;
use nppipeline::{CredentialRenewer, PipelineError, ReadinessCoordinator, Signal};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Endpoint OAuth capable d'émettre des tokens
#[async_trait]
pub trait TokenEndpoint: Send + Sync {
    async fn exchange_code(&self, code: &str) -> Result<TokenResponse>;

    async fn refresh(&self, refresh_token: &str) -> Result<TokenResponse>;
}

#[async_trait]
impl TokenEndpoint for SpotifyClient {
    async fn exchange_code(&self, code: &str) -> Result<TokenResponse> {
        SpotifyClient::exchange_code(self, code).await
    }

    async fn refresh(&self, refresh_token: &str) -> Result<TokenResponse> {
        SpotifyClient::refresh(self, refresh_token).await
    }
}

/// Couple de tokens et instant d'expiration
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub access_token: String,
    pub refresh_token: String,
    /// Expiration, en millisecondes depuis l'epoch
    pub expires_at_ms: i64,
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("access_token", &"***")
            .field("refresh_token", &"***")
            .field("expires_at_ms", &self.expires_at_ms)
            .finish()
    }
}

impl Credential {
    /// Construit un credential depuis une réponse de `/api/token`
    ///
    /// `previous_refresh` est conservé si la réponse n'en contient pas.
    /// Retourne `None` s'il n'y a aucun refresh token utilisable.
    pub fn from_token(
        token: TokenResponse,
        previous_refresh: Option<&str>,
        now_ms: i64,
    ) -> Option<Self> {
        let refresh_token = token
            .refresh_token
            .filter(|t| !t.is_empty())
            .or_else(|| previous_refresh.map(str::to_string))?;

        Some(Self {
            access_token: token.access_token,
            refresh_token,
            expires_at_ms: now_ms.saturating_add(
                i64::try_from(token.expires_in)
                    .unwrap_or(i64::MAX)
                    .saturating_mul(1000),
            ),
        })
    }

    /// Durée de vie restante (zéro si expiré)
    pub fn remaining(&self, now_ms: i64) -> Duration {
        Duration::from_millis(self.expires_at_ms.saturating_sub(now_ms).max(0) as u64)
    }

    pub fn is_expired(&self, now_ms: i64) -> bool {
        now_ms >= self.expires_at_ms
    }
}

/// Délai minimal entre deux renouvellements programmés
pub const MIN_RENEWAL_DELAY: Duration = Duration::from_secs(1);

/// Délai avant le prochain renouvellement : la moitié de la durée restante,
/// jamais moins de [`MIN_RENEWAL_DELAY`]
pub fn renewal_delay(credential: &Credential, now_ms: i64) -> Duration {
    (credential.remaining(now_ms) / 2).max(MIN_RENEWAL_DELAY)
}

fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

struct RenewalTimer {
    generation: u64,
    handle: JoinHandle<()>,
}

struct Inner {
    endpoint: Arc<dyn TokenEndpoint>,
    readiness: ReadinessCoordinator,
    credential: RwLock<Option<Credential>>,
    timer: Mutex<Option<RenewalTimer>>,
    generation: AtomicU64,
    renew_lock: tokio::sync::Mutex<()>,
}

/// Gestionnaire du credential, partageable (`Clone`)
#[derive(Clone)]
pub struct CredentialManager {
    inner: Arc<Inner>,
}

impl CredentialManager {
    /// Crée le gestionnaire et enregistre le signal `credential`
    pub fn new(endpoint: Arc<dyn TokenEndpoint>, readiness: ReadinessCoordinator) -> Self {
        readiness.register(Signal::CREDENTIAL);
        Self {
            inner: Arc::new(Inner {
                endpoint,
                readiness,
                credential: RwLock::new(None),
                timer: Mutex::new(None),
                generation: AtomicU64::new(0),
                renew_lock: tokio::sync::Mutex::new(()),
            }),
        }
    }

    /// Échange un code d'autorisation contre un credential
    ///
    /// En cas de succès, lève le signal et programme le premier renouvellement.
    pub async fn grant(&self, code: &str) -> Result<Credential> {
        let _guard = self.inner.renew_lock.lock().await;

        let token = self
            .inner
            .endpoint
            .exchange_code(code)
            .await
            .map_err(|e| SpotifyError::AuthExchange(e.to_string()))?;
        let expires_in = token.expires_in;

        let credential = Credential::from_token(token, None, now_ms()).ok_or_else(|| {
            SpotifyError::AuthExchange("token response has no refresh token".into())
        })?;

        info!("Successfully retrieved access token, expires in {}s", expires_in);
        self.install(credential.clone());
        Ok(credential)
    }

    /// Renouvelle le credential à partir du refresh token
    ///
    /// En cas d'échec, abaisse le signal sans programmer de nouveau timer.
    pub async fn renew(&self) -> Result<Credential> {
        let seen = self.access_token();
        let _guard = self.inner.renew_lock.lock().await;

        let current = self.credential();
        let previous_refresh = match current {
            Some(current)
                if seen.is_some() && seen.as_deref() != Some(current.access_token.as_str()) =>
            {
                debug!("Credential renewed while waiting, reusing it");
                return Ok(current);
            }
            Some(current) => current.refresh_token,
            None => {
                self.inner.readiness.lower(Signal::CREDENTIAL);
                return Err(SpotifyError::NotAuthenticated);
            }
        };

        let token = match self.inner.endpoint.refresh(&previous_refresh).await {
            Ok(token) => token,
            Err(e) => {
                self.inner.readiness.lower(Signal::CREDENTIAL);
                error!("Could not refresh token: {}", e);
                return Err(SpotifyError::AuthRefresh(e.to_string()));
            }
        };
        let expires_in = token.expires_in;

        let credential = Credential::from_token(token, Some(&previous_refresh), now_ms())
            .ok_or_else(|| SpotifyError::AuthRefresh("token response has no refresh token".into()))?;

        info!("Refreshed access token, it now expires in {}s", expires_in);
        self.install(credential.clone());
        Ok(credential)
    }

    /// Credential courant
    pub fn credential(&self) -> Option<Credential> {
        self.inner.credential.read().unwrap().clone()
    }

    /// Access token courant
    pub fn access_token(&self) -> Option<String> {
        self.inner
            .credential
            .read()
            .unwrap()
            .as_ref()
            .map(|c| c.access_token.clone())
    }

    /// Indique si un renouvellement est programmé
    pub fn has_scheduled_renewal(&self) -> bool {
        self.inner.timer.lock().unwrap().is_some()
    }

    pub fn readiness(&self) -> &ReadinessCoordinator {
        &self.inner.readiness
    }

    fn install(&self, credential: Credential) {
        let delay = renewal_delay(&credential, now_ms());
        *self.inner.credential.write().unwrap() = Some(credential);
        self.inner.readiness.raise(Signal::CREDENTIAL);
        self.schedule_renewal(delay);
    }

    /// Remplace le timer en attente par un nouveau
    fn schedule_renewal(&self, delay: Duration) {
        let generation = self.inner.generation.fetch_add(1, Ordering::Relaxed) + 1;
        let weak: Weak<Inner> = Arc::downgrade(&self.inner);

        let mut timer = self.inner.timer.lock().unwrap();
        if let Some(previous) = timer.take() {
            previous.handle.abort();
        }

        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;

            let Some(inner) = weak.upgrade() else {
                return;
            };
            let manager = CredentialManager { inner };
            if !manager.claim_timer(generation) {
                return;
            }

            if let Err(e) = manager.renew().await {
                warn!("Scheduled credential renewal failed: {}", e);
            }
        });

        debug!(delay_secs = delay.as_secs(), "Next credential renewal scheduled");
        *timer = Some(RenewalTimer { generation, handle });
    }

    /// Retire le timer du slot s'il s'agit bien de `generation`
    fn claim_timer(&self, generation: u64) -> bool {
        let mut timer = self.inner.timer.lock().unwrap();
        match timer.as_ref() {
            Some(current) if current.generation == generation => {
                timer.take();
                true
            }
            _ => false,
        }
    }
}

#[async_trait]
impl CredentialRenewer for CredentialManager {
    async fn renew(&self) -> nppipeline::Result<()> {
        CredentialManager::renew(self)
            .await
            .map(|_| ())
            .map_err(PipelineError::renewal)
    }
}
