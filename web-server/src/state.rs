// web-server/src/state.rs
use crate::middleware::RateLimiter;
use common::{
    AuthError, AuthService, Config, FileStore, KeyValueStore, MemoryStore, RouteGuard,
    SaltedHashVerifier, SessionStore, StaticFilesConfig, StaticUserDirectory,
};
use std::sync::Arc;
use std::time::Duration;

pub const LOGIN_ENDPOINT: &str = "/api/auth/login";

/// Everything request handlers share. Cheap to clone.
#[derive(Debug, Clone)]
pub struct AppState {
    pub auth: AuthService,
    pub guard: RouteGuard,
    pub reset_latency: Duration,
    pub login_limiter: RateLimiter,
    pub static_files: StaticFilesConfig,
}

impl AppState {
    pub fn new(auth: AuthService, config: &Config) -> Self {
        Self {
            guard: RouteGuard::new(&auth),
            auth,
            reset_latency: config.auth.reset_latency(),
            login_limiter: RateLimiter::from_config(vec![LOGIN_ENDPOINT.to_string()], &config.rate_limit),
            static_files: config.static_files.clone(),
        }
    }

    /// Wire the demo directory, credential store and session storage from configuration
    pub fn from_config(config: &Config) -> Result<Self, AuthError> {
        let store: Arc<dyn KeyValueStore> = match &config.auth.storage_path {
            Some(path) => Arc::new(FileStore::open(path)?),
            None => {
                tracing::warn!("No session storage path configured, sessions will not survive restarts");
                Arc::new(MemoryStore::new())
            }
        };

        let directory = StaticUserDirectory::demo();
        let verifier = SaltedHashVerifier::with_shared_password(directory.users(), &config.auth.demo_password)?;
        tracing::info!("Enrolled {} demo accounts", directory.users().len());

        let auth = AuthService::new(
            Arc::new(directory),
            Arc::new(verifier),
            SessionStore::with_key(store, config.auth.session_key.clone()),
            config.auth.settings(),
        );
        Ok(Self::new(auth, config))
    }
}
