// common/src/auth.rs
//! The auth service owns the one session cell of the dashboard.
//!
//! All transitions go through [`AuthService`]: login, logout and the one-time
//! restore at startup. Consumers never write the session; they read the
//! latest [`AuthSnapshot`] or subscribe to changes.
//!
//! Storage is always written before the snapshot is published, so nobody
//! can observe an in-memory session that storage does not hold (or the
//! other way round).

use crate::credentials::CredentialVerifier;
use crate::directory::UserDirectory;
use crate::error::AuthError;
use crate::guard::{GuardEvent, GuardState};
use crate::models::{Identity, SessionStore};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};

/// Default delay applied before every credential check
pub const DEFAULT_LOGIN_LATENCY: Duration = Duration::from_millis(1000);

/// What consumers can observe about the session at one instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthSnapshot {
    pub identity: Option<Identity>,
    pub is_loading: bool,
    pub guard: GuardState,
}

impl AuthSnapshot {
    pub fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }
}

impl Default for AuthSnapshot {
    fn default() -> Self {
        Self {
            identity: None,
            is_loading: true,
            guard: GuardState::Loading,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AuthSettings {
    /// Simulated round trip before credentials are checked. Zero disables it.
    pub login_latency: Duration,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            login_latency: DEFAULT_LOGIN_LATENCY,
        }
    }
}

struct Inner {
    directory: Arc<dyn UserDirectory>,
    verifier: Arc<dyn CredentialVerifier>,
    sessions: SessionStore,
    settings: AuthSettings,
    state: watch::Sender<AuthSnapshot>,
    // Serializes restore, login and logout
    gate: Mutex<()>,
    restored: AtomicBool,
    pending_logins: AtomicUsize,
}

impl Inner {
    fn loading(&self) -> bool {
        !self.restored.load(Ordering::SeqCst) || self.pending_logins.load(Ordering::SeqCst) > 0
    }

    fn publish_loading(&self) {
        let loading = self.loading();
        self.state.send_if_modified(|snapshot| {
            let changed = snapshot.is_loading != loading;
            snapshot.is_loading = loading;
            changed
        });
    }

    fn publish(&self, identity: Option<Identity>, event: GuardEvent) {
        let loading = self.loading();
        self.state.send_modify(|snapshot| {
            snapshot.identity = identity;
            snapshot.guard = snapshot.guard.next(event);
            snapshot.is_loading = loading;
        });
    }

    async fn check_credentials(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        let identity = self
            .directory
            .find_by_email(email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !self.verifier.verify(&identity, password) {
            return Err(AuthError::InvalidCredentials);
        }
        Ok(identity)
    }

    /// Caller must hold the gate
    fn restore_locked(&self) {
        let identity = match self.sessions.load() {
            Ok(identity) => identity,
            Err(AuthError::MalformedSession(reason)) => {
                tracing::warn!("Discarding malformed stored session: {}", reason);
                if let Err(e) = self.sessions.clear() {
                    tracing::warn!("Failed to remove malformed session: {}", e);
                }
                None
            }
            Err(e) => {
                tracing::warn!("Could not read stored session: {}", e);
                None
            }
        };

        self.restored.store(true, Ordering::SeqCst);
        let authenticated = identity.is_some();
        match &identity {
            Some(identity) => tracing::info!("Restored session for {}", identity.email),
            None => tracing::info!("No stored session to restore"),
        }
        self.publish(identity, GuardEvent::RestoreCompleted { authenticated });
    }

    async fn login(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        let _gate = self.gate.lock().await;
        if !self.restored.load(Ordering::SeqCst) {
            // the guard must settle before it can see a login
            self.restore_locked();
        }

        if !self.settings.login_latency.is_zero() {
            tokio::time::sleep(self.settings.login_latency).await;
        }

        let identity = match self.check_credentials(email, password).await {
            Ok(identity) => identity,
            Err(e) => {
                tracing::warn!("Login rejected for {}: {}", email, e);
                return Err(e);
            }
        };

        self.sessions.save(&identity)?;
        self.publish(Some(identity.clone()), GuardEvent::LoggedIn);

        tracing::info!("User {} logged in as {}", identity.email, identity.role);
        Ok(identity)
    }
}

/// Keeps `is_loading` raised for as long as a login attempt is in flight
struct PendingLogin {
    inner: Arc<Inner>,
}

impl PendingLogin {
    fn start(inner: &Arc<Inner>) -> Self {
        inner.pending_logins.fetch_add(1, Ordering::SeqCst);
        inner.publish_loading();
        Self { inner: inner.clone() }
    }
}

impl Drop for PendingLogin {
    fn drop(&mut self) {
        self.inner.pending_logins.fetch_sub(1, Ordering::SeqCst);
        self.inner.publish_loading();
    }
}

/// Handle to the session owner. Clones share the same session.
#[derive(Clone)]
pub struct AuthService {
    inner: Arc<Inner>,
}

impl AuthService {
    pub fn new(
        directory: Arc<dyn UserDirectory>,
        verifier: Arc<dyn CredentialVerifier>,
        sessions: SessionStore,
        settings: AuthSettings,
    ) -> Self {
        let (state, _) = watch::channel(AuthSnapshot::default());
        Self {
            inner: Arc::new(Inner {
                directory,
                verifier,
                sessions,
                settings,
                state,
                gate: Mutex::new(()),
                restored: AtomicBool::new(false),
                pending_logins: AtomicUsize::new(0),
            }),
        }
    }

    /// Adopt the persisted session, if any, without asking for credentials.
    ///
    /// Only the first call does anything. A payload that cannot be decoded
    /// is removed from storage and treated as no session.
    pub async fn restore_session(&self) {
        let _gate = self.inner.gate.lock().await;
        if self.inner.restored.load(Ordering::SeqCst) {
            tracing::debug!("Session already restored");
            return;
        }
        self.inner.restore_locked();
    }

    /// Check credentials and, on success, start a session.
    ///
    /// Attempts are serialized: a call made while another is in flight waits
    /// for it and then runs its own check. Once issued, an attempt runs to
    /// completion even if the caller stops waiting for it.
    pub async fn login(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        let pending = PendingLogin::start(&self.inner);
        let inner = self.inner.clone();
        let email = email.to_string();
        let password = password.to_string();

        let attempt = tokio::spawn(async move {
            let _pending = pending;
            inner.login(&email, &password).await
        });

        attempt.await.map_err(|e| {
            tracing::error!("Login attempt aborted: {}", e);
            AuthError::AuthServiceUnavailable("login attempt aborted".to_string())
        })?
    }

    /// End the session. Calling this without a session is a no-op.
    pub async fn logout(&self) {
        let _gate = self.inner.gate.lock().await;

        if let Err(e) = self.inner.sessions.clear() {
            tracing::error!("Failed to clear stored session: {}", e);
        }
        let previous = self.inner.state.borrow().identity.clone();
        self.inner.publish(None, GuardEvent::LoggedOut);

        match previous {
            Some(identity) => tracing::info!("User {} logged out", identity.email),
            None => tracing::debug!("Logout without an active session"),
        }
    }

    pub fn snapshot(&self) -> AuthSnapshot {
        self.inner.state.borrow().clone()
    }

    pub fn current_identity(&self) -> Option<Identity> {
        self.inner.state.borrow().identity.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.inner.state.borrow().is_loading
    }

    pub fn is_authenticated(&self) -> bool {
        self.inner.state.borrow().is_authenticated()
    }

    pub fn guard_state(&self) -> GuardState {
        self.inner.state.borrow().guard
    }

    /// Receive every published snapshot from now on
    pub fn subscribe(&self) -> watch::Receiver<AuthSnapshot> {
        self.inner.state.subscribe()
    }
}

impl std::fmt::Debug for AuthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthService")
            .field("sessions", &self.inner.sessions)
            .field("snapshot", &*self.inner.state.borrow())
            .finish()
    }
}
