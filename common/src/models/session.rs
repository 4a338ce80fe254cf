// common/src/models/session.rs
use crate::error::AuthError;
use crate::models::identity::Identity;
use crate::storage::KeyValueStore;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Storage key used when configuration does not override it
pub const DEFAULT_SESSION_KEY: &str = "sms_user";

/// Current layout version of [`PersistedSession`]
pub const SESSION_SCHEMA_VERSION: u32 = 1;

/// Envelope written to storage for the authenticated identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedSession {
    pub version: u32,
    pub saved_at: DateTime<Utc>,
    pub identity: Identity,
}

impl PersistedSession {
    pub fn new(identity: Identity) -> Self {
        Self {
            version: SESSION_SCHEMA_VERSION,
            saved_at: Utc::now(),
            identity,
        }
    }
}

/// Accepted on-disk layouts, newest first
#[derive(Deserialize)]
#[serde(untagged)]
enum StoredSession {
    Versioned(PersistedSession),
    // Bare identity written before the envelope existed
    Legacy(Identity),
}

/// Decode a stored payload into the identity it carries.
pub fn decode_session(raw: &str) -> Result<Identity, AuthError> {
    let stored: StoredSession = serde_json::from_str(raw)
        .map_err(|e| AuthError::MalformedSession(e.to_string()))?;

    match stored {
        StoredSession::Versioned(session) if session.version == SESSION_SCHEMA_VERSION => {
            Ok(session.identity)
        }
        StoredSession::Versioned(session) => Err(AuthError::MalformedSession(format!(
            "unsupported session version {}",
            session.version
        ))),
        StoredSession::Legacy(identity) => Ok(identity),
    }
}

/// Mirrors the single session identity into a key-value medium.
#[derive(Clone)]
pub struct SessionStore {
    store: Arc<dyn KeyValueStore>,
    key: String,
}

impl SessionStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_key(store, DEFAULT_SESSION_KEY)
    }

    pub fn with_key(store: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    /// Read the persisted identity.
    ///
    /// Returns `Ok(None)` when nothing is stored and
    /// `Err(MalformedSession)` when the payload cannot be decoded.
    pub fn load(&self) -> Result<Option<Identity>, AuthError> {
        match self.store.get(&self.key)? {
            Some(raw) => decode_session(&raw).map(Some),
            None => Ok(None),
        }
    }

    pub fn save(&self, identity: &Identity) -> Result<(), AuthError> {
        let payload = serde_json::to_string(&PersistedSession::new(identity.clone()))
            .map_err(|e| AuthError::Storage(e.to_string()))?;
        self.store.set(&self.key, &payload)
    }

    pub fn clear(&self) -> Result<(), AuthError> {
        self.store.remove(&self.key)
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore").field("key", &self.key).finish()
    }
}
