pub mod identity;
pub mod session;

pub use identity::{Identity, Role};
pub use session::{decode_session, PersistedSession, SessionStore, DEFAULT_SESSION_KEY, SESSION_SCHEMA_VERSION};
