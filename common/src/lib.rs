pub mod auth;
pub mod config;
pub mod credentials;
pub mod directory;
pub mod error;
pub mod guard;
pub mod models;
pub mod navigation;
pub mod storage;
pub mod utils;

pub use auth::{AuthService, AuthSettings, AuthSnapshot};
pub use self::config::*;
pub use credentials::{CredentialVerifier, SaltedHashVerifier};
pub use directory::{StaticUserDirectory, UserDirectory};
pub use error::AuthError;
pub use guard::{GuardState, Navigation, Route, RouteGuard};
pub use models::{Identity, Role, SessionStore};
pub use storage::{FileStore, KeyValueStore, MemoryStore};
pub use utils::*;
