// common/src/error.rs
use thiserror::Error;

/// Failures produced by the auth core.
///
/// None of these are fatal to the process. `MalformedSession` is handled
/// internally by treating the stored session as absent and is never shown
/// to the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// Unknown email or wrong password. The two cases are deliberately
    /// indistinguishable to the caller.
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("stored session is malformed: {0}")]
    MalformedSession(String),

    /// Reserved for directory backends that can fail; the in-memory
    /// directory never returns it.
    #[error("authentication service unavailable: {0}")]
    AuthServiceUnavailable(String),

    #[error("session storage error: {0}")]
    Storage(String),
}

impl AuthError {
    /// Whether the user can fix this by retrying with different input
    pub fn is_user_correctable(&self) -> bool {
        matches!(self, AuthError::InvalidCredentials)
    }
}

impl From<std::io::Error> for AuthError {
    fn from(err: std::io::Error) -> Self {
        AuthError::Storage(err.to_string())
    }
}
