// web-server/src/error.rs
use actix_web::{http::header, http::StatusCode, HttpResponse, ResponseError};
use common::AuthError;
use serde_json::json;
use thiserror::Error;

/// Errors returned by the HTTP surface
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("{0}")]
    BadRequest(String),

    #[error("Too many login attempts. Please try again later.")]
    RateLimited { retry_after: u64 },
}

impl ApiError {
    /// Message safe to show to the user
    fn public_message(&self) -> String {
        match self {
            ApiError::Auth(AuthError::InvalidCredentials) => AuthError::InvalidCredentials.to_string(),
            ApiError::Auth(AuthError::AuthServiceUnavailable(_)) => {
                "Authentication service unavailable".to_string()
            }
            ApiError::Auth(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Auth(AuthError::InvalidCredentials) => StatusCode::UNAUTHORIZED,
            ApiError::Auth(AuthError::AuthServiceUnavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Auth(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if self.status_code().is_server_error() {
            tracing::error!("Request failed: {}", self);
        }

        let mut response = HttpResponse::build(self.status_code());
        if let ApiError::RateLimited { retry_after } = self {
            response.insert_header((header::RETRY_AFTER, retry_after.to_string()));
        }
        response.json(json!({ "error": self.public_message() }))
    }
}
