// web-server/src/api/auth.rs
use crate::error::ApiError;
use crate::state::AppState;
use actix_web::{get, post, web, HttpResponse, Responder};
use chrono::Utc;
use common::guard::{HOME_PATH, LOGIN_PATH};
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetRequest {
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub identity: Option<common::Identity>,
    pub is_authenticated: bool,
    pub is_loading: bool,
    pub state: common::GuardState,
}

/// Served at both `/api` and `/api/`
pub async fn api_index() -> impl Responder {
    HttpResponse::Ok().json(json!({
        "name": "EduManager Dashboard API",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

#[post("/auth/login")]
pub async fn login(
    body: web::Json<LoginRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let identity = state.auth.login(&body.email, &body.password).await?;

    Ok(HttpResponse::Ok().json(json!({
        "identity": identity,
        "redirect": HOME_PATH
    })))
}

#[post("/auth/logout")]
pub async fn logout(state: web::Data<AppState>) -> impl Responder {
    state.auth.logout().await;
    HttpResponse::Ok().json(json!({ "redirect": LOGIN_PATH }))
}

#[get("/auth/session")]
pub async fn session(state: web::Data<AppState>) -> impl Responder {
    let snapshot = state.auth.snapshot();
    HttpResponse::Ok().json(SessionResponse {
        is_authenticated: snapshot.is_authenticated(),
        is_loading: snapshot.is_loading,
        state: snapshot.guard,
        identity: snapshot.identity,
    })
}

/// Acknowledge a password reset request.
///
/// No mail is sent. The answer is the same whether or not the account
/// exists.
#[post("/auth/forgot-password")]
pub async fn forgot_password(
    body: web::Json<ResetRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let email = body.email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(ApiError::BadRequest("A valid email address is required".to_string()));
    }

    if !state.reset_latency.is_zero() {
        tokio::time::sleep(state.reset_latency).await;
    }
    tracing::info!("Password reset requested for {}", email);

    Ok(HttpResponse::Accepted().json(json!({
        "status": "sent",
        "email": email,
        "requested_at": Utc::now()
    })))
}
