// web-server/src/api/mod.rs
pub mod auth;

use crate::error::ApiError;
use crate::middleware::RateLimiter;
use actix_web::{web, HttpResponse};
use serde_json::json;

pub fn configure(cfg: &mut web::ServiceConfig, limiter: RateLimiter) {
    cfg.service(
        web::scope("/api")
            .app_data(
                web::JsonConfig::default()
                    .error_handler(|err, _req| ApiError::BadRequest(err.to_string()).into()),
            )
            .wrap(limiter)
            .service(web::resource(["", "/"]).route(web::get().to(auth::api_index)))
            .service(auth::login)
            .service(auth::logout)
            .service(auth::session)
            .service(auth::forgot_password)
            .default_service(web::to(|| async {
                HttpResponse::NotFound().json(json!({ "error": "Not found" }))
            })),
    );
}
