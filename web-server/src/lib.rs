// web-server/src/lib.rs
pub mod api;
pub mod error;
pub mod middleware;
pub mod pages;
pub mod state;
pub mod static_files;

pub use state::AppState;

use actix_web::web;

/// Register API, assets and the guarded page fallback for one app instance
pub fn configure(cfg: &mut web::ServiceConfig, state: &AppState) {
    cfg.app_data(web::Data::new(state.clone()));
    api::configure(cfg, state.login_limiter.clone());
    static_files::configure(cfg, &state.static_files);
    cfg.default_service(web::to(pages::navigate));
}
