// web-server/src/static_files.rs
use actix_files::Files;
use actix_web::{http::header, middleware::DefaultHeaders, web};
use common::StaticFilesConfig;
use std::path::Path;

pub const ASSETS_PREFIX: &str = "/assets";

/// Serve dashboard assets under `/assets`.
///
/// Page paths are never served from disk; they go through the route guard.
pub fn configure(cfg: &mut web::ServiceConfig, config: &StaticFilesConfig) {
    if !Path::new(&config.path).is_dir() {
        tracing::warn!("Static asset directory {} does not exist", config.path);
    }

    cfg.service(
        web::scope(ASSETS_PREFIX)
            .wrap(DefaultHeaders::new().add((header::CACHE_CONTROL, config.cache.header_value())))
            .service(
                Files::new("", &config.path)
                    .prefer_utf8(true)
                    .use_etag(true)
                    .use_last_modified(true),
            ),
    );
}
