// web-server/src/main.rs
use actix_web::{middleware, App, HttpServer};
use common::{setup_tracing, Config};
use web_server::AppState;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let config = Config::from_env();

    if let Err(e) = setup_tracing(&config.log_level) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }

    let state = AppState::from_config(&config).map_err(std::io::Error::other)?;

    // Pages answer with a placeholder until this finishes
    let auth = state.auth.clone();
    actix_web::rt::spawn(async move {
        auth.restore_session().await;
    });

    let server_addr = config.server_addr.clone();
    let compress = config.static_files.enable_compression;
    tracing::info!("Starting dashboard host on {}", server_addr);

    HttpServer::new(move || {
        App::new()
            .wrap(middleware::Condition::new(compress, middleware::Compress::default()))
            .configure(|cfg| web_server::configure(cfg, &state))
    })
    .bind(&server_addr)?
    .run()
    .await
}
