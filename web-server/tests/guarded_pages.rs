// web-server/tests/guarded_pages.rs
use actix_web::dev::ServiceResponse;
use actix_web::http::{header, StatusCode};
use actix_web::{test, App};
use common::Config;
use serde_json::Value;
use std::fs;
use web_server::AppState;

fn test_config() -> Config {
    let mut config = Config::default();
    config.auth.login_latency_ms = 0;
    config.auth.reset_latency_ms = 0;
    config.auth.storage_path = None;
    config
}

fn location<B>(resp: &ServiceResponse<B>) -> Option<String> {
    resp.headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

#[actix_web::test]
async fn test_pages_wait_for_restore() {
    let state = AppState::from_config(&test_config()).unwrap();
    let app = test::init_service(App::new().configure(|cfg| web_server::configure(cfg, &state))).await;

    for path in ["/", "/students", "/login", "/nowhere"] {
        let req = test::TestRequest::get().uri(path).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE, "{}", path);
        assert_eq!(resp.headers().get(header::RETRY_AFTER).unwrap(), "1");
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body, serde_json::json!({ "view": "loading" }));
    }

    state.auth.restore_session().await;
    let req = test::TestRequest::get().uri("/login").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
async fn test_unauthenticated_pages_redirect_to_login() {
    let state = AppState::from_config(&test_config()).unwrap();
    state.auth.restore_session().await;
    let app = test::init_service(App::new().configure(|cfg| web_server::configure(cfg, &state))).await;

    for path in ["/", "/students", "/students/7", "/grades", "/profile"] {
        let req = test::TestRequest::get().uri(path).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FOUND, "{}", path);
        assert_eq!(location(&resp).as_deref(), Some("/login"), "{}", path);
    }

    let req = test::TestRequest::get().uri("/forgot-password").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["view"], "forgot-password");
    assert!(body["identity"].is_null());
    assert!(body["navigation"].is_null());

    // unmatched paths go home first
    let req = test::TestRequest::get().uri("/settings").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(location(&resp).as_deref(), Some("/"));
}

#[actix_web::test]
async fn test_authenticated_pages_render_and_auth_pages_redirect() {
    let state = AppState::from_config(&test_config()).unwrap();
    state.auth.restore_session().await;
    state.auth.login("student@school.edu", "password").await.unwrap();
    let app = test::init_service(App::new().configure(|cfg| web_server::configure(cfg, &state))).await;

    for path in ["/login", "/forgot-password"] {
        let req = test::TestRequest::get().uri(path).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FOUND, "{}", path);
        assert_eq!(location(&resp).as_deref(), Some("/"));
    }

    let req = test::TestRequest::get().uri("/students/12").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["view"], "student-detail");
    assert_eq!(body["params"]["id"], "12");
    assert_eq!(body["identity"]["role"], "student");

    // hidden from the sidebar but still reachable
    let navigation = body["navigation"].as_array().unwrap();
    assert!(navigation.iter().all(|item| item["path"] != "/students"));
    let req = test::TestRequest::get().uri("/students").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
async fn test_page_paths_only_accept_get() {
    let state = AppState::from_config(&test_config()).unwrap();
    state.auth.restore_session().await;
    let app = test::init_service(App::new().configure(|cfg| web_server::configure(cfg, &state))).await;

    let req = test::TestRequest::post().uri("/students").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[actix_web::test]
async fn test_assets_are_served_with_cache_headers() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("app.css"), "body { margin: 0 }").unwrap();

    let mut config = test_config();
    config.static_files.path = dir.path().to_string_lossy().into_owned();
    let state = AppState::from_config(&config).unwrap();
    let app = test::init_service(App::new().configure(|cfg| web_server::configure(cfg, &state))).await;

    // assets do not depend on the session state
    let req = test::TestRequest::get().uri("/assets/app.css").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers().get(header::CACHE_CONTROL).unwrap(),
        "public, max-age=3600, must-revalidate"
    );
    let body = test::read_body(resp).await;
    assert_eq!(&body[..], b"body { margin: 0 }");
}
