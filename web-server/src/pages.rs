// web-server/src/pages.rs
use crate::state::AppState;
use actix_web::{http::header, http::Method, web, HttpRequest, HttpResponse};
use common::guard::{Access, Navigation, Route};
use common::navigation::{nav_items, NavItem};
use common::Identity;
use serde::Serialize;
use serde_json::json;
use std::collections::BTreeMap;

/// What the presentation layer needs to draw a page.
#[derive(Debug, Serialize)]
pub struct PageView {
    pub view: &'static str,
    pub path: String,
    pub params: BTreeMap<&'static str, String>,
    pub identity: Option<Identity>,
    pub navigation: Option<Vec<NavItem>>,
}

impl PageView {
    pub fn new(route: &Route, identity: Option<Identity>) -> Self {
        let mut params = BTreeMap::new();
        if let Route::StudentDetail { id } = route {
            params.insert("id", id.clone());
        }

        let path = route.path();
        // auth pages never carry the session
        let identity = identity.filter(|_| route.access() == Access::Protected);
        let navigation = identity.as_ref().map(|identity| nav_items(identity.role, &path));

        Self {
            view: route.view_name(),
            path,
            params,
            identity,
            navigation,
        }
    }
}

/// Fallback for every path not claimed by the API or assets
pub async fn navigate(req: HttpRequest, state: web::Data<AppState>) -> HttpResponse {
    if *req.method() != Method::GET && *req.method() != Method::HEAD {
        return HttpResponse::MethodNotAllowed()
            .insert_header((header::ALLOW, "GET, HEAD"))
            .finish();
    }

    let (navigation, snapshot) = state.guard.navigate(req.path());
    match navigation {
        Navigation::Placeholder => HttpResponse::ServiceUnavailable()
            .insert_header((header::RETRY_AFTER, "1"))
            .insert_header((header::CACHE_CONTROL, "no-store"))
            .json(json!({ "view": "loading" })),
        Navigation::Redirect { to, .. } => {
            // a redirect response is never kept as its own history entry
            HttpResponse::Found()
                .insert_header((header::LOCATION, to))
                .insert_header((header::CACHE_CONTROL, "no-store"))
                .finish()
        }
        Navigation::Render(route) => HttpResponse::Ok()
            .insert_header((header::CACHE_CONTROL, "no-store"))
            .json(PageView::new(&route, snapshot.identity)),
    }
}
