// common/src/guard.rs
//! Route table and the guard that decides what a navigation may show.

use crate::auth::{AuthService, AuthSnapshot};
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::watch;

pub const LOGIN_PATH: &str = "/login";
pub const FORGOT_PASSWORD_PATH: &str = "/forgot-password";
pub const HOME_PATH: &str = "/";

/// Where the guard currently stands with respect to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GuardState {
    Loading,
    Authenticated,
    Unauthenticated,
}

/// Session transitions the guard reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardEvent {
    RestoreCompleted { authenticated: bool },
    LoggedIn,
    LoggedOut,
}

impl GuardState {
    /// Apply an event. Pairs outside the state machine leave the state as is.
    pub fn next(self, event: GuardEvent) -> GuardState {
        use GuardEvent::*;
        use GuardState::*;

        match (self, event) {
            (Loading, RestoreCompleted { authenticated: true }) => Authenticated,
            (Loading, RestoreCompleted { authenticated: false }) => Unauthenticated,
            (Authenticated, LoggedOut) => Unauthenticated,
            (Unauthenticated, LoggedIn) => Authenticated,
            (state, event) => {
                tracing::trace!("Guard ignores {:?} while {:?}", event, state);
                state
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GuardState::Loading => "loading",
            GuardState::Authenticated => "authenticated",
            GuardState::Unauthenticated => "unauthenticated",
        }
    }
}

impl fmt::Display for GuardState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who may enter a route
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Only without a session (login, password reset)
    AuthOnly,
    /// Only with a session
    Protected,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Route {
    Login,
    ForgotPassword,
    Dashboard,
    Students,
    StudentDetail { id: String },
    Courses,
    Attendance,
    Grades,
    Documents,
    Announcements,
    Profile,
}

impl Route {
    /// Match a request path against the route table.
    ///
    /// Empty segments are ignored, so trailing and doubled slashes resolve
    /// to the same route.
    pub fn parse(path: &str) -> Option<Route> {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        let route = match segments.as_slice() {
            [] => Route::Dashboard,
            ["login"] => Route::Login,
            ["forgot-password"] => Route::ForgotPassword,
            ["students"] => Route::Students,
            ["students", id] => Route::StudentDetail { id: id.to_string() },
            ["courses"] => Route::Courses,
            ["attendance"] => Route::Attendance,
            ["grades"] => Route::Grades,
            ["documents"] => Route::Documents,
            ["announcements"] => Route::Announcements,
            ["profile"] => Route::Profile,
            _ => return None,
        };
        Some(route)
    }

    pub fn access(&self) -> Access {
        match self {
            Route::Login | Route::ForgotPassword => Access::AuthOnly,
            _ => Access::Protected,
        }
    }

    pub fn path(&self) -> String {
        match self {
            Route::StudentDetail { id } => format!("/students/{}", id),
            other => other.base_path().to_string(),
        }
    }

    fn base_path(&self) -> &'static str {
        match self {
            Route::Login => LOGIN_PATH,
            Route::ForgotPassword => FORGOT_PASSWORD_PATH,
            Route::Dashboard => HOME_PATH,
            Route::Students | Route::StudentDetail { .. } => "/students",
            Route::Courses => "/courses",
            Route::Attendance => "/attendance",
            Route::Grades => "/grades",
            Route::Documents => "/documents",
            Route::Announcements => "/announcements",
            Route::Profile => "/profile",
        }
    }

    /// Name of the view the presentation layer renders for this route
    pub fn view_name(&self) -> &'static str {
        match self {
            Route::Login => "login",
            Route::ForgotPassword => "forgot-password",
            Route::Dashboard => "dashboard",
            Route::Students => "students",
            Route::StudentDetail { .. } => "student-detail",
            Route::Courses => "courses",
            Route::Attendance => "attendance",
            Route::Grades => "grades",
            Route::Documents => "documents",
            Route::Announcements => "announcements",
            Route::Profile => "profile",
        }
    }
}

/// Outcome of a navigation attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    /// Session state unknown yet; show a neutral placeholder and nothing else
    Placeholder,
    /// Go elsewhere. `replace` means the attempted entry is not kept in history.
    Redirect { to: &'static str, replace: bool },
    Render(Route),
}

impl Navigation {
    fn replace_with(to: &'static str) -> Self {
        Navigation::Redirect { to, replace: true }
    }
}

/// Decide what navigating to `path` shows in `state`.
pub fn resolve(state: GuardState, path: &str) -> Navigation {
    if state == GuardState::Loading {
        return Navigation::Placeholder;
    }

    let Some(route) = Route::parse(path) else {
        tracing::debug!("No route for {}, sending to {}", path, HOME_PATH);
        return Navigation::replace_with(HOME_PATH);
    };

    match (state, route.access()) {
        (GuardState::Unauthenticated, Access::Protected) => Navigation::replace_with(LOGIN_PATH),
        (GuardState::Authenticated, Access::AuthOnly) => Navigation::replace_with(HOME_PATH),
        _ => Navigation::Render(route),
    }
}

/// Gate for page navigations, following the auth service's published state.
#[derive(Debug, Clone)]
pub struct RouteGuard {
    session: watch::Receiver<AuthSnapshot>,
}

impl RouteGuard {
    pub fn new(auth: &AuthService) -> Self {
        Self {
            session: auth.subscribe(),
        }
    }

    /// Resolve a navigation against the latest session state.
    ///
    /// The snapshot the decision was made on is returned with it, so a
    /// rendered page shows the identity the guard let through.
    pub fn navigate(&self, path: &str) -> (Navigation, AuthSnapshot) {
        let snapshot = self.session.borrow().clone();
        let navigation = resolve(snapshot.guard, path);
        if let Navigation::Redirect { to, .. } = &navigation {
            tracing::debug!("Redirecting {} to {} ({})", path, to, snapshot.guard);
        }
        (navigation, snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROTECTED: [&str; 9] = [
        "/",
        "/students",
        "/students/42",
        "/courses",
        "/attendance",
        "/grades",
        "/documents",
        "/announcements",
        "/profile",
    ];

    #[test]
    fn test_state_machine_transitions() {
        use GuardEvent::*;
        use GuardState::*;

        assert_eq!(Loading.next(RestoreCompleted { authenticated: true }), Authenticated);
        assert_eq!(Loading.next(RestoreCompleted { authenticated: false }), Unauthenticated);
        assert_eq!(Authenticated.next(LoggedOut), Unauthenticated);
        assert_eq!(Unauthenticated.next(LoggedIn), Authenticated);

        // outside the machine
        assert_eq!(Loading.next(LoggedIn), Loading);
        assert_eq!(Loading.next(LoggedOut), Loading);
        assert_eq!(Unauthenticated.next(LoggedOut), Unauthenticated);
        assert_eq!(Authenticated.next(LoggedIn), Authenticated);
        assert_eq!(Authenticated.next(RestoreCompleted { authenticated: false }), Authenticated);
    }

    #[test]
    fn test_parse_route_table() {
        assert_eq!(Route::parse("/"), Some(Route::Dashboard));
        assert_eq!(Route::parse(""), Some(Route::Dashboard));
        assert_eq!(Route::parse("/login"), Some(Route::Login));
        assert_eq!(Route::parse("/login/"), Some(Route::Login));
        assert_eq!(Route::parse("/forgot-password"), Some(Route::ForgotPassword));
        assert_eq!(
            Route::parse("/students/s-17?tab=grades"),
            Some(Route::StudentDetail { id: "s-17".to_string() })
        );
        assert_eq!(Route::parse("/settings"), None);
        assert_eq!(Route::parse("/students/1/edit"), None);
    }

    #[test]
    fn test_paths_round_trip_through_parse() {
        for path in PROTECTED.iter().chain([LOGIN_PATH, FORGOT_PASSWORD_PATH].iter()) {
            let route = Route::parse(path).unwrap();
            assert_eq!(route.path(), *path);
        }
    }

    #[test]
    fn test_loading_renders_placeholder_everywhere() {
        for path in PROTECTED.iter().chain(["/login", "/nowhere"].iter()) {
            assert_eq!(resolve(GuardState::Loading, path), Navigation::Placeholder);
        }
    }

    #[test]
    fn test_unauthenticated_is_sent_to_login() {
        for path in PROTECTED {
            assert_eq!(
                resolve(GuardState::Unauthenticated, path),
                Navigation::Redirect { to: "/login", replace: true },
                "{}",
                path
            );
        }
        assert_eq!(resolve(GuardState::Unauthenticated, "/login"), Navigation::Render(Route::Login));
        assert_eq!(
            resolve(GuardState::Unauthenticated, "/forgot-password"),
            Navigation::Render(Route::ForgotPassword)
        );
    }

    #[test]
    fn test_authenticated_leaves_auth_pages() {
        for path in ["/login", "/forgot-password"] {
            assert_eq!(
                resolve(GuardState::Authenticated, path),
                Navigation::Redirect { to: "/", replace: true }
            );
        }
        assert_eq!(resolve(GuardState::Authenticated, "/students"), Navigation::Render(Route::Students));
    }

    #[test]
    fn test_unmatched_goes_home() {
        for state in [GuardState::Authenticated, GuardState::Unauthenticated] {
            assert_eq!(
                resolve(state, "/settings"),
                Navigation::Redirect { to: "/", replace: true }
            );
        }
    }

    mod with_service {
        use super::super::*;
        use crate::auth::AuthSettings;
        use crate::credentials::SaltedHashVerifier;
        use crate::directory::StaticUserDirectory;
        use crate::models::SessionStore;
        use crate::storage::MemoryStore;
        use std::sync::Arc;
        use std::time::Duration;

        fn service() -> AuthService {
            let directory = StaticUserDirectory::demo();
            let verifier = SaltedHashVerifier::with_shared_password(directory.users(), "password").unwrap();
            AuthService::new(
                Arc::new(directory),
                Arc::new(verifier),
                SessionStore::new(Arc::new(MemoryStore::new())),
                AuthSettings {
                    login_latency: Duration::ZERO,
                },
            )
        }

        #[tokio::test]
        async fn test_guard_follows_session_lifecycle() {
            let auth = service();
            let guard = RouteGuard::new(&auth);
            let (navigation, snapshot) = guard.navigate("/students");
            assert_eq!(navigation, Navigation::Placeholder);
            assert!(snapshot.is_loading);

            auth.restore_session().await;
            assert_eq!(
                guard.navigate("/students").0,
                Navigation::Redirect { to: LOGIN_PATH, replace: true }
            );

            auth.login("admin@school.edu", "password").await.unwrap();
            assert_eq!(
                guard.navigate("/login").0,
                Navigation::Redirect { to: HOME_PATH, replace: true }
            );
            let (navigation, snapshot) = guard.navigate("/students");
            assert_eq!(navigation, Navigation::Render(Route::Students));
            assert_eq!(snapshot.guard, GuardState::Authenticated);
            assert_eq!(snapshot.identity.map(|i| i.email), Some("admin@school.edu".to_string()));

            auth.logout().await;
            let (navigation, snapshot) = guard.navigate("/login");
            assert_eq!(navigation, Navigation::Render(Route::Login));
            assert_eq!(snapshot.identity, None);
        }
    }
}
