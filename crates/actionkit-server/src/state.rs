//! Shared application state and per-request context assembly.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::http::{header, HeaderMap};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use parking_lot::RwLock;

use actionkit_api::{ActionServices, RequestContext, SessionRegistry, SessionStore, User};

/// Cookie carrying the session id.
pub const SESSION_COOKIE: &str = "actionkit_session";

/// Header naming the admin panel the request comes from.
pub const PANEL_HEADER: &str = "x-actionkit-panel";

/// Header sent by navigation-style clients.
pub const INERTIA_HEADER: &str = "x-inertia";

/// State shared by all handlers.
#[derive(Clone)]
pub struct AppState {
    services: Arc<ActionServices>,
    sessions: Arc<SessionRegistry>,
    users: Arc<RwLock<HashMap<String, User>>>,
}

impl AppState {
    pub fn new(services: ActionServices) -> Self {
        let ttl = Duration::from_secs(services.config().session.handler_ttl_secs);
        Self {
            services: Arc::new(services),
            sessions: Arc::new(SessionRegistry::new(ttl)),
            users: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn services(&self) -> &Arc<ActionServices> {
        &self.services
    }

    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    /// Authenticate requests bearing `token` as `user`.
    pub fn add_api_token(&self, token: impl Into<String>, user: User) {
        tracing::info!("Registered API token for user: {}", user.name);
        self.users.write().insert(token.into(), user);
    }

    fn user_for(&self, headers: &HeaderMap) -> Option<User> {
        let token = headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))?;
        self.users.read().get(token.trim()).cloned()
    }

    /// Resolve the session, user and panel of a request.
    ///
    /// Flash data is aged once per request. The returned jar carries the
    /// session cookie.
    pub(crate) fn begin(&self, jar: CookieJar, headers: &HeaderMap) -> (RequestContext, CookieJar) {
        let session = self
            .sessions
            .resolve(jar.get(SESSION_COOKIE).map(|cookie| cookie.value()));
        session.age_flash_data();

        let cookie = Cookie::build((SESSION_COOKIE, session.id().to_string()))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax);
        let jar = jar.add(cookie);

        let panel = headers
            .get(PANEL_HEADER)
            .and_then(|value| value.to_str().ok())
            .filter(|value| !value.is_empty())
            .map(str::to_string);

        let session: Arc<dyn SessionStore> = session;
        let ctx = RequestContext::new(Arc::clone(&self.services), session)
            .with_user(self.user_for(headers))
            .with_panel(panel);
        (ctx, jar)
    }
}

/// Whether the client expects navigation semantics.
pub(crate) fn is_inertia(headers: &HeaderMap) -> bool {
    headers.contains_key(INERTIA_HEADER)
}

/// The page to send the client back to.
pub(crate) fn referer(headers: &HeaderMap) -> String {
    headers
        .get(header::REFERER)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .unwrap_or("/")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use actionkit_core::ActionsConfig;
    use axum::http::HeaderValue;

    fn state() -> AppState {
        AppState::new(ActionServices::new(ActionsConfig::default()).unwrap())
    }

    #[test]
    fn test_bearer_token_resolves_user() {
        let state = state();
        state.add_api_token("secret", User::new(1, "Ada"));

        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer secret"));
        headers.insert(PANEL_HEADER, HeaderValue::from_static("admin"));

        let (ctx, jar) = state.begin(CookieJar::new(), &headers);
        assert_eq!(ctx.user().unwrap().name, "Ada");
        assert_eq!(ctx.panel(), Some("admin"));
        assert!(jar.get(SESSION_COOKIE).is_some());
    }

    #[test]
    fn test_session_cookie_is_reused() {
        let state = state();
        let (first, jar) = state.begin(CookieJar::new(), &HeaderMap::new());
        let id = first.session().id().to_string();

        let (second, _) = state.begin(jar, &HeaderMap::new());
        assert_eq!(second.session().id(), id);
        assert!(second.user().is_none());
        assert_eq!(state.sessions().count(), 1);
    }

    #[test]
    fn test_referer_defaults_to_root() {
        let mut headers = HeaderMap::new();
        assert_eq!(referer(&headers), "/");

        headers.insert(header::REFERER, HeaderValue::from_static("/admin/posts"));
        assert_eq!(referer(&headers), "/admin/posts");
        assert!(!is_inertia(&headers));
    }
}
