//! Request gate for the admin dashboard.
//!
//! Runs before routing for every request. Paths outside the protected prefix pass
//! through untouched. Inside it, the admin cookie must verify or the visitor is
//! redirected to the login page with the original path+query as `next`.

use axum::{
    extract::{Request, State},
    http::Uri,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use std::{fmt, sync::Arc};
use tracing::debug;

use super::{
    redirect::login_redirect_target,
    session::{ADMIN_SESSION_COOKIE, LiteralCookieVerifier, SessionVerifier, extract_cookie},
};

pub const DEFAULT_PROTECTED_PREFIX: &str = "/dashboard";
pub const DEFAULT_LOGIN_PATH: &str = "/admin-login";
pub const DEFAULT_NEXT_PATH: &str = "/dashboard";

/// Outcome of checking one request against the gate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GateDecision {
    /// Path is not protected.
    Public,
    Authenticated,
    /// Redirect target for the login page.
    Unauthenticated(String),
}

#[derive(Clone)]
pub struct AdminGate {
    verifier: Arc<dyn SessionVerifier>,
    protected_prefix: String,
    login_path: String,
    default_next: String,
    cookie_name: String,
}

impl fmt::Debug for AdminGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminGate")
            .field("mode", &self.verifier.mode())
            .field("protected_prefix", &self.protected_prefix)
            .field("login_path", &self.login_path)
            .field("default_next", &self.default_next)
            .field("cookie_name", &self.cookie_name)
            .finish()
    }
}

impl Default for AdminGate {
    fn default() -> Self {
        Self::new(Arc::new(LiteralCookieVerifier))
    }
}

impl AdminGate {
    #[must_use]
    pub fn new(verifier: Arc<dyn SessionVerifier>) -> Self {
        Self {
            verifier,
            protected_prefix: DEFAULT_PROTECTED_PREFIX.to_string(),
            login_path: DEFAULT_LOGIN_PATH.to_string(),
            default_next: DEFAULT_NEXT_PATH.to_string(),
            cookie_name: ADMIN_SESSION_COOKIE.to_string(),
        }
    }

    #[must_use]
    pub fn with_protected_prefix(mut self, prefix: impl Into<String>) -> Self {
        let prefix: String = prefix.into();
        self.protected_prefix = prefix.trim_end_matches('/').to_string();
        self
    }

    #[must_use]
    pub fn with_login_path(mut self, login_path: impl Into<String>) -> Self {
        self.login_path = login_path.into();
        self
    }

    #[must_use]
    pub fn with_default_next(mut self, default_next: impl Into<String>) -> Self {
        self.default_next = default_next.into();
        self
    }

    #[must_use]
    pub fn with_cookie_name(mut self, cookie_name: impl Into<String>) -> Self {
        self.cookie_name = cookie_name.into();
        self
    }

    #[must_use]
    pub fn verifier(&self) -> &dyn SessionVerifier {
        self.verifier.as_ref()
    }

    #[must_use]
    pub fn login_path(&self) -> &str {
        &self.login_path
    }

    #[must_use]
    pub fn default_next(&self) -> &str {
        &self.default_next
    }

    #[must_use]
    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    /// `/dashboard` and anything below it; `/dashboards` is not protected.
    #[must_use]
    pub fn is_protected(&self, path: &str) -> bool {
        path.strip_prefix(self.protected_prefix.as_str())
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
    }

    /// Verify the admin cookie taken from request headers.
    #[must_use]
    pub fn is_admin(&self, headers: &axum::http::HeaderMap) -> bool {
        let cookie = extract_cookie(headers, &self.cookie_name);
        self.verifier.verify(cookie.as_deref())
    }

    /// Decide what to do with a request for `uri`.
    #[must_use]
    pub fn decide(&self, uri: &Uri, cookie_value: Option<&str>) -> GateDecision {
        if !self.is_protected(uri.path()) {
            return GateDecision::Public;
        }
        if self.verifier.verify(cookie_value) {
            return GateDecision::Authenticated;
        }
        let requested = uri
            .path_and_query()
            .map_or_else(|| uri.path(), |path_and_query| path_and_query.as_str());
        GateDecision::Unauthenticated(login_redirect_target(&self.login_path, requested))
    }
}

/// Middleware enforcing [`AdminGate`] on every request.
pub async fn require_admin_session(
    State(gate): State<Arc<AdminGate>>,
    request: Request,
    next: Next,
) -> Response {
    let cookie = extract_cookie(request.headers(), gate.cookie_name());
    match gate.decide(request.uri(), cookie.as_deref()) {
        GateDecision::Public => next.run(request).await,
        GateDecision::Authenticated => {
            debug!(path = %request.uri().path(), "admin session accepted");
            next.run(request).await
        }
        GateDecision::Unauthenticated(target) => {
            debug!(
                path = %request.uri().path(),
                cookie_present = cookie.is_some(),
                "admin session rejected, redirecting to login"
            );
            Redirect::temporary(&target).into_response()
        }
    }
}
