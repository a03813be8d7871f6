//! Route Guard: decides whether a navigation may enter a protected subtree.
//!
//! The decision is recomputed from the Session Store on every navigation and
//! never cached.

use crate::routes::{self, Page, RouteScope};
use crate::session::{Session, SessionStorage, SessionStore};

/// How a present session is matched against a scope's role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RoleMatching {
    /// Any logged-in session enters any subtree, whatever its role.
    #[default]
    LoginOnly,
    /// The session's role must equal the scope's role.
    RequireRole,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    Authorized,
    Unauthorized { redirect_to: &'static str },
}

/// Outcome of navigating to a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    Render(Page),
    Redirect(&'static str),
    NotFound,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RouteGuard {
    matching: RoleMatching,
}

impl RouteGuard {
    #[must_use]
    pub fn new(matching: RoleMatching) -> Self {
        Self { matching }
    }

    #[must_use]
    pub fn matching(&self) -> RoleMatching {
        self.matching
    }

    /// Decide entry to `scope` for the given session.
    #[must_use]
    pub fn check(&self, session: Option<&Session>, scope: &RouteScope) -> GuardDecision {
        let unauthorized = GuardDecision::Unauthorized {
            redirect_to: scope.login_path(),
        };
        match (session, self.matching) {
            (None, _) => unauthorized,
            (Some(_), RoleMatching::LoginOnly) => GuardDecision::Authorized,
            (Some(s), RoleMatching::RequireRole) if s.role == scope.role => {
                GuardDecision::Authorized
            }
            (Some(s), RoleMatching::RequireRole) => {
                tracing::debug!(
                    session_role = %s.role,
                    required = %scope.role,
                    "Role mismatch for route scope"
                );
                unauthorized
            }
        }
    }

    /// Resolve `path` and apply [`check`](Self::check) with the store's current session.
    ///
    /// Hitting a protected route without a valid session clears whatever
    /// record the store holds, so a malformed record does not linger.
    pub fn navigate<S: SessionStorage>(&self, store: &SessionStore<S>, path: &str) -> Navigation {
        let Some(route) = routes::resolve(path) else {
            return Navigation::NotFound;
        };
        let Some(scope) = route.scope else {
            return Navigation::Render(route.page);
        };

        let session = store.load();
        match self.check(session.as_ref(), &scope) {
            GuardDecision::Authorized => Navigation::Render(route.page),
            GuardDecision::Unauthorized { redirect_to } => {
                if session.is_none() {
                    if let Err(e) = store.clear() {
                        tracing::warn!(error = %e, "Failed to clear session record");
                    }
                }
                tracing::debug!(path = %path, redirect_to, "Navigation redirected to login");
                Navigation::Redirect(redirect_to)
            }
        }
    }
}
