//! Process-wide access state handed to page components.
//!
//! ```rust,ignore
//! let ctx = AccessConfig::from_env()?.build();
//!
//! let session = ctx.api().login(Role::Admin, "ana@example.com", "pw").await?;
//! ctx.login(session).await?;
//!
//! match ctx.navigate("/admin/flights") {
//!     Navigation::Render(page) => render(page, ctx.has_permission(Functionality::CreateFlight)),
//!     Navigation::Redirect(to) => redirect(to),
//!     Navigation::NotFound => not_found(),
//! }
//! ```

use std::sync::Arc;

use tokio::sync::watch;

use crate::cache::{PermissionCache, PermissionSource, RefreshOutcome, Snapshot};
use crate::error::Error;
use crate::guard::{Navigation, RouteGuard};
use crate::permission::{Functionality, PermissionSet};
use crate::session::{Session, SessionStorage, SessionStore};

pub struct AccessContext<S, P> {
    store: SessionStore<S>,
    permissions: PermissionCache<P>,
    guard: RouteGuard,
}

impl<S: SessionStorage, P: PermissionSource> AccessContext<S, P> {
    #[must_use]
    pub fn new(store: SessionStore<S>, source: P, guard: RouteGuard) -> Self {
        Self {
            store,
            permissions: PermissionCache::new(source),
            guard,
        }
    }

    #[must_use]
    pub fn use_session(&self) -> Option<Session> {
        self.store.load()
    }

    #[must_use]
    pub fn use_permission_set(&self) -> Arc<PermissionSet> {
        self.permissions.current()
    }

    #[must_use]
    pub fn has_permission(&self, functionality: Functionality) -> bool {
        self.permissions.has_permission(functionality)
    }

    #[must_use]
    pub fn is_logged_in(&self) -> bool {
        self.store.is_logged_in()
    }

    /// Run the route guard. A redirect that leaves no valid session also
    /// drops the cached permissions.
    pub fn navigate(&self, path: &str) -> Navigation {
        let nav = self.guard.navigate(&self.store, path);
        if matches!(nav, Navigation::Redirect(_)) && !self.store.is_logged_in() {
            self.permissions.clear();
        }
        nav
    }

    /// Re-evaluate permissions against the current session.
    ///
    /// Call on mount; [`login`](Self::login) and [`logout`](Self::logout)
    /// call it themselves.
    pub async fn sync_permissions(&self) -> Option<RefreshOutcome> {
        self.permissions.sync(self.store.load().as_ref()).await
    }

    /// Persist a fresh session and load its permissions.
    ///
    /// # Errors
    ///
    /// Returns the storage error if the session could not be saved. A failed
    /// permission fetch is not an error; the set stays empty until the next sync.
    pub async fn login(&self, session: Session) -> Result<Option<RefreshOutcome>, Error> {
        self.store.save(&session)?;
        tracing::info!(account = %session.account_id, role = %session.role, "Logged in");
        Ok(self.sync_permissions().await)
    }

    /// Drop the session and its permissions.
    pub async fn logout(&self) {
        if let Err(e) = self.store.clear() {
            tracing::warn!(error = %e, "Failed to clear session record during logout");
        }
        self.permissions.sync(None).await;
        tracing::info!("Logged out");
    }

    #[must_use]
    pub fn subscribe_permissions(&self) -> watch::Receiver<Snapshot> {
        self.permissions.subscribe()
    }

    #[must_use]
    pub fn session_store(&self) -> &SessionStore<S> {
        &self.store
    }

    #[must_use]
    pub fn guard(&self) -> &RouteGuard {
        &self.guard
    }

    /// The underlying permission source, e.g. the [`ApiClient`](crate::ApiClient) for login calls.
    #[must_use]
    pub fn api(&self) -> &P {
        self.permissions.source()
    }
}
