//! Permission Cache: an in-memory mirror of the backend's grants for the
//! current identity.
//!
//! A refresh replaces the cached set wholesale and notifies subscribers only
//! when the fetched set differs structurally from the cached one. The set is
//! owned by the account it was fetched for: a refresh for another account
//! drops it before fetching, so a failed refresh keeps the previous set only
//! for the same account. Concurrent refreshes are not sequenced: whichever
//! fetch resolves last wins.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::watch;

use crate::error::Error;
use crate::permission::{Functionality, PermissionSet, has_permission};
use crate::session::Session;
use crate::types::{AccountId, Credential};

/// Where fresh permission sets come from.
///
/// [`ApiClient`](crate::ApiClient) is the HTTP implementation.
pub trait PermissionSource: Send + Sync + 'static {
    /// Fetch every grant held by `account` across all scopes.
    fn fetch(
        &self,
        account: &AccountId,
        credential: &Credential,
    ) -> impl Future<Output = Result<PermissionSet, Error>> + Send;
}

/// What a refresh did to the cached set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// First fetch, or the set changed. Subscribers were notified.
    Replaced,
    /// Same set as cached. Nothing was notified.
    Unchanged,
    /// Fetch failed. The previous set stays in place.
    Failed,
}

/// Permission set together with the account it was fetched for.
#[derive(Debug, Clone)]
pub struct OwnedSet {
    pub account: AccountId,
    pub set: Arc<PermissionSet>,
}

/// `None` until the first successful fetch, and again after logout.
pub type Snapshot = Option<OwnedSet>;

pub struct PermissionCache<P> {
    source: P,
    snapshot: watch::Sender<Snapshot>,
}

impl<P: PermissionSource> PermissionCache<P> {
    #[must_use]
    pub fn new(source: P) -> Self {
        Self {
            source,
            snapshot: watch::Sender::new(None),
        }
    }

    /// Fetch once and replace the cached set if it changed.
    ///
    /// A set cached for a different account is cleared first.
    pub async fn refresh(&self, account: &AccountId, credential: &Credential) -> RefreshOutcome {
        self.clear_unless_owned_by(account);

        let fresh = match self.source.fetch(account, credential).await {
            Ok(set) => set,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    account = %account,
                    "Permission refresh failed, keeping previous set"
                );
                return RefreshOutcome::Failed;
            }
        };

        let count = fresh.len();
        let owner = account.clone();
        let replaced = self.snapshot.send_if_modified(move |current| {
            if current
                .as_ref()
                .is_some_and(|c| c.account == owner && *c.set == fresh)
            {
                return false;
            }
            *current = Some(OwnedSet {
                account: owner,
                set: Arc::new(fresh),
            });
            true
        });

        if replaced {
            tracing::info!(account = %account, grants = count, "Permission set replaced");
            RefreshOutcome::Replaced
        } else {
            tracing::debug!(account = %account, "Permission set unchanged");
            RefreshOutcome::Unchanged
        }
    }

    /// Follow a login-state change: refresh for a present session, clear otherwise.
    ///
    /// Returns `None` when there was no session to refresh for.
    pub async fn sync(&self, session: Option<&Session>) -> Option<RefreshOutcome> {
        match session {
            Some(s) => Some(self.refresh(&s.account_id, &s.credential).await),
            None => {
                self.clear();
                None
            }
        }
    }

    /// Drop the cached set. Notifies subscribers if anything was cached.
    pub fn clear(&self) {
        if self.snapshot.send_if_modified(|current| current.take().is_some()) {
            tracing::info!("Permission set cleared");
        }
    }

    fn clear_unless_owned_by(&self, account: &AccountId) {
        let dropped = self.snapshot.send_if_modified(|current| {
            if current.as_ref().is_some_and(|c| c.account != *account) {
                *current = None;
                return true;
            }
            false
        });
        if dropped {
            tracing::info!(account = %account, "Dropped permission set of previous account");
        }
    }

    /// Current set; empty until the first successful refresh.
    #[must_use]
    pub fn current(&self) -> Arc<PermissionSet> {
        self.snapshot
            .borrow()
            .as_ref()
            .map(|c| c.set.clone())
            .unwrap_or_default()
    }

    /// Account the cached set was fetched for.
    #[must_use]
    pub fn owner(&self) -> Option<AccountId> {
        self.snapshot.borrow().as_ref().map(|c| c.account.clone())
    }

    /// Whether a refresh has succeeded since construction or the last clear.
    #[must_use]
    pub fn is_populated(&self) -> bool {
        self.snapshot.borrow().is_some()
    }

    #[must_use]
    pub fn has_permission(&self, functionality: Functionality) -> bool {
        self.snapshot
            .borrow()
            .as_ref()
            .is_some_and(|c| has_permission(&c.set, functionality))
    }

    /// Receiver that observes one change per replacement or clear.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.snapshot.subscribe()
    }

    #[must_use]
    pub fn source(&self) -> &P {
        &self.source
    }
}
