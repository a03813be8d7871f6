#![doc = include_str!("../README.md")]

pub mod cache;
#[cfg(feature = "http")]
pub mod client;
#[cfg(feature = "http")]
pub mod config;
pub mod context;
pub mod error;
pub mod guard;
pub mod permission;
pub mod routes;
pub mod session;
pub mod types;

// Re-exports for convenient access
pub use cache::{OwnedSet, PermissionCache, PermissionSource, RefreshOutcome};
#[cfg(feature = "http")]
pub use client::{ApiClient, ApiConfig, LoginResponse};
#[cfg(feature = "http")]
pub use config::{AccessConfig, ConfiguredStorage};
pub use context::AccessContext;
pub use error::Error;
pub use guard::{GuardDecision, Navigation, RoleMatching, RouteGuard};
pub use permission::{Functionality, PermissionGrant, PermissionSet, has_permission};
pub use routes::{Page, Route, RouteScope};
pub use session::{FileStorage, MemoryStorage, Session, SessionStorage, SessionStore};
pub use types::{AccountId, Credential, Role};
