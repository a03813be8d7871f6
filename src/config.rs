use std::path::PathBuf;

use url::Url;

use crate::client::{ApiClient, ApiConfig};
use crate::context::AccessContext;
use crate::error::Error;
use crate::guard::{RoleMatching, RouteGuard};
use crate::session::{FileStorage, MemoryStorage, SessionStorage, SessionStore};

/// Session storage chosen at configuration time.
#[derive(Debug)]
pub enum ConfiguredStorage {
    Memory(MemoryStorage),
    File(FileStorage),
}

impl SessionStorage for ConfiguredStorage {
    fn read(&self) -> Result<Option<String>, Error> {
        match self {
            Self::Memory(s) => s.read(),
            Self::File(s) => s.read(),
        }
    }

    fn write(&self, record: &str) -> Result<(), Error> {
        match self {
            Self::Memory(s) => s.write(record),
            Self::File(s) => s.write(record),
        }
    }

    fn remove(&self) -> Result<(), Error> {
        match self {
            Self::Memory(s) => s.remove(),
            Self::File(s) => s.remove(),
        }
    }
}

/// Complete access-layer configuration.
///
/// Use [`from_env()`](AccessConfig::from_env) for convention-based setup,
/// or [`new()`](AccessConfig::new) with `with_*` methods for full control.
#[derive(Debug, Clone)]
pub struct AccessConfig {
    pub(crate) api: ApiConfig,
    pub(crate) session_file: Option<PathBuf>,
    pub(crate) role_matching: RoleMatching,
}

impl AccessConfig {
    /// Defaults: in-memory session storage, login-only route guard.
    #[must_use]
    pub fn new(api: ApiConfig) -> Self {
        Self {
            api,
            session_file: None,
            role_matching: RoleMatching::default(),
        }
    }

    /// Create config from environment variables.
    ///
    /// # Required env vars
    /// - `FLIGHTDESK_API_URL`: backend base URL
    ///
    /// # Optional env vars
    /// - `FLIGHTDESK_ROUTE_TAG`: opaque tag embedded in permission URLs
    /// - `FLIGHTDESK_LOGIN_PATH`: login endpoint relative to the base URL
    /// - `FLIGHTDESK_SESSION_FILE`: persist the session record to this file
    /// - `FLIGHTDESK_ENFORCE_ROLES`: `"1"` or `"true"` to require role equality on routes
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the base URL is missing or invalid.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, Error> {
        let base = lookup("FLIGHTDESK_API_URL")
            .ok_or_else(|| Error::Config("FLIGHTDESK_API_URL is required".into()))?;
        let base: Url = base
            .parse()
            .map_err(|e| Error::Config(format!("FLIGHTDESK_API_URL: {e}")))?;

        let mut api = ApiConfig::new(base);
        if let Some(tag) = lookup("FLIGHTDESK_ROUTE_TAG") {
            api = api.with_route_tag(tag);
        }
        if let Some(path) = lookup("FLIGHTDESK_LOGIN_PATH") {
            api = api.with_login_path(path);
        }

        let enforce = matches!(lookup("FLIGHTDESK_ENFORCE_ROLES").as_deref(), Some("1" | "true"));

        let mut config = Self::new(api).with_role_matching(if enforce {
            RoleMatching::RequireRole
        } else {
            RoleMatching::LoginOnly
        });
        if let Some(file) = lookup("FLIGHTDESK_SESSION_FILE").filter(|f| !f.is_empty()) {
            config = config.with_session_file(file);
        }
        Ok(config)
    }

    #[must_use]
    pub fn with_session_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.session_file = Some(path.into());
        self
    }

    #[must_use]
    pub fn with_role_matching(mut self, matching: RoleMatching) -> Self {
        self.role_matching = matching;
        self
    }

    #[must_use]
    pub fn api(&self) -> &ApiConfig {
        &self.api
    }

    #[must_use]
    pub fn session_file(&self) -> Option<&std::path::Path> {
        self.session_file.as_deref()
    }

    #[must_use]
    pub fn role_matching(&self) -> RoleMatching {
        self.role_matching
    }

    /// Wire storage, HTTP client and guard into a ready context.
    #[must_use]
    pub fn build(self) -> AccessContext<ConfiguredStorage, ApiClient> {
        let storage = match self.session_file {
            Some(path) => ConfiguredStorage::File(FileStorage::new(path)),
            None => ConfiguredStorage::Memory(MemoryStorage::new()),
        };
        AccessContext::new(
            SessionStore::new(storage),
            ApiClient::new(self.api),
            RouteGuard::new(self.role_matching),
        )
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn api_url_is_required() {
        let err = AccessConfig::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, Error::Config(msg) if msg.contains("FLIGHTDESK_API_URL")));
    }

    #[test]
    fn invalid_api_url_rejected() {
        let err = AccessConfig::from_lookup(lookup(&[("FLIGHTDESK_API_URL", "not a url")]))
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn defaults_from_minimal_env() {
        let config =
            AccessConfig::from_lookup(lookup(&[("FLIGHTDESK_API_URL", "https://api.example.com")]))
                .unwrap();

        assert_eq!(config.api().route_tag(), "0");
        assert_eq!(config.role_matching(), RoleMatching::LoginOnly);
        assert!(config.session_file().is_none());
    }

    #[test]
    fn optional_vars_applied() {
        let config = AccessConfig::from_lookup(lookup(&[
            ("FLIGHTDESK_API_URL", "https://api.example.com/v2/"),
            ("FLIGHTDESK_ROUTE_TAG", "7"),
            ("FLIGHTDESK_LOGIN_PATH", "/accounts/signin/"),
            ("FLIGHTDESK_SESSION_FILE", "/tmp/flightdesk-session.json"),
            ("FLIGHTDESK_ENFORCE_ROLES", "true"),
        ]))
        .unwrap();

        assert_eq!(config.api().route_tag(), "7");
        assert_eq!(
            config.api().login_url().unwrap().as_str(),
            "https://api.example.com/v2/accounts/signin/"
        );
        assert_eq!(
            config.session_file(),
            Some(std::path::Path::new("/tmp/flightdesk-session.json"))
        );
        assert_eq!(config.role_matching(), RoleMatching::RequireRole);
    }

    #[test]
    fn build_picks_storage_backend() {
        let api = ApiConfig::new("https://api.example.com".parse().unwrap());

        let memory = AccessConfig::new(api.clone()).build();
        assert!(matches!(memory.session_store().storage(), ConfiguredStorage::Memory(_)));

        let file = AccessConfig::new(api)
            .with_session_file("/tmp/x.json")
            .with_role_matching(RoleMatching::RequireRole)
            .build();
        assert!(matches!(file.session_store().storage(), ConfiguredStorage::File(_)));
        assert_eq!(file.guard().matching(), RoleMatching::RequireRole);
    }
}
