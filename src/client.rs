use serde::{Deserialize, Serialize};
use url::Url;

use crate::cache::PermissionSource;
use crate::error::Error;
use crate::permission::{PermissionPayload, PermissionSet};
use crate::session::Session;
use crate::types::{AccountId, Credential, Role};

/// REST backend configuration.
///
/// ```rust,ignore
/// use flightdesk_access::ApiConfig;
///
/// let config = ApiConfig::new("https://api.flightdesk.example/v1/".parse()?)
///     .with_route_tag("3");
/// ```
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct ApiConfig {
    pub(crate) base_url: Url,
    pub(crate) route_tag: String,
    pub(crate) login_path: String,
}

impl ApiConfig {
    /// Create a configuration rooted at `base_url`.
    ///
    /// A trailing slash is added if missing so relative paths nest under it.
    #[must_use]
    pub fn new(mut base_url: Url) -> Self {
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Self {
            base_url,
            route_tag: "0".into(),
            login_path: "auth/login/".into(),
        }
    }

    /// Override the opaque route tag embedded in permission URLs (default `"0"`).
    #[must_use]
    pub fn with_route_tag(mut self, tag: impl Into<String>) -> Self {
        self.route_tag = tag.into();
        self
    }

    /// Override the login endpoint, relative to the base URL.
    #[must_use]
    pub fn with_login_path(mut self, path: impl Into<String>) -> Self {
        self.login_path = path.into().trim_start_matches('/').to_string();
        self
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    #[must_use]
    pub fn route_tag(&self) -> &str {
        &self.route_tag
    }

    #[must_use]
    pub fn login_path(&self) -> &str {
        &self.login_path
    }

    /// `{base}/permission/{route_tag}/{account}/all/`
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the base URL cannot carry a path.
    pub fn permissions_url(&self, account: &AccountId) -> Result<Url, Error> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| Error::Config(format!("base URL cannot be a base: {}", self.base_url)))?
            .pop_if_empty()
            .extend(["permission", &self.route_tag, account.as_str(), "all", ""]);
        Ok(url)
    }

    /// # Errors
    ///
    /// Returns [`Error::Config`] if the login path does not join onto the base URL.
    pub fn login_url(&self) -> Result<Url, Error> {
        self.base_url
            .join(&self.login_path)
            .map_err(|e| Error::Config(format!("login path `{}`: {e}", self.login_path)))
    }
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
    role: Role,
}

/// Login endpoint response: exactly the tuple a [`Session`] persists.
#[derive(Debug, Clone, Deserialize)]
#[non_exhaustive]
pub struct LoginResponse {
    #[serde(alias = "account_id")]
    pub id: AccountId,
    #[serde(alias = "display_name")]
    pub name: String,
    pub email: String,
    pub role: Role,
    #[serde(alias = "access_token")]
    pub token: Credential,
}

impl TryFrom<LoginResponse> for Session {
    type Error = Error;

    fn try_from(r: LoginResponse) -> Result<Self, Self::Error> {
        let session = Session {
            account_id: r.id,
            display_name: r.name,
            email: r.email,
            role: r.role,
            credential: r.token,
        };
        session.ensure_complete()?;
        Ok(session)
    }
}

/// HTTP client for the booking backend.
pub struct ApiClient {
    config: ApiConfig,
    http: reqwest::Client,
}

impl ApiClient {
    #[must_use]
    pub fn new(config: ApiConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }

    /// Use a custom HTTP client (for connection pool reuse or testing).
    #[must_use]
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.http = client;
        self
    }

    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    /// Authenticate and build the session to persist.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Http`] on network failure, [`Error::Api`] on a non-2xx
    /// response, or [`Error::Decode`] if the response is incomplete.
    pub async fn login(&self, role: Role, email: &str, password: &str) -> Result<Session, Error> {
        let response = self
            .http
            .post(self.config.login_url()?)
            .json(&LoginRequest {
                email,
                password,
                role,
            })
            .send()
            .await?;

        let response = Self::ensure_success(response, "login").await?;
        let body: LoginResponse = response.json().await?;
        body.try_into()
    }

    /// Fetch every grant held by `account` across all scopes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Http`] on network or decode failure, or
    /// [`Error::Api`] on a non-2xx response.
    pub async fn fetch_permissions(
        &self,
        account: &AccountId,
        credential: &Credential,
    ) -> Result<PermissionSet, Error> {
        let response = self
            .http
            .get(self.config.permissions_url(account)?)
            .bearer_auth(credential.expose())
            .send()
            .await?;

        let response = Self::ensure_success(response, "permission fetch").await?;
        let payload: PermissionPayload = response.json().await?;
        Ok(payload.into_set())
    }

    /// Checks HTTP response status; returns the response on success or an error with details.
    async fn ensure_success(
        response: reqwest::Response,
        operation: &'static str,
    ) -> Result<reqwest::Response, Error> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let detail = response.text().await.unwrap_or_default();
        Err(Error::Api {
            operation,
            status: Some(status),
            detail,
        })
    }
}

impl PermissionSource for ApiClient {
    async fn fetch(
        &self,
        account: &AccountId,
        credential: &Credential,
    ) -> Result<PermissionSet, Error> {
        self.fetch_permissions(account, credential).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ApiConfig {
        ApiConfig::new("https://api.example.com/v1".parse().unwrap())
    }

    #[test]
    fn base_url_gains_trailing_slash() {
        assert_eq!(config().base_url().as_str(), "https://api.example.com/v1/");
    }

    #[test]
    fn permissions_url_layout() {
        let url = config()
            .with_route_tag("3")
            .permissions_url(&AccountId::from("42".to_string()))
            .unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/v1/permission/3/42/all/");
    }

    #[test]
    fn permissions_url_escapes_account_id() {
        let url = config()
            .permissions_url(&AccountId::from("a/b".to_string()))
            .unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/v1/permission/0/a%2Fb/all/");
    }

    #[test]
    fn login_url_is_relative_to_base() {
        let url = config().with_login_path("/users/login/").login_url().unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/v1/users/login/");
    }

    #[test]
    fn login_response_becomes_session() {
        let json = r#"{"id":"9","name":"Bo","email":"bo@x.io",
                       "role":"administrator","access_token":"t"}"#;
        let response: LoginResponse = serde_json::from_str(json).unwrap();
        let session = Session::try_from(response).unwrap();

        assert_eq!(session.account_id.as_str(), "9");
        assert_eq!(session.role, Role::Administrator);
        assert_eq!(session.credential.expose(), "t");
    }

    #[test]
    fn incomplete_login_response_rejected() {
        let json = r#"{"id":"9","name":"","email":"bo@x.io","role":"user","token":"t"}"#;
        let response: LoginResponse = serde_json::from_str(json).unwrap();
        assert!(matches!(Session::try_from(response), Err(Error::Decode(_))));
    }
}
