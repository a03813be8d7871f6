use derive_more::{Display, From, Into};
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Backend account identifier.
///
/// Opaque to this crate: it is echoed back into API paths and never parsed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display, From, Into)]
#[serde(transparent)]
pub struct AccountId(pub String);

impl AccountId {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Bearer credential issued at login.
///
/// `Debug` is redacted so sessions can be logged without leaking the token.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, From, Into)]
#[serde(transparent)]
pub struct Credential(String);

impl Credential {
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Raw token, for the `Authorization: Bearer` header only.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Credential(***)")
    }
}

/// Role classifier carried by a session and required by a route scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Administrator,
    Admin,
    User,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Administrator, Role::Admin, Role::User];

    /// Wire tag, also the first path segment of the role's route subtree.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Administrator => "administrator",
            Self::Admin => "admin",
            Self::User => "user",
        }
    }

    /// Entry point an unauthenticated visitor of this role's subtree is sent to.
    #[must_use]
    pub fn login_path(self) -> &'static str {
        match self {
            Self::Administrator => "/administrator/login",
            Self::Admin => "/admin/login",
            Self::User => "/user/login",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| Error::Decode(format!("unknown role tag: {s}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_tags_parse() {
        assert_eq!("administrator".parse::<Role>().unwrap(), Role::Administrator);
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!("user".parse::<Role>().unwrap(), Role::User);
    }

    #[test]
    fn unknown_role_tag_rejected() {
        assert!("Admin".parse::<Role>().is_err());
        assert!("theater".parse::<Role>().is_err());
        assert!("".parse::<Role>().is_err());
    }

    #[test]
    fn role_serde_uses_lowercase_tag() {
        let json = serde_json::to_string(&Role::Administrator).unwrap();
        assert_eq!(json, "\"administrator\"");
        let parsed: Role = serde_json::from_str("\"user\"").unwrap();
        assert_eq!(parsed, Role::User);
    }

    #[test]
    fn login_paths_follow_role_subtree() {
        for role in Role::ALL {
            assert!(role.login_path().starts_with(&format!("/{}/", role.as_str())));
        }
    }

    #[test]
    fn credential_debug_is_redacted() {
        let cred = Credential::new("secret-token");
        assert_eq!(format!("{cred:?}"), "Credential(***)");
        assert_eq!(cred.expose(), "secret-token");
    }

    #[test]
    fn account_id_is_transparent() {
        let id = AccountId::from("42".to_string());
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"42\"");
        assert_eq!(id.to_string(), "42");
    }
}
