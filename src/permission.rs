//! Functionality taxonomy, permission grants and the permission check.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer};

use crate::error::Error;

macro_rules! functionalities {
    ($($(#[$doc:meta])* $variant:ident => $code:literal,)+) => {
        /// Restricted capability a permission grant unlocks.
        ///
        /// The backend identifies these by numeric codes; the code is only
        /// used at the wire boundary. The code table must be kept in sync with
        /// the backend's functionality list: a code missing here is dropped on
        /// decode and its UI stays hidden.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[non_exhaustive]
        pub enum Functionality {
            $($(#[$doc])* $variant,)+
        }

        impl Functionality {
            pub const ALL: &'static [Functionality] = &[$(Functionality::$variant,)+];

            /// Backend wire code.
            #[must_use]
            pub fn code(self) -> &'static str {
                match self {
                    $(Self::$variant => $code,)+
                }
            }

            /// Look up a backend wire code. `None` for codes outside the taxonomy.
            #[must_use]
            pub fn from_code(code: &str) -> Option<Self> {
                match code {
                    $($code => Some(Self::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

functionalities! {
    ViewFlights => "1",
    CreateFlight => "2",
    UpdateFlight => "3",
    DeleteFlight => "4",
    ManageAirports => "5",
    ManageRegulations => "6",
    ViewBookings => "7",
    CancelBooking => "8",
    /// Create, edit and assign permission groups.
    ManagePermissionGroups => "9",
    /// Create, lock and edit user accounts.
    ManageAccounts => "10",
}

impl std::fmt::Display for Functionality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(self, f)
    }
}

impl std::str::FromStr for Functionality {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_code(s.trim())
            .ok_or_else(|| Error::Decode(format!("unknown functionality code: {s}")))
    }
}

/// One backend-issued grant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionGrant {
    pub functionality: Functionality,
    pub name: String,
    pub screen: String,
}

/// Grants held by the current identity, keyed by functionality.
///
/// Equality is structural, so two sets decoded from payloads that differ
/// only in key order compare equal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionSet {
    grants: BTreeMap<Functionality, PermissionGrant>,
}

impl PermissionSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn contains(&self, functionality: Functionality) -> bool {
        self.grants.contains_key(&functionality)
    }

    #[must_use]
    pub fn get(&self, functionality: Functionality) -> Option<&PermissionGrant> {
        self.grants.get(&functionality)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.grants.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.grants.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PermissionGrant> {
        self.grants.values()
    }
}

impl FromIterator<PermissionGrant> for PermissionSet {
    fn from_iter<I: IntoIterator<Item = PermissionGrant>>(iter: I) -> Self {
        let mut grants = BTreeMap::new();
        for grant in iter {
            grants.entry(grant.functionality).or_insert(grant);
        }
        Self { grants }
    }
}

/// Whether `functionality` is granted in `set`.
///
/// An empty set (nothing fetched yet, or every fetch failed) grants nothing.
#[must_use]
pub fn has_permission(set: &PermissionSet, functionality: Functionality) -> bool {
    set.contains(functionality)
}

/// Grant entry as sent by the backend.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawGrant {
    #[serde(alias = "functionality_id", deserialize_with = "code_string")]
    pub functionality_id: String,
    #[serde(default, alias = "functionality_name")]
    pub functionality_name: String,
    #[serde(default, alias = "screen_id", deserialize_with = "optional_code_string")]
    pub screen_id: String,
}

/// Permission payload: scope -> role scope -> grants.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct PermissionPayload(pub BTreeMap<String, BTreeMap<String, Vec<RawGrant>>>);

impl PermissionPayload {
    /// Flatten every scope into one set, validating codes against the taxonomy.
    ///
    /// Grants with unknown codes are dropped. When a functionality appears in
    /// several scopes the first scope in key order wins.
    #[must_use]
    pub fn into_set(self) -> PermissionSet {
        self.0
            .into_iter()
            .flat_map(|(scope, roles)| {
                roles
                    .into_values()
                    .flatten()
                    .map(move |raw| (scope.clone(), raw))
            })
            .filter_map(|(scope, raw)| match Functionality::from_code(&raw.functionality_id) {
                Some(functionality) => Some(PermissionGrant {
                    functionality,
                    name: raw.functionality_name,
                    screen: raw.screen_id,
                }),
                None => {
                    tracing::debug!(
                        scope = %scope,
                        code = %raw.functionality_id,
                        "Skipping grant with unknown functionality code"
                    );
                    None
                }
            })
            .collect()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrNumber {
    String(String),
    Number(serde_json::Number),
}

impl From<StringOrNumber> for String {
    fn from(v: StringOrNumber) -> Self {
        match v {
            StringOrNumber::String(s) => s,
            StringOrNumber::Number(n) => n.to_string(),
        }
    }
}

fn code_string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    StringOrNumber::deserialize(d).map(Into::into)
}

fn optional_code_string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Option::<StringOrNumber>::deserialize(d).map(|v| v.map(Into::into).unwrap_or_default())
}
