//! Session Store: the single source of truth for who is logged in.
//!
//! The session is persisted as one serialized record in a [`SessionStorage`]
//! backend. Reads never fail: a missing, unreadable or malformed record is
//! reported as "no session".

use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::types::{AccountId, Credential, Role};

/// Authenticated identity plus bearer credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    #[serde(rename = "id")]
    pub account_id: AccountId,
    #[serde(rename = "name")]
    pub display_name: String,
    pub email: String,
    pub role: Role,
    #[serde(rename = "token")]
    pub credential: Credential,
}

impl Session {
    /// Decode a persisted record, rejecting records with blank fields.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decode`] if the record is not valid JSON, misses a
    /// field, or carries an empty one.
    pub fn decode(record: &str) -> Result<Self, Error> {
        let session: Self = serde_json::from_str(record)?;
        session.ensure_complete()?;
        Ok(session)
    }

    /// Serialize into the persisted record format.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decode`] if serialization fails.
    pub fn encode(&self) -> Result<String, Error> {
        serde_json::to_string(self).map_err(Into::into)
    }

    pub(crate) fn ensure_complete(&self) -> Result<(), Error> {
        let blank = [
            ("id", self.account_id.as_str()),
            ("name", self.display_name.as_str()),
            ("email", self.email.as_str()),
            ("token", self.credential.expose()),
        ]
        .into_iter()
        .find(|(_, v)| v.trim().is_empty());

        match blank {
            Some((field, _)) => Err(Error::Decode(format!("session field `{field}` is empty"))),
            None => Ok(()),
        }
    }
}

/// Backing store for the single persisted session record.
///
/// Implementations hold an opaque string; they do not interpret it.
pub trait SessionStorage: Send + Sync + 'static {
    /// Read the record, `None` if nothing is stored.
    fn read(&self) -> Result<Option<String>, Error>;

    /// Replace the record.
    fn write(&self, record: &str) -> Result<(), Error>;

    /// Remove the record. Removing an absent record is not an error.
    fn remove(&self) -> Result<(), Error>;
}

/// In-process storage. Lost on drop.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    record: Mutex<Option<String>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage pre-seeded with a raw record, valid or not.
    #[must_use]
    pub fn with_record(record: impl Into<String>) -> Self {
        Self {
            record: Mutex::new(Some(record.into())),
        }
    }
}

impl SessionStorage for MemoryStorage {
    fn read(&self) -> Result<Option<String>, Error> {
        Ok(self
            .record
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn write(&self, record: &str) -> Result<(), Error> {
        *self.record.lock().unwrap_or_else(PoisonError::into_inner) = Some(record.to_owned());
        Ok(())
    }

    fn remove(&self) -> Result<(), Error> {
        self.record
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        Ok(())
    }
}

/// Storage backed by a single JSON file.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl SessionStorage for FileStorage {
    fn read(&self) -> Result<Option<String>, Error> {
        match std::fs::read_to_string(&self.path) {
            Ok(s) => Ok(Some(s)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::Storage(format!("{}: {e}", self.path.display()))),
        }
    }

    fn write(&self, record: &str) -> Result<(), Error> {
        std::fs::write(&self.path, record)
            .map_err(|e| Error::Storage(format!("{}: {e}", self.path.display())))
    }

    fn remove(&self) -> Result<(), Error> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::Storage(format!("{}: {e}", self.path.display()))),
        }
    }
}

/// Session Store over an injected storage backend.
pub struct SessionStore<S> {
    storage: S,
}

impl<S: SessionStorage> SessionStore<S> {
    #[must_use]
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Current session, or `None` if absent, unreadable or malformed.
    #[must_use]
    pub fn load(&self) -> Option<Session> {
        let record = match self.storage.read() {
            Ok(Some(record)) => record,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(error = %e, "Session record unreadable, treating as logged out");
                return None;
            }
        };

        match Session::decode(&record) {
            Ok(session) => Some(session),
            Err(e) => {
                tracing::warn!(error = %e, "Malformed session record, treating as logged out");
                None
            }
        }
    }

    /// Persist `session`; subsequent [`load`](Self::load) calls observe it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decode`] for an incomplete session, or
    /// [`Error::Storage`] if the backend write fails.
    pub fn save(&self, session: &Session) -> Result<(), Error> {
        session.ensure_complete()?;
        self.storage.write(&session.encode()?)
    }

    /// Remove the persisted session.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Storage`] if the backend removal fails.
    pub fn clear(&self) -> Result<(), Error> {
        self.storage.remove()
    }

    #[must_use]
    pub fn is_logged_in(&self) -> bool {
        self.load().is_some()
    }

    #[must_use]
    pub fn storage(&self) -> &S {
        &self.storage
    }
}
