//! The acting user of a dashboard.
//!
//! A [`CurrentUser`] is resolved once, at startup, and handed to every
//! controller that needs it. Controllers never look the user up on their
//! own; without a session they cannot be constructed at all.

use std::path::{Path, PathBuf};

use mapfood_core::{RoleName, UserId};
use serde::Deserialize;
use thiserror::Error;

/// No usable session record was found.
#[derive(Debug, Error)]
pub enum MissingSessionError {
    #[error("no session record at {}", .0.display())]
    NotFound(PathBuf),

    #[error("cannot read session record {}: {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("session record {} is not valid JSON: {source}", path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("session record has no user")]
    NoUser,

    #[error("session user has no id")]
    NoUserId,
}

/// The signed-in user, as far as the dashboards are concerned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: UserId,
    pub role: Option<RoleName>,
}

impl CurrentUser {
    #[must_use]
    pub fn new(id: impl Into<UserId>, role: Option<RoleName>) -> Self {
        Self {
            id: id.into(),
            role,
        }
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Some(RoleName::Admin)
    }
}

/// Persisted session record, `{"user": {"_id": ..., "role": ...}}`.
#[derive(Debug, Deserialize)]
struct SessionRecord {
    user: Option<StoredUser>,
}

#[derive(Debug, Deserialize)]
struct StoredUser {
    #[serde(rename = "_id")]
    id: Option<String>,
    #[serde(default)]
    role: Option<StoredRole>,
    #[serde(default)]
    role_id: Option<StoredRole>,
}

/// Role as stored by the login page: a bare name or a populated reference.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StoredRole {
    Name(String),
    Populated { name: Option<String> },
}

impl StoredRole {
    fn name(&self) -> Option<RoleName> {
        match self {
            Self::Name(name) => name.parse().ok(),
            Self::Populated { name } => name.as_deref().and_then(|n| n.parse().ok()),
        }
    }
}

/// Loader for the persisted session record.
pub struct SessionFile;

impl SessionFile {
    /// Read the acting user from `path`.
    ///
    /// # Errors
    ///
    /// Returns `MissingSessionError` when the file is absent or unreadable,
    /// is not JSON, or lacks a user with an id.
    pub fn load(path: &Path) -> Result<CurrentUser, MissingSessionError> {
        let raw = std::fs::read(path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                MissingSessionError::NotFound(path.to_path_buf())
            } else {
                MissingSessionError::Unreadable {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;

        let record: SessionRecord =
            serde_json::from_slice(&raw).map_err(|source| MissingSessionError::Malformed {
                path: path.to_path_buf(),
                source,
            })?;

        Self::resolve(record)
    }

    /// Parse a session record held in memory.
    ///
    /// # Errors
    ///
    /// Same as [`SessionFile::load`], minus the I/O cases.
    pub fn parse(json: &str) -> Result<CurrentUser, MissingSessionError> {
        let record: SessionRecord =
            serde_json::from_str(json).map_err(|source| MissingSessionError::Malformed {
                path: PathBuf::from("<memory>"),
                source,
            })?;
        Self::resolve(record)
    }

    fn resolve(record: SessionRecord) -> Result<CurrentUser, MissingSessionError> {
        let user = record.user.ok_or(MissingSessionError::NoUser)?;
        let id = user
            .id
            .filter(|id| !id.trim().is_empty())
            .ok_or(MissingSessionError::NoUserId)?;
        let role = user
            .role
            .as_ref()
            .or(user.role_id.as_ref())
            .and_then(StoredRole::name);

        Ok(CurrentUser::new(id, role))
    }
}
