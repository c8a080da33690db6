//! Abstract storage traits for profilestore.
//!
//! These traits define the contract a backing medium must implement.
//! By using traits, we enable:
//! - JSON-file backends for durable storage
//! - In-memory backends for tests and embedded use
//! - A database backend later, without touching callers
//!
//! Every method takes a sanitized [`UserKey`]; raw usernames never reach a
//! backend.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::key::UserKey;
use crate::preferences::Preferences;
use crate::profile::Profile;
use crate::recommendation::{Recommendation, RecommendationId};

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Profile not found.
    #[error("Profile not found: {0}")]
    ProfileNotFound(UserKey),

    /// Recommendation not found.
    #[error("Recommendation {id} not found for {user}")]
    RecommendationNotFound {
        /// Owner key.
        user: UserKey,
        /// Missing recommendation.
        id: RecommendationId,
    },

    /// Key already exists.
    #[error("Duplicate key: {0}")]
    DuplicateKey(String),

    /// File-system failure.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// Path being accessed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },

    /// Serialization failed.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Backend error.
    #[error("Storage backend error: {0}")]
    BackendError(String),
}

impl StorageError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Storage trait for profiles.
pub trait ProfileBackend: Send + Sync {
    /// Insert a new profile. Returns `DuplicateKey` if one exists for `key`.
    fn insert(&self, key: &UserKey, profile: &Profile) -> Result<(), StorageError>;

    /// Get a profile by key.
    fn get(&self, key: &UserKey) -> Result<Option<Profile>, StorageError>;

    /// Overwrite an existing profile. Returns `ProfileNotFound` if absent.
    fn put(&self, key: &UserKey, profile: &Profile) -> Result<(), StorageError>;

    /// Delete a profile. Returns `ProfileNotFound` if absent.
    fn delete(&self, key: &UserKey) -> Result<(), StorageError>;

    /// Keys of all stored profiles, in no particular order.
    fn keys(&self) -> Result<Vec<UserKey>, StorageError>;

    /// All readable profiles, in no particular order.
    fn scan(&self) -> Result<Vec<Profile>, StorageError>;
}

/// Storage trait for preferences.
pub trait PreferenceBackend: Send + Sync {
    /// Get a user's preferences.
    fn get(&self, key: &UserKey) -> Result<Option<Preferences>, StorageError>;

    /// Create or replace a user's preferences.
    fn put(&self, key: &UserKey, preferences: &Preferences) -> Result<(), StorageError>;

    /// Delete a user's preferences. Returns whether a record existed.
    fn delete(&self, key: &UserKey) -> Result<bool, StorageError>;
}

/// Storage trait for recommendations, namespaced per user.
pub trait RecommendationBackend: Send + Sync {
    /// Create or replace a recommendation under `key`.
    fn put(&self, key: &UserKey, recommendation: &Recommendation) -> Result<(), StorageError>;

    /// Get one recommendation.
    fn get(
        &self,
        key: &UserKey,
        id: &RecommendationId,
    ) -> Result<Option<Recommendation>, StorageError>;

    /// All readable recommendations of a user, in no particular order.
    fn list(&self, key: &UserKey) -> Result<Vec<Recommendation>, StorageError>;

    /// Delete one recommendation. Returns `RecommendationNotFound` if absent.
    fn delete(&self, key: &UserKey, id: &RecommendationId) -> Result<(), StorageError>;

    /// Delete every recommendation of a user. Returns how many were removed.
    fn delete_all(&self, key: &UserKey) -> Result<usize, StorageError>;

    /// Number of stored recommendations across all users.
    fn count(&self) -> Result<usize, StorageError>;
}

/// Storage trait for per-user feedback records.
///
/// Feedback is written by other tools sharing the data directory. The store
/// never reads it; it only removes it together with the user's profile.
pub trait FeedbackBackend: Send + Sync {
    /// Delete every feedback record of a user. Returns how many were removed.
    fn delete_all(&self, key: &UserKey) -> Result<usize, StorageError>;
}
