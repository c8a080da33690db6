//! Error types for profilestore.
//!
//! Errors are strongly typed using thiserror so callers of the `try_*`
//! operations can match on the failure kind. The non-throwing operations on
//! [`ProfileStore`](crate::ProfileStore) log these errors and hand back a
//! falsy value instead.

use thiserror::Error;

use crate::storage::StorageError;

/// Validation errors raised before anything touches the backing medium.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required input field is absent.
    #[error("Required field '{field}' is missing")]
    MissingField {
        /// Name of the missing field.
        field: String,
    },

    /// An input field has the wrong JSON type.
    #[error("Field '{field}' must be {expected}")]
    InvalidFieldType {
        /// Name of the offending field.
        field: String,
        /// Description of the accepted type.
        expected: &'static str,
    },

    /// The username is the empty string.
    #[error("Username cannot be empty")]
    EmptyUsername,

    /// A recommendation id is not of the form `YYYYMMDD-HHMMSS`.
    #[error("Invalid recommendation id '{id}': expected YYYYMMDD-HHMMSS")]
    InvalidRecommendationId {
        /// The rejected id.
        id: String,
    },

    /// The store configuration cannot be used.
    #[error("Invalid configuration: {reason}")]
    InvalidConfig {
        /// Why the configuration was rejected.
        reason: String,
    },
}

/// Top-level error type for profilestore.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Input rejected before any I/O.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// The backend failed or the addressed record is in the wrong state.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl StoreError {
    /// Returns true if the input was rejected before any I/O happened.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Returns true if the addressed record does not exist.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::Storage(
                StorageError::ProfileNotFound(_) | StorageError::RecommendationNotFound { .. }
            )
        )
    }

    /// Returns true if a create collided with an existing record.
    #[must_use]
    pub const fn is_duplicate(&self) -> bool {
        matches!(self, Self::Storage(StorageError::DuplicateKey(_)))
    }

    /// Returns true if the backing medium failed (I/O or encoding).
    #[must_use]
    pub const fn is_io(&self) -> bool {
        matches!(
            self,
            Self::Storage(
                StorageError::Io { .. }
                    | StorageError::SerializationError(_)
                    | StorageError::BackendError(_)
            )
        )
    }
}

/// Result type alias for profilestore operations.
pub type StoreResult<T> = Result<T, StoreError>;
