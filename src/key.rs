//! Storage keys derived from usernames.
//!
//! Every record is stored under the sanitized form of its owner's username.
//! Sanitizing replaces each non-alphanumeric character with `_`, so the key
//! is always a safe single path component. Distinct usernames can sanitize
//! to the same key (`"a.b"` and `"a_b"`); such users share one record set.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Replaces every non-alphanumeric character of `username` with `_`.
///
/// Alphanumeric is Unicode-aware, so `"José"` is kept as is.
///
/// # Examples
///
/// ```
/// use profilestore::key::sanitize_username;
///
/// assert_eq!(sanitize_username("a.b"), "a_b");
/// assert_eq!(sanitize_username("../x"), "___x");
/// ```
#[must_use]
pub fn sanitize_username(username: &str) -> String {
    username
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect()
}

/// Sanitized username used as the storage key of a user's records.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserKey(String);

impl UserKey {
    /// Derives the key for `username`, rejecting empty usernames.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::EmptyUsername` if `username` is empty.
    pub fn parse(username: &str) -> Result<Self, ValidationError> {
        if username.is_empty() {
            return Err(ValidationError::EmptyUsername);
        }
        Ok(Self(sanitize_username(username)))
    }

    /// Derives the key for `username` without validation.
    ///
    /// Intended for usernames already known to be non-empty, such as those
    /// read back from stored records.
    #[must_use]
    pub fn from_username(username: &str) -> Self {
        Self(sanitize_username(username))
    }

    /// Wraps a key that was read back from the backing medium.
    ///
    /// Returns `None` unless `raw` is non-empty and already sanitized.
    #[must_use]
    pub fn from_stored(raw: &str) -> Option<Self> {
        if raw.is_empty() || raw.chars().any(|c| !c.is_alphanumeric() && c != '_') {
            return None;
        }
        Some(Self(raw.to_string()))
    }

    /// Returns the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the key, returning the inner string.
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for UserKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for UserKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
