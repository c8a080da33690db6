//! Student profiles.
//!
//! A profile is the durable identity record of one user: the username it was
//! created with, creation and last-update timestamps, and whatever attributes
//! the caller supplied.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::attributes::{merge_into, strip_reserved, Attributes};
use crate::error::ValidationError;
use crate::key::UserKey;
use crate::time::next_update_stamp;

/// Keys owned by the store on a profile document.
pub const PROFILE_RESERVED_KEYS: [&str; 3] = ["username", "created_at", "updated_at"];

/// A stored profile.
///
/// On disk the system fields and the attributes share one flat JSON object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    /// Username the profile was created with (unsanitized).
    pub username: String,

    /// Creation time, seconds since the Unix epoch.
    #[serde(default)]
    pub created_at: f64,

    /// Last modification time, seconds since the Unix epoch.
    #[serde(default)]
    pub updated_at: f64,

    /// Caller-defined fields.
    #[serde(flatten)]
    pub attributes: Attributes,
}

impl Profile {
    /// Builds a new profile from caller input stamped at `now`.
    ///
    /// `data` must hold a non-empty string `username`. Caller-supplied
    /// timestamps are discarded.
    ///
    /// # Errors
    ///
    /// - `MissingField` if `username` is absent
    /// - `InvalidFieldType` if `username` is not a string
    /// - `EmptyUsername` if `username` is empty
    pub fn from_input(mut data: Attributes, now: f64) -> Result<Self, ValidationError> {
        let username = match data.get("username") {
            None => {
                return Err(ValidationError::MissingField {
                    field: "username".to_string(),
                })
            }
            Some(Value::String(s)) if s.is_empty() => return Err(ValidationError::EmptyUsername),
            Some(Value::String(s)) => s.clone(),
            Some(_) => {
                return Err(ValidationError::InvalidFieldType {
                    field: "username".to_string(),
                    expected: "a string",
                })
            }
        };

        strip_reserved(&mut data, &PROFILE_RESERVED_KEYS);
        Ok(Self {
            username,
            created_at: now,
            updated_at: now,
            attributes: data,
        })
    }

    /// Storage key of this profile.
    #[must_use]
    pub fn key(&self) -> UserKey {
        UserKey::from_username(&self.username)
    }

    /// Merges `patch` into the attributes and refreshes `updated_at`.
    ///
    /// Reserved keys in `patch` are ignored.
    pub fn apply_patch(&mut self, patch: Attributes, now: f64) {
        merge_into(&mut self.attributes, patch, &PROFILE_RESERVED_KEYS);
        self.updated_at = next_update_stamp(now, Some(self.updated_at));
    }

    /// String-valued attribute, if present.
    #[must_use]
    pub fn str_attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).and_then(Value::as_str)
    }

    /// The full flat document, as persisted.
    #[must_use]
    pub fn to_document(&self) -> Attributes {
        let mut doc = self.attributes.clone();
        doc.insert("username".to_string(), Value::String(self.username.clone()));
        doc.insert("created_at".to_string(), Value::from(self.created_at));
        doc.insert("updated_at".to_string(), Value::from(self.updated_at));
        doc
    }
}
