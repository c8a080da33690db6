//! Learning preferences.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::attributes::{merge_into, strip_reserved, Attributes};
use crate::time::next_update_stamp;

/// Keys owned by the store on a preferences document.
pub const PREFERENCES_RESERVED_KEYS: [&str; 1] = ["updated_at"];

/// A user's current learning-preference selections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preferences {
    /// Last write time, seconds since the Unix epoch.
    #[serde(default)]
    pub updated_at: f64,

    /// Caller-defined fields.
    #[serde(flatten)]
    pub attributes: Attributes,
}

impl Preferences {
    /// Builds a full replacement record stamped at `now`.
    #[must_use]
    pub fn new(mut data: Attributes, now: f64) -> Self {
        strip_reserved(&mut data, &PREFERENCES_RESERVED_KEYS);
        Self {
            updated_at: now,
            attributes: data,
        }
    }

    /// Merges `patch` into the attributes and refreshes `updated_at`.
    pub fn apply_patch(&mut self, patch: Attributes, now: f64) {
        merge_into(&mut self.attributes, patch, &PREFERENCES_RESERVED_KEYS);
        self.updated_at = next_update_stamp(now, Some(self.updated_at));
    }

    /// Returns an attribute by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }
}
