//! Persisted recommendation output.
//!
//! Recommendation ids are local wall-clock timestamps at second granularity.
//! They are not unique: two saves for the same user within one second share
//! an id and the later save replaces the earlier record.

use std::fmt;
use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::attributes::{strip_reserved, Attributes};
use crate::error::ValidationError;
use crate::time::recommendation_stamp;

/// Keys owned by the store on a recommendation document.
pub const RECOMMENDATION_RESERVED_KEYS: [&str; 3] = ["id", "created_at", "username"];

static ID_PATTERN: OnceLock<Option<Regex>> = OnceLock::new();

fn is_valid_id(raw: &str) -> bool {
    ID_PATTERN
        .get_or_init(|| Regex::new(r"^[0-9]{8}-[0-9]{6}$").ok())
        .as_ref()
        .is_some_and(|re| re.is_match(raw))
}

/// Identifier of a recommendation within one user's namespace.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecommendationId(String);

impl RecommendationId {
    /// Id for a recommendation created at `at`.
    #[must_use]
    pub fn at(at: DateTime<Utc>) -> Self {
        Self(recommendation_stamp(at))
    }

    /// Parses an id supplied by a caller.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRecommendationId` unless `raw` is `YYYYMMDD-HHMMSS`.
    ///
    /// # Examples
    ///
    /// ```
    /// use profilestore::RecommendationId;
    ///
    /// assert!(RecommendationId::parse("20240301-120000").is_ok());
    /// assert!(RecommendationId::parse("../20240301-120000").is_err());
    /// ```
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        if is_valid_id(raw) {
            Ok(Self(raw.to_string()))
        } else {
            Err(ValidationError::InvalidRecommendationId { id: raw.to_string() })
        }
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecommendationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One stored recommendation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    /// Identifier within the owner's namespace.
    pub id: RecommendationId,

    /// Creation time, seconds since the Unix epoch.
    #[serde(default)]
    pub created_at: f64,

    /// Owner's username as given to the store (empty on legacy records).
    #[serde(default)]
    pub username: String,

    /// Recommendation payload.
    #[serde(flatten)]
    pub attributes: Attributes,
}

impl Recommendation {
    /// Builds a recommendation for `username` created at `at`.
    #[must_use]
    pub fn new(username: &str, mut data: Attributes, at: DateTime<Utc>, created_at: f64) -> Self {
        strip_reserved(&mut data, &RECOMMENDATION_RESERVED_KEYS);
        Self {
            id: RecommendationId::at(at),
            created_at,
            username: username.to_string(),
            attributes: data,
        }
    }

    /// Returns a payload field by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }
}

/// Orders recommendations newest first, ties broken by id (descending).
pub(crate) fn sort_newest_first(recs: &mut [Recommendation]) {
    recs.sort_by(|a, b| {
        b.created_at
            .total_cmp(&a.created_at)
            .then_with(|| b.id.cmp(&a.id))
    });
}
