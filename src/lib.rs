//! # profilestore - Durable user data for a learning-path recommender
//!
//! profilestore keeps three kinds of per-user records for a recommendation
//! UI: the user's profile, their learning preferences, and a history of
//! generated recommendations. Records are JSON documents with a few
//! store-managed fields and arbitrary caller-defined attributes.
//!
//! ## Core Concepts
//!
//! - **Profile**: one per user, created explicitly, keyed by the sanitized username
//! - **Preferences**: one per user, replaced or merged on save
//! - **Recommendation**: many per user, identified by a second-resolution timestamp id
//! - **Backend**: where records live; JSON files on disk or memory
//!
//! ## Usage
//!
//! ```rust,no_run
//! use profilestore::{ProfileStore, StoreConfig};
//! use serde_json::json;
//!
//! let store = ProfileStore::open(StoreConfig::new("./data"))?;
//!
//! let data = json!({"username": "alice", "education_level": "Undergraduate"});
//! store.create_profile(data.as_object().cloned().unwrap_or_default());
//!
//! let rec = json!({"topic": "Linear Algebra", "resources": ["Videos"]});
//! let id = store.save_recommendation("alice", rec.as_object().cloned().unwrap_or_default());
//! assert!(id.is_some());
//! # Ok::<(), profilestore::StoreError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Records and keys
pub mod attributes;
pub mod error;
pub mod key;
pub mod preferences;
pub mod profile;
pub mod recommendation;
pub mod time;

// Storage and the facade
pub mod cascade;
pub mod storage;
pub mod store;

// Aggregates
pub mod analytics;

pub use analytics::{RecommendationImpact, Statistics, SubjectCount, TopicAnalytics};
pub use attributes::{matches_criteria, Attributes};
pub use cascade::{CascadeReport, CascadeStep, CascadeTarget, StepOutcome};
pub use error::{StoreError, StoreResult, ValidationError};
pub use key::{sanitize_username, UserKey};
pub use preferences::Preferences;
pub use profile::Profile;
pub use recommendation::{Recommendation, RecommendationId};
pub use time::{Clock, ManualClock, SystemClock};

pub use storage::{
    FeedbackBackend, FileStores, PreferenceBackend, ProfileBackend, RecommendationBackend,
    StorageError, StoreConfig,
};
pub use store::ProfileStore;
