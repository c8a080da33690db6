//! Path derivation for the record tree.
//!
//! All knowledge of where a record lives on disk is kept here.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::key::UserKey;
use crate::recommendation::RecommendationId;

const PROFILES_DIR: &str = "profiles";
const PREFERENCES_DIR: &str = "preferences";
const RECOMMENDATIONS_DIR: &str = "recommendations";
const FEEDBACK_DIR: &str = "feedback";

/// Record file extension.
pub(crate) const RECORD_EXT: &str = "json";

/// Directory layout of a JSON-file store.
#[derive(Debug, Clone)]
pub struct Layout {
    base: PathBuf,
}

impl Layout {
    /// Layout rooted at `base`.
    #[must_use]
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    /// Creates the per-kind directories. Idempotent.
    ///
    /// # Errors
    ///
    /// Propagates the first directory that cannot be created.
    pub fn ensure_dirs(&self) -> io::Result<()> {
        for dir in [self.profiles_dir(), self.preferences_dir(), self.recommendations_dir()] {
            fs::create_dir_all(dir)?;
        }
        Ok(())
    }

    /// Root of the tree.
    #[must_use]
    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Directory holding one file per profile.
    #[must_use]
    pub fn profiles_dir(&self) -> PathBuf {
        self.base.join(PROFILES_DIR)
    }

    /// Directory holding one file per preferences record.
    #[must_use]
    pub fn preferences_dir(&self) -> PathBuf {
        self.base.join(PREFERENCES_DIR)
    }

    /// Directory holding one sub-directory per user with recommendations.
    #[must_use]
    pub fn recommendations_dir(&self) -> PathBuf {
        self.base.join(RECOMMENDATIONS_DIR)
    }

    /// Directory holding one sub-directory per user with feedback.
    ///
    /// Not created by [`ensure_dirs`](Self::ensure_dirs); only other tools
    /// write feedback.
    #[must_use]
    pub fn feedback_dir(&self) -> PathBuf {
        self.base.join(FEEDBACK_DIR)
    }

    /// File of `key`'s profile.
    #[must_use]
    pub fn profile_path(&self, key: &UserKey) -> PathBuf {
        record_file(&self.profiles_dir(), key.as_str())
    }

    /// File of `key`'s preferences.
    #[must_use]
    pub fn preferences_path(&self, key: &UserKey) -> PathBuf {
        record_file(&self.preferences_dir(), key.as_str())
    }

    /// Directory of `key`'s recommendations.
    #[must_use]
    pub fn user_recommendations_dir(&self, key: &UserKey) -> PathBuf {
        self.recommendations_dir().join(key.as_str())
    }

    /// Directory of `key`'s feedback.
    #[must_use]
    pub fn user_feedback_dir(&self, key: &UserKey) -> PathBuf {
        self.feedback_dir().join(key.as_str())
    }

    /// File of one recommendation.
    #[must_use]
    pub fn recommendation_path(&self, key: &UserKey, id: &RecommendationId) -> PathBuf {
        record_file(&self.user_recommendations_dir(key), id.as_str())
    }
}

fn record_file(dir: &Path, stem: &str) -> PathBuf {
    dir.join(format!("{stem}.{RECORD_EXT}"))
}
