//! JSON-file store implementations.
//!
//! Each store shares one [`Layout`] and re-reads the file system on every
//! call. Scans skip records that fail to parse and log them at warn level.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::codec::{self, WriteOptions};
use super::layout::Layout;
use super::StoreConfig;
use crate::error::StoreError;
use crate::key::UserKey;
use crate::preferences::Preferences;
use crate::profile::Profile;
use crate::recommendation::{Recommendation, RecommendationId};
use crate::storage::traits::{
    FeedbackBackend, PreferenceBackend, ProfileBackend, RecommendationBackend, StorageError,
};

/// Reads every record file under `dir`, skipping unreadable ones.
fn scan_dir<T: DeserializeOwned>(dir: &Path) -> Result<Vec<T>, StorageError> {
    let mut out = Vec::new();
    for (_, path) in codec::record_entries(dir)? {
        match codec::read_record(&path) {
            Ok(Some(record)) => out.push(record),
            // Removed between listing and reading.
            Ok(None) => {}
            Err(error) => warn!(path = %path.display(), %error, "skipping unreadable record"),
        }
    }
    Ok(out)
}

/// Removes a per-user record directory, returning how many records it held.
fn remove_user_dir(dir: &Path) -> Result<usize, StorageError> {
    let count = codec::record_entries(dir)?.len();
    match fs::remove_dir_all(dir) {
        Ok(()) => Ok(count),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(0),
        Err(e) => Err(StorageError::io(dir, e)),
    }
}

/// Aggregate type containing all JSON-file stores.
///
/// This is the primary entry point for file-backed storage.
#[derive(Debug, Clone)]
pub struct FileStores {
    /// The data directory.
    pub dir: PathBuf,
    /// Profile records.
    pub profiles: FileProfileStore,
    /// Preference records.
    pub preferences: FilePreferenceStore,
    /// Recommendation records.
    pub recommendations: FileRecommendationStore,
    /// Feedback left by other tools.
    pub feedback: FileFeedbackStore,
}

impl FileStores {
    /// Open or create a record tree at `config.base_dir`.
    ///
    /// # Errors
    /// - `Validation` if the configuration is invalid
    /// - `Storage` if the directories cannot be created
    pub fn open(config: StoreConfig) -> Result<Self, StoreError> {
        let config = config.validate()?;
        let layout = Arc::new(Layout::new(config.base_dir.clone()));
        layout
            .ensure_dirs()
            .map_err(|e| StorageError::io(layout.base(), e))?;
        debug!(dir = %layout.base().display(), "data directories initialized");

        let options = WriteOptions {
            sync_on_write: config.sync_on_write,
            pretty: config.pretty,
        };
        Ok(Self {
            dir: config.base_dir,
            profiles: FileProfileStore {
                layout: Arc::clone(&layout),
                options,
            },
            preferences: FilePreferenceStore {
                layout: Arc::clone(&layout),
                options,
            },
            recommendations: FileRecommendationStore {
                layout: Arc::clone(&layout),
                options,
            },
            feedback: FileFeedbackStore { layout },
        })
    }
}

/// Profiles stored as `profiles/<key>.json`.
#[derive(Debug, Clone)]
pub struct FileProfileStore {
    layout: Arc<Layout>,
    options: WriteOptions,
}

impl ProfileBackend for FileProfileStore {
    fn insert(&self, key: &UserKey, profile: &Profile) -> Result<(), StorageError> {
        let path = self.layout.profile_path(key);
        if codec::exists(&path)? {
            return Err(StorageError::DuplicateKey(key.to_string()));
        }
        codec::write_record(&path, profile, self.options)
    }

    fn get(&self, key: &UserKey) -> Result<Option<Profile>, StorageError> {
        codec::read_record(&self.layout.profile_path(key))
    }

    fn put(&self, key: &UserKey, profile: &Profile) -> Result<(), StorageError> {
        let path = self.layout.profile_path(key);
        if !codec::exists(&path)? {
            return Err(StorageError::ProfileNotFound(key.clone()));
        }
        codec::write_record(&path, profile, self.options)
    }

    fn delete(&self, key: &UserKey) -> Result<(), StorageError> {
        if codec::remove_record(&self.layout.profile_path(key))? {
            Ok(())
        } else {
            Err(StorageError::ProfileNotFound(key.clone()))
        }
    }

    fn keys(&self) -> Result<Vec<UserKey>, StorageError> {
        let entries = codec::record_entries(&self.layout.profiles_dir())?;
        Ok(entries
            .into_iter()
            .filter_map(|(stem, path)| {
                let key = UserKey::from_stored(&stem);
                if key.is_none() {
                    debug!(path = %path.display(), "ignoring profile file with unsanitized name");
                }
                key
            })
            .collect())
    }

    fn scan(&self) -> Result<Vec<Profile>, StorageError> {
        scan_dir(&self.layout.profiles_dir())
    }
}

/// Preferences stored as `preferences/<key>.json`.
#[derive(Debug, Clone)]
pub struct FilePreferenceStore {
    layout: Arc<Layout>,
    options: WriteOptions,
}

impl PreferenceBackend for FilePreferenceStore {
    fn get(&self, key: &UserKey) -> Result<Option<Preferences>, StorageError> {
        codec::read_record(&self.layout.preferences_path(key))
    }

    fn put(&self, key: &UserKey, preferences: &Preferences) -> Result<(), StorageError> {
        codec::write_record(&self.layout.preferences_path(key), preferences, self.options)
    }

    fn delete(&self, key: &UserKey) -> Result<bool, StorageError> {
        codec::remove_record(&self.layout.preferences_path(key))
    }
}

/// Recommendations stored as `recommendations/<key>/<id>.json`.
#[derive(Debug, Clone)]
pub struct FileRecommendationStore {
    layout: Arc<Layout>,
    options: WriteOptions,
}

impl RecommendationBackend for FileRecommendationStore {
    fn put(&self, key: &UserKey, recommendation: &Recommendation) -> Result<(), StorageError> {
        let dir = self.layout.user_recommendations_dir(key);
        fs::create_dir_all(&dir).map_err(|e| StorageError::io(&dir, e))?;
        codec::write_record(
            &self.layout.recommendation_path(key, &recommendation.id),
            recommendation,
            self.options,
        )
    }

    fn get(
        &self,
        key: &UserKey,
        id: &RecommendationId,
    ) -> Result<Option<Recommendation>, StorageError> {
        codec::read_record(&self.layout.recommendation_path(key, id))
    }

    fn list(&self, key: &UserKey) -> Result<Vec<Recommendation>, StorageError> {
        scan_dir(&self.layout.user_recommendations_dir(key))
    }

    fn delete(&self, key: &UserKey, id: &RecommendationId) -> Result<(), StorageError> {
        if codec::remove_record(&self.layout.recommendation_path(key, id))? {
            Ok(())
        } else {
            Err(StorageError::RecommendationNotFound {
                user: key.clone(),
                id: id.clone(),
            })
        }
    }

    fn delete_all(&self, key: &UserKey) -> Result<usize, StorageError> {
        remove_user_dir(&self.layout.user_recommendations_dir(key))
    }

    fn count(&self) -> Result<usize, StorageError> {
        let mut total = 0;
        for (_, dir) in codec::subdirectories(&self.layout.recommendations_dir())? {
            total += codec::record_entries(&dir)?.len();
        }
        Ok(total)
    }
}

/// Feedback under `feedback/<key>/`, removed together with the user.
#[derive(Debug, Clone)]
pub struct FileFeedbackStore {
    layout: Arc<Layout>,
}

impl FeedbackBackend for FileFeedbackStore {
    fn delete_all(&self, key: &UserKey) -> Result<usize, StorageError> {
        remove_user_dir(&self.layout.user_feedback_dir(key))
    }
}
