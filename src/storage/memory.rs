//! In-memory storage backend.
//!
//! This module provides thread-safe in-memory implementations of the storage traits.
//! It is intended for embedded usage, tests, and as a reference implementation.

use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use crate::key::UserKey;
use crate::preferences::Preferences;
use crate::profile::Profile;
use crate::recommendation::{Recommendation, RecommendationId};
use crate::storage::traits::{
    PreferenceBackend, ProfileBackend, RecommendationBackend, StorageError,
};

fn lock_err(context: &'static str) -> StorageError {
    StorageError::BackendError(format!("poisoned lock: {context}"))
}

/// Thread-safe in-memory profile store.
#[derive(Debug, Default)]
pub struct InMemoryProfileStore {
    by_key: RwLock<HashMap<UserKey, Profile>>,
}

impl InMemoryProfileStore {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProfileBackend for InMemoryProfileStore {
    fn insert(&self, key: &UserKey, profile: &Profile) -> Result<(), StorageError> {
        let mut by_key = self.by_key.write().map_err(|_| lock_err("profile.insert"))?;
        if by_key.contains_key(key) {
            return Err(StorageError::DuplicateKey(key.to_string()));
        }
        by_key.insert(key.clone(), profile.clone());
        Ok(())
    }

    fn get(&self, key: &UserKey) -> Result<Option<Profile>, StorageError> {
        let by_key = self.by_key.read().map_err(|_| lock_err("profile.get"))?;
        Ok(by_key.get(key).cloned())
    }

    fn put(&self, key: &UserKey, profile: &Profile) -> Result<(), StorageError> {
        let mut by_key = self.by_key.write().map_err(|_| lock_err("profile.put"))?;
        let slot = by_key
            .get_mut(key)
            .ok_or_else(|| StorageError::ProfileNotFound(key.clone()))?;
        *slot = profile.clone();
        Ok(())
    }

    fn delete(&self, key: &UserKey) -> Result<(), StorageError> {
        let mut by_key = self.by_key.write().map_err(|_| lock_err("profile.delete"))?;
        by_key
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| StorageError::ProfileNotFound(key.clone()))
    }

    fn keys(&self) -> Result<Vec<UserKey>, StorageError> {
        let by_key = self.by_key.read().map_err(|_| lock_err("profile.keys"))?;
        Ok(by_key.keys().cloned().collect())
    }

    fn scan(&self) -> Result<Vec<Profile>, StorageError> {
        let by_key = self.by_key.read().map_err(|_| lock_err("profile.scan"))?;
        Ok(by_key.values().cloned().collect())
    }
}

/// Thread-safe in-memory preference store.
#[derive(Debug, Default)]
pub struct InMemoryPreferenceStore {
    by_key: RwLock<HashMap<UserKey, Preferences>>,
}

impl InMemoryPreferenceStore {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceBackend for InMemoryPreferenceStore {
    fn get(&self, key: &UserKey) -> Result<Option<Preferences>, StorageError> {
        let by_key = self.by_key.read().map_err(|_| lock_err("preferences.get"))?;
        Ok(by_key.get(key).cloned())
    }

    fn put(&self, key: &UserKey, preferences: &Preferences) -> Result<(), StorageError> {
        let mut by_key = self.by_key.write().map_err(|_| lock_err("preferences.put"))?;
        by_key.insert(key.clone(), preferences.clone());
        Ok(())
    }

    fn delete(&self, key: &UserKey) -> Result<bool, StorageError> {
        let mut by_key = self.by_key.write().map_err(|_| lock_err("preferences.delete"))?;
        Ok(by_key.remove(key).is_some())
    }
}

/// Thread-safe in-memory recommendation store.
#[derive(Debug, Default)]
pub struct InMemoryRecommendationStore {
    by_user: RwLock<HashMap<UserKey, BTreeMap<RecommendationId, Recommendation>>>,
}

impl InMemoryRecommendationStore {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecommendationBackend for InMemoryRecommendationStore {
    fn put(&self, key: &UserKey, recommendation: &Recommendation) -> Result<(), StorageError> {
        let mut by_user = self.by_user.write().map_err(|_| lock_err("recommendation.put"))?;
        by_user
            .entry(key.clone())
            .or_default()
            .insert(recommendation.id.clone(), recommendation.clone());
        Ok(())
    }

    fn get(
        &self,
        key: &UserKey,
        id: &RecommendationId,
    ) -> Result<Option<Recommendation>, StorageError> {
        let by_user = self.by_user.read().map_err(|_| lock_err("recommendation.get"))?;
        Ok(by_user.get(key).and_then(|recs| recs.get(id)).cloned())
    }

    fn list(&self, key: &UserKey) -> Result<Vec<Recommendation>, StorageError> {
        let by_user = self.by_user.read().map_err(|_| lock_err("recommendation.list"))?;
        Ok(by_user
            .get(key)
            .map(|recs| recs.values().cloned().collect())
            .unwrap_or_default())
    }

    fn delete(&self, key: &UserKey, id: &RecommendationId) -> Result<(), StorageError> {
        let mut by_user = self.by_user.write().map_err(|_| lock_err("recommendation.delete"))?;
        let removed = by_user.get_mut(key).and_then(|recs| recs.remove(id));
        if removed.is_none() {
            return Err(StorageError::RecommendationNotFound {
                user: key.clone(),
                id: id.clone(),
            });
        }
        if by_user.get(key).is_some_and(BTreeMap::is_empty) {
            by_user.remove(key);
        }
        Ok(())
    }

    fn delete_all(&self, key: &UserKey) -> Result<usize, StorageError> {
        let mut by_user = self
            .by_user
            .write()
            .map_err(|_| lock_err("recommendation.delete_all"))?;
        Ok(by_user.remove(key).map_or(0, |recs| recs.len()))
    }

    fn count(&self) -> Result<usize, StorageError> {
        let by_user = self.by_user.read().map_err(|_| lock_err("recommendation.count"))?;
        Ok(by_user.values().map(BTreeMap::len).sum())
    }
}
