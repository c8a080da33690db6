//! The profile store facade.
//!
//! [`ProfileStore`] is what UI code talks to. Each operation comes in two
//! flavours:
//!
//! - `op(...)` never fails: errors are logged and turned into `false`,
//!   `None` or an empty collection.
//! - `try_op(...)` returns a [`StoreResult`] so the caller can tell
//!   not-found, duplicate, invalid input and I/O failures apart.
//!
//! The store keeps no state of its own besides its backends and clock;
//! every call goes to the backing medium.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::analytics::{self, RecommendationImpact, Statistics, TopicAnalytics};
use crate::attributes::{matches_criteria, Attributes};
use crate::cascade::{CascadeReport, CascadeTarget, StepOutcome};
use crate::error::{StoreError, StoreResult};
use crate::key::UserKey;
use crate::preferences::Preferences;
use crate::profile::Profile;
use crate::recommendation::{sort_newest_first, Recommendation, RecommendationId};
use crate::storage::{
    FeedbackBackend, FileStores, InMemoryPreferenceStore, InMemoryProfileStore,
    InMemoryRecommendationStore, PreferenceBackend, ProfileBackend, RecommendationBackend,
    StorageError, StoreConfig,
};
use crate::time::{epoch_seconds, Clock, SystemClock};

fn log_failure(op: &'static str, username: &str, err: &StoreError) {
    if err.is_io() {
        error!(op, username, error = %err, "operation failed");
    } else {
        warn!(op, username, error = %err, "operation rejected");
    }
}

fn logged<T>(op: &'static str, username: &str, result: StoreResult<T>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(err) => {
            log_failure(op, username, &err);
            None
        }
    }
}

fn bulk_outcome(
    username: &str,
    target: CascadeTarget,
    result: Result<usize, StorageError>,
) -> StepOutcome {
    match result {
        Ok(0) => StepOutcome::Absent,
        Ok(count) => StepOutcome::Removed { count },
        Err(err) => {
            error!(username, step = %target, error = %err, "cascade step failed");
            StepOutcome::Failed {
                error: err.to_string(),
            }
        }
    }
}

/// Durable CRUD for profiles, preferences and recommendations.
#[derive(Clone)]
pub struct ProfileStore {
    profiles: Arc<dyn ProfileBackend>,
    preferences: Arc<dyn PreferenceBackend>,
    recommendations: Arc<dyn RecommendationBackend>,
    feedback: Option<Arc<dyn FeedbackBackend>>,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for ProfileStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProfileStore")
            .field("feedback", &self.feedback.is_some())
            .finish_non_exhaustive()
    }
}

impl ProfileStore {
    /// Create a store over the given backends, using the system clock.
    pub fn new(
        profiles: Arc<dyn ProfileBackend>,
        preferences: Arc<dyn PreferenceBackend>,
        recommendations: Arc<dyn RecommendationBackend>,
    ) -> Self {
        Self {
            profiles,
            preferences,
            recommendations,
            feedback: None,
            clock: Arc::new(SystemClock),
        }
    }

    /// Open or create a JSON-file store at `config.base_dir`.
    ///
    /// # Errors
    /// - If the configuration is invalid
    /// - If the data directories cannot be created
    ///
    /// # Example
    /// ```rust,no_run
    /// use profilestore::{ProfileStore, StoreConfig};
    ///
    /// let store = ProfileStore::open(StoreConfig::new("./data"))?;
    /// let usernames = store.list_all_profiles();
    /// # Ok::<(), profilestore::StoreError>(())
    /// ```
    pub fn open(config: StoreConfig) -> StoreResult<Self> {
        let stores = FileStores::open(config)?;
        info!(dir = %stores.dir.display(), "opened profile store");
        Ok(Self::new(
            Arc::new(stores.profiles),
            Arc::new(stores.preferences),
            Arc::new(stores.recommendations),
        )
        .with_feedback(Arc::new(stores.feedback)))
    }

    /// Create an empty store held in memory.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(InMemoryProfileStore::new()),
            Arc::new(InMemoryPreferenceStore::new()),
            Arc::new(InMemoryRecommendationStore::new()),
        )
    }

    /// Replace the clock used for timestamps and recommendation ids.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Also remove the user's feedback records when a profile is deleted.
    #[must_use]
    pub fn with_feedback(mut self, feedback: Arc<dyn FeedbackBackend>) -> Self {
        self.feedback = Some(feedback);
        self
    }

    fn now(&self) -> (DateTime<Utc>, f64) {
        let at = self.clock.now();
        (at, epoch_seconds(at))
    }

    // ----- Profiles -----

    /// Create a new profile from `data`, which must hold a `username`.
    ///
    /// # Errors
    /// - `Validation` if `username` is missing, not a string or empty
    /// - `DuplicateKey` if a profile exists for the sanitized username
    /// - `Io` / `SerializationError` if the write fails
    pub fn try_create_profile(&self, data: Attributes) -> StoreResult<Profile> {
        let (_, now) = self.now();
        let profile = Profile::from_input(data, now)?;
        let key = UserKey::parse(&profile.username)?;
        self.profiles.insert(&key, &profile)?;
        info!(username = %profile.username, %key, "created profile");
        Ok(profile)
    }

    /// Create a new profile. Returns false if it exists or cannot be written.
    pub fn create_profile(&self, data: Attributes) -> bool {
        let username = data
            .get("username")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        logged("create_profile", &username, self.try_create_profile(data)).is_some()
    }

    /// Fetch a profile; `Ok(None)` if there is none.
    ///
    /// # Errors
    /// - `Validation` if `username` is empty
    /// - `Io` / `SerializationError` if the record cannot be read
    pub fn try_get_profile(&self, username: &str) -> StoreResult<Option<Profile>> {
        let key = UserKey::parse(username)?;
        Ok(self.profiles.get(&key)?)
    }

    /// Fetch a profile, or `None` if it is missing or unreadable.
    pub fn get_profile(&self, username: &str) -> Option<Profile> {
        match logged("get_profile", username, self.try_get_profile(username)) {
            Some(Some(profile)) => {
                debug!(username, "retrieved profile");
                Some(profile)
            }
            Some(None) => {
                warn!(username, "profile not found");
                None
            }
            None => None,
        }
    }

    /// Merge `patch` into an existing profile and refresh `updated_at`.
    ///
    /// Returns the updated profile.
    ///
    /// # Errors
    /// - `ProfileNotFound` if there is no profile
    /// - `Io` / `SerializationError` if the read or write fails
    pub fn try_update_profile(&self, username: &str, patch: Attributes) -> StoreResult<Profile> {
        let key = UserKey::parse(username)?;
        let mut profile = self
            .profiles
            .get(&key)?
            .ok_or_else(|| StorageError::ProfileNotFound(key.clone()))?;
        let (_, now) = self.now();
        profile.apply_patch(patch, now);
        self.profiles.put(&key, &profile)?;
        info!(username, "updated profile");
        Ok(profile)
    }

    /// Merge `patch` into an existing profile. Returns false if it is absent.
    pub fn update_profile(&self, username: &str, patch: Attributes) -> bool {
        logged("update_profile", username, self.try_update_profile(username, patch)).is_some()
    }

    /// Delete a profile and cascade to the user's preferences,
    /// recommendations and, if a feedback backend is attached, feedback.
    /// Stores from [`ProfileStore::open`] remove `feedback/<key>/`.
    ///
    /// Cascade steps after the profile are best effort: their failures are
    /// recorded in the returned report, not returned as an error, and earlier
    /// steps are not undone.
    ///
    /// # Errors
    /// - `ProfileNotFound` if there is no profile (nothing is removed)
    /// - `Io` if the profile record itself cannot be removed
    pub fn try_delete_profile(&self, username: &str) -> StoreResult<CascadeReport> {
        let key = UserKey::parse(username)?;
        self.profiles.delete(&key)?;

        let mut report = CascadeReport::new(username);
        report.record(CascadeTarget::Profile, StepOutcome::Removed { count: 1 });

        let outcome = match self.preferences.delete(&key) {
            Ok(true) => StepOutcome::Removed { count: 1 },
            Ok(false) => StepOutcome::Absent,
            Err(err) => {
                error!(username, error = %err, "failed to delete preferences");
                StepOutcome::Failed {
                    error: err.to_string(),
                }
            }
        };
        report.record(CascadeTarget::Preferences, outcome);

        let target = CascadeTarget::Recommendations;
        let outcome = bulk_outcome(username, target, self.recommendations.delete_all(&key));
        report.record(target, outcome);

        if let Some(feedback) = &self.feedback {
            let target = CascadeTarget::Feedback;
            report.record(target, bulk_outcome(username, target, feedback.delete_all(&key)));
        }

        if report.is_complete() {
            info!(
                username,
                recommendations = report.recommendations_removed(),
                "deleted profile and all associated data"
            );
        } else {
            warn!(username, "deleted profile, cascade incomplete");
        }
        Ok(report)
    }

    /// Delete a profile and cascade, returning what each step did.
    ///
    /// If the profile itself cannot be removed the report holds that failure
    /// and marks the remaining steps as skipped.
    pub fn delete_profile_with_report(&self, username: &str) -> CascadeReport {
        match self.try_delete_profile(username) {
            Ok(report) => report,
            Err(err) => {
                log_failure("delete_profile", username, &err);
                let mut report = CascadeReport::new(username);
                report.record(
                    CascadeTarget::Profile,
                    StepOutcome::Failed {
                        error: err.to_string(),
                    },
                );
                report.record(CascadeTarget::Preferences, StepOutcome::Skipped);
                report.record(CascadeTarget::Recommendations, StepOutcome::Skipped);
                if self.feedback.is_some() {
                    report.record(CascadeTarget::Feedback, StepOutcome::Skipped);
                }
                report
            }
        }
    }

    /// Delete a profile and cascade. True only if every step succeeded.
    pub fn delete_profile(&self, username: &str) -> bool {
        self.delete_profile_with_report(username).is_complete()
    }

    /// Stored (sanitized) usernames, sorted.
    ///
    /// # Errors
    /// - `Io` if the profile namespace cannot be listed
    pub fn try_list_all_profiles(&self) -> StoreResult<Vec<String>> {
        let mut keys = self.profiles.keys()?;
        keys.sort();
        Ok(keys.into_iter().map(UserKey::into_string).collect())
    }

    /// Stored (sanitized) usernames, sorted. Empty on failure.
    pub fn list_all_profiles(&self) -> Vec<String> {
        logged("list_all_profiles", "", self.try_list_all_profiles()).unwrap_or_default()
    }

    /// Profiles whose document equals `criteria` on every criteria key.
    ///
    /// Full scan, exact match. Results are sorted by username.
    ///
    /// # Errors
    /// - `Io` if the profile namespace cannot be listed
    pub fn try_search_profiles(&self, criteria: &Attributes) -> StoreResult<Vec<Profile>> {
        let mut matches: Vec<Profile> = self
            .profiles
            .scan()?
            .into_iter()
            .filter(|p| matches_criteria(&p.to_document(), criteria))
            .collect();
        matches.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(matches)
    }

    /// Profiles matching `criteria` exactly. Empty on failure.
    pub fn search_profiles(&self, criteria: &Attributes) -> Vec<Profile> {
        logged("search_profiles", "", self.try_search_profiles(criteria)).unwrap_or_default()
    }

    // ----- Preferences -----

    /// Create or fully replace a user's preferences.
    ///
    /// # Errors
    /// - `Validation` if `username` is empty
    /// - `Io` / `SerializationError` if the write fails
    pub fn try_save_preferences(
        &self,
        username: &str,
        data: Attributes,
    ) -> StoreResult<Preferences> {
        let key = UserKey::parse(username)?;
        let (_, now) = self.now();
        let preferences = Preferences::new(data, now);
        self.preferences.put(&key, &preferences)?;
        info!(username, "saved preferences");
        Ok(preferences)
    }

    /// Create or fully replace a user's preferences.
    pub fn save_preferences(&self, username: &str, data: Attributes) -> bool {
        logged("save_preferences", username, self.try_save_preferences(username, data)).is_some()
    }

    /// Merge `patch` into a user's preferences, creating them if absent.
    ///
    /// # Errors
    /// - `Validation` if `username` is empty
    /// - `Io` / `SerializationError` if the read or write fails
    pub fn try_update_preferences(
        &self,
        username: &str,
        patch: Attributes,
    ) -> StoreResult<Preferences> {
        let key = UserKey::parse(username)?;
        let Some(mut preferences) = self.preferences.get(&key)? else {
            return self.try_save_preferences(username, patch);
        };
        let (_, now) = self.now();
        preferences.apply_patch(patch, now);
        self.preferences.put(&key, &preferences)?;
        info!(username, "updated preferences");
        Ok(preferences)
    }

    /// Merge `patch` into a user's preferences, creating them if absent.
    pub fn update_preferences(&self, username: &str, patch: Attributes) -> bool {
        logged("update_preferences", username, self.try_update_preferences(username, patch))
            .is_some()
    }

    /// Fetch a user's preferences; `Ok(None)` if there are none.
    ///
    /// # Errors
    /// - `Validation` if `username` is empty
    /// - `Io` / `SerializationError` if the record cannot be read
    pub fn try_get_preferences(&self, username: &str) -> StoreResult<Option<Preferences>> {
        let key = UserKey::parse(username)?;
        Ok(self.preferences.get(&key)?)
    }

    /// Fetch a user's preferences, or `None` if missing or unreadable.
    pub fn get_preferences(&self, username: &str) -> Option<Preferences> {
        match logged("get_preferences", username, self.try_get_preferences(username)) {
            Some(Some(preferences)) => {
                debug!(username, "retrieved preferences");
                Some(preferences)
            }
            Some(None) => {
                warn!(username, "preferences not found");
                None
            }
            None => None,
        }
    }

    // ----- Recommendations -----

    /// Persist a recommendation, returning its generated id.
    ///
    /// The id is the store clock's local time at second granularity; a
    /// second save for the same user within the same second replaces the
    /// first.
    ///
    /// # Errors
    /// - `Validation` if `username` is empty
    /// - `Io` / `SerializationError` if the write fails
    pub fn try_save_recommendation(
        &self,
        username: &str,
        data: Attributes,
    ) -> StoreResult<RecommendationId> {
        let key = UserKey::parse(username)?;
        let (at, now) = self.now();
        let recommendation = Recommendation::new(username, data, at, now);
        self.recommendations.put(&key, &recommendation)?;
        info!(username, rec_id = %recommendation.id, "saved recommendation");
        Ok(recommendation.id)
    }

    /// Persist a recommendation. `None` if it could not be written.
    pub fn save_recommendation(
        &self,
        username: &str,
        data: Attributes,
    ) -> Option<RecommendationId> {
        logged("save_recommendation", username, self.try_save_recommendation(username, data))
    }

    /// Fetch one recommendation; `Ok(None)` if there is none.
    ///
    /// # Errors
    /// - `Validation` if `username` is empty or `rec_id` is malformed
    /// - `Io` / `SerializationError` if the record cannot be read
    pub fn try_get_recommendation(
        &self,
        username: &str,
        rec_id: &str,
    ) -> StoreResult<Option<Recommendation>> {
        let key = UserKey::parse(username)?;
        let id = RecommendationId::parse(rec_id)?;
        Ok(self.recommendations.get(&key, &id)?)
    }

    /// Fetch one recommendation, or `None` if missing, malformed or unreadable.
    pub fn get_recommendation(&self, username: &str, rec_id: &str) -> Option<Recommendation> {
        match logged(
            "get_recommendation",
            username,
            self.try_get_recommendation(username, rec_id),
        ) {
            Some(Some(rec)) => {
                debug!(username, rec_id, "retrieved recommendation");
                Some(rec)
            }
            Some(None) => {
                warn!(username, rec_id, "recommendation not found");
                None
            }
            None => None,
        }
    }

    /// All of a user's recommendations, newest first.
    ///
    /// # Errors
    /// - `Validation` if `username` is empty
    /// - `Io` if the user's namespace cannot be listed
    pub fn try_get_all_recommendations(&self, username: &str) -> StoreResult<Vec<Recommendation>> {
        let key = UserKey::parse(username)?;
        let mut recs = self.recommendations.list(&key)?;
        sort_newest_first(&mut recs);
        debug!(username, count = recs.len(), "retrieved recommendations");
        Ok(recs)
    }

    /// All of a user's recommendations, newest first. Empty on failure.
    pub fn get_all_recommendations(&self, username: &str) -> Vec<Recommendation> {
        logged(
            "get_all_recommendations",
            username,
            self.try_get_all_recommendations(username),
        )
        .unwrap_or_default()
    }

    /// Delete one recommendation.
    ///
    /// # Errors
    /// - `Validation` if `username` is empty or `rec_id` is malformed
    /// - `RecommendationNotFound` if it does not exist
    /// - `Io` if the record cannot be removed
    pub fn try_delete_recommendation(&self, username: &str, rec_id: &str) -> StoreResult<()> {
        let key = UserKey::parse(username)?;
        let id = RecommendationId::parse(rec_id)?;
        self.recommendations.delete(&key, &id)?;
        info!(username, rec_id, "deleted recommendation");
        Ok(())
    }

    /// Delete one recommendation. False if it does not exist.
    pub fn delete_recommendation(&self, username: &str, rec_id: &str) -> bool {
        logged(
            "delete_recommendation",
            username,
            self.try_delete_recommendation(username, rec_id),
        )
        .is_some()
    }

    // ----- Analytics -----

    /// System-wide counters.
    ///
    /// # Errors
    /// - `Io` if a namespace cannot be listed
    pub fn try_get_statistics(&self) -> StoreResult<Statistics> {
        let (_, now) = self.now();
        let total_profiles = self.profiles.keys()?.len();
        let total_recommendations = self.recommendations.count()?;

        let mut active_users_last_month = 0;
        for profile in self.profiles.scan()? {
            let latest = self
                .recommendations
                .list(&profile.key())?
                .iter()
                .map(|r| r.created_at)
                .reduce(f64::max);
            if analytics::is_active(&profile, latest, now) {
                active_users_last_month += 1;
            }
        }

        Ok(Statistics {
            total_profiles,
            total_recommendations,
            active_users_last_month,
            timestamp: now,
        })
    }

    /// System-wide counters. Zeroed on failure.
    pub fn get_statistics(&self) -> Statistics {
        logged("get_statistics", "", self.try_get_statistics()).unwrap_or_else(|| Statistics {
            total_profiles: 0,
            total_recommendations: 0,
            active_users_last_month: 0,
            timestamp: self.now().1,
        })
    }

    /// Subject popularity overall and per education level.
    ///
    /// # Errors
    /// - `Io` if the profile namespace cannot be listed
    pub fn try_get_topic_analytics(&self) -> StoreResult<TopicAnalytics> {
        let (_, now) = self.now();
        let profiles = self.profiles.scan()?;
        Ok(analytics::topic_analytics(&profiles, now))
    }

    /// Subject popularity overall and per education level. Empty on failure.
    pub fn get_topic_analytics(&self) -> TopicAnalytics {
        logged("get_topic_analytics", "", self.try_get_topic_analytics())
            .unwrap_or_else(|| analytics::topic_analytics(&[], self.now().1))
    }

    /// Heuristic impact view over the stored recommendations.
    ///
    /// # Errors
    /// - `Io` if the recommendation namespace cannot be listed
    pub fn try_get_recommendation_impact(&self) -> StoreResult<RecommendationImpact> {
        let (_, now) = self.now();
        let total = self.recommendations.count()?;
        Ok(analytics::recommendation_impact(total, now))
    }

    /// Heuristic impact view. Computed over zero recommendations on failure.
    pub fn get_recommendation_impact(&self) -> RecommendationImpact {
        logged("get_recommendation_impact", "", self.try_get_recommendation_impact())
            .unwrap_or_else(|| analytics::recommendation_impact(0, self.now().1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::ManualClock;
    use chrono::{Duration, TimeZone};
    use serde_json::json;

    fn attrs(v: Value) -> Attributes {
        v.as_object().cloned().unwrap()
    }

    fn store_at(start: DateTime<Utc>) -> (ProfileStore, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(start));
        let store = ProfileStore::in_memory().with_clock(clock.clone());
        (store, clock)
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn create_rejects_bad_input_without_writing() {
        let (store, _) = store_at(t0());
        assert!(!store.create_profile(attrs(json!({"name": "no username"}))));
        assert!(!store.create_profile(attrs(json!({"username": ""}))));
        let err = store.try_create_profile(attrs(json!({"username": 5}))).unwrap_err();
        assert!(err.is_validation());
        assert!(store.list_all_profiles().is_empty());
    }

    #[test]
    fn duplicate_create_keeps_first_profile() {
        let (store, _) = store_at(t0());
        assert!(store.create_profile(attrs(json!({"username": "alice", "major": "CS"}))));
        let err = store
            .try_create_profile(attrs(json!({"username": "alice", "major": "Art"})))
            .unwrap_err();
        assert!(err.is_duplicate());
        assert_eq!(store.get_profile("alice").unwrap().str_attr("major"), Some("CS"));
    }

    #[test]
    fn update_missing_profile_creates_nothing() {
        let (store, _) = store_at(t0());
        let err = store.try_update_profile("ghost", attrs(json!({"k": "v"}))).unwrap_err();
        assert!(err.is_not_found());
        assert!(store.get_profile("ghost").is_none());
    }

    #[test]
    fn update_with_stalled_clock_still_advances_updated_at() {
        let (store, _) = store_at(t0());
        store.create_profile(attrs(json!({"username": "alice"})));
        let before = store.get_profile("alice").unwrap().updated_at;
        assert!(store.update_profile("alice", attrs(json!({"k": "v2"}))));
        let after = store.get_profile("alice").unwrap();
        assert!(after.updated_at > before);
        assert_eq!(after.created_at, before);
    }

    #[test]
    fn update_preferences_creates_then_merges() {
        let (store, clock) = store_at(t0());
        assert!(store.get_preferences("alice").is_none());
        assert!(store.update_preferences("alice", attrs(json!({"pace": "slow"}))));
        clock.advance(Duration::seconds(1));
        assert!(store.update_preferences("alice", attrs(json!({"goal": "exam"}))));

        let prefs = store.get_preferences("alice").unwrap();
        assert_eq!(prefs.get("pace"), Some(&json!("slow")));
        assert_eq!(prefs.get("goal"), Some(&json!("exam")));
        assert_eq!(prefs.updated_at, epoch_seconds(t0() + Duration::seconds(1)));

        assert!(store.save_preferences("alice", attrs(json!({"goal": "fun"}))));
        let prefs = store.get_preferences("alice").unwrap();
        assert!(prefs.get("pace").is_none());
    }

    #[test]
    fn same_second_saves_collide() {
        let (store, clock) = store_at(t0());
        let first = store.save_recommendation("alice", attrs(json!({"n": 1}))).unwrap();
        clock.advance(Duration::milliseconds(500));
        let second = store.save_recommendation("alice", attrs(json!({"n": 2}))).unwrap();
        assert_eq!(first, second);

        let all = store.get_all_recommendations("alice");
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].get("n"), Some(&json!(2)));
    }

    #[test]
    fn malformed_recommendation_ids_are_rejected() {
        let (store, _) = store_at(t0());
        let err = store.try_get_recommendation("alice", "../../profiles/alice").unwrap_err();
        assert!(err.is_validation());
        assert!(!store.delete_recommendation("alice", "nope"));
    }

    #[test]
    fn delete_report_counts_cascade() {
        let (store, clock) = store_at(t0());
        store.create_profile(attrs(json!({"username": "alice"})));
        store.save_preferences("alice", attrs(json!({"pace": "slow"})));
        store.save_recommendation("alice", Attributes::new());
        clock.advance(Duration::seconds(2));
        store.save_recommendation("alice", Attributes::new());

        let report = store.delete_profile_with_report("alice");
        assert!(report.is_complete());
        assert_eq!(
            report.outcome(CascadeTarget::Preferences),
            Some(&StepOutcome::Removed { count: 1 })
        );
        assert_eq!(report.recommendations_removed(), 2);

        let again = store.delete_profile_with_report("alice");
        assert!(!again.profile_removed());
        assert_eq!(again.outcome(CascadeTarget::Preferences), Some(&StepOutcome::Skipped));
    }

    #[test]
    fn statistics_count_active_users() {
        let (store, clock) = store_at(t0());
        store.create_profile(attrs(json!({"username": "old"})));
        store.create_profile(attrs(json!({"username": "recent"})));
        clock.advance(Duration::days(40));
        store.save_recommendation("recent", Attributes::new());
        store.save_recommendation("nobody", Attributes::new());

        let stats = store.get_statistics();
        assert_eq!(stats.total_profiles, 2);
        assert_eq!(stats.total_recommendations, 2);
        assert_eq!(stats.active_users_last_month, 1);
        assert_eq!(stats.timestamp, epoch_seconds(clock.now()));
    }

    #[test]
    fn topic_analytics_reads_stored_profiles() {
        let (store, _) = store_at(t0());
        store.create_profile(attrs(json!({
            "username": "a",
            "education_level": "Undergraduate",
            "subjects": ["Math"],
        })));
        store.create_profile(attrs(json!({"username": "b", "subjects": ["Math", "Art"]})));

        let topics = store.get_topic_analytics();
        assert_eq!(topics.subject_popularity[0].subject, "Math");
        assert_eq!(topics.subject_popularity[0].count, 2);
        assert!(topics.subject_by_education_level.contains_key("Unknown"));

        let impact = store.get_recommendation_impact();
        assert_eq!(impact.feedback_ratings.values().sum::<usize>(), 0);
    }

    struct UnreachableFeedback;

    impl FeedbackBackend for UnreachableFeedback {
        fn delete_all(&self, _key: &UserKey) -> Result<usize, StorageError> {
            Err(StorageError::BackendError("feedback service down".to_string()))
        }
    }

    #[test]
    fn feedback_failure_leaves_the_rest_of_the_cascade_done() {
        let (store, _) = store_at(t0());
        let store = store.with_feedback(Arc::new(UnreachableFeedback));
        store.create_profile(attrs(json!({"username": "alice"})));
        store.save_recommendation("alice", Attributes::new());

        let report = store.delete_profile_with_report("alice");
        assert!(report.profile_removed());
        assert_eq!(report.recommendations_removed(), 1);
        assert!(matches!(
            report.outcome(CascadeTarget::Feedback),
            Some(StepOutcome::Failed { .. })
        ));
        assert!(!report.is_complete());
        assert!(store.get_profile("alice").is_none());

        let again = store.delete_profile_with_report("alice");
        assert_eq!(again.outcome(CascadeTarget::Feedback), Some(&StepOutcome::Skipped));
    }

    #[test]
    fn in_memory_store_has_no_feedback_step() {
        let (store, _) = store_at(t0());
        store.create_profile(attrs(json!({"username": "alice"})));
        let report = store.delete_profile_with_report("alice");
        assert!(report.outcome(CascadeTarget::Feedback).is_none());
        assert_eq!(report.steps.len(), 3);
    }

    #[test]
    fn debug_output_names_the_store() {
        let (store, _) = store_at(t0());
        let text = format!("{store:?}");
        assert!(text.starts_with("ProfileStore"));
        assert!(text.contains("feedback: false"));
    }
}
