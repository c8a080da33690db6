//! End-to-end behaviour of `ProfileStore` over both backends.
//!
//! Every scenario runs against a fresh temp directory and a manual clock, and
//! the backend-independent ones run against the in-memory backend too.

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::{json, Value};
use tempfile::{tempdir, TempDir};

use profilestore::time::epoch_seconds;
use profilestore::{
    Attributes, CascadeTarget, ManualClock, ProfileStore, StepOutcome, StoreConfig,
};

fn attrs(v: Value) -> Attributes {
    v.as_object().cloned().unwrap()
}

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
}

struct Fixture {
    store: ProfileStore,
    clock: Arc<ManualClock>,
    _dir: Option<TempDir>,
}

fn file_store() -> Fixture {
    let dir = tempdir().unwrap();
    let clock = Arc::new(ManualClock::new(start()));
    let config = StoreConfig::new(dir.path()).with_sync_on_write(false);
    let store = ProfileStore::open(config).unwrap().with_clock(clock.clone());
    Fixture {
        store,
        clock,
        _dir: Some(dir),
    }
}

fn memory_store() -> Fixture {
    let clock = Arc::new(ManualClock::new(start()));
    let store = ProfileStore::in_memory().with_clock(clock.clone());
    Fixture {
        store,
        clock,
        _dir: None,
    }
}

fn both() -> [Fixture; 2] {
    [file_store(), memory_store()]
}

#[test]
fn create_then_get_returns_input_with_equal_timestamps() {
    for Fixture { store, _dir, .. } in both() {
        assert!(store.create_profile(attrs(json!({
            "username": "alice",
            "education_level": "Undergraduate",
            "subjects": ["Math", "Physics"],
        }))));

        let p = store.get_profile("alice").unwrap();
        assert_eq!(p.username, "alice");
        assert_eq!(p.str_attr("education_level"), Some("Undergraduate"));
        assert_eq!(p.attributes["subjects"], json!(["Math", "Physics"]));
        assert_eq!(p.created_at, p.updated_at);
        assert_eq!(p.created_at, epoch_seconds(start()));
    }
}

#[test]
fn duplicate_create_fails_and_preserves_first() {
    for Fixture { store, _dir, .. } in both() {
        assert!(store.create_profile(attrs(json!({"username": "alice", "major": "CS"}))));
        assert!(!store.create_profile(attrs(json!({"username": "alice", "major": "Art"}))));
        assert_eq!(store.get_profile("alice").unwrap().str_attr("major"), Some("CS"));
    }
}

#[test]
fn update_of_missing_profile_fails_and_creates_nothing() {
    for Fixture { store, _dir, .. } in both() {
        assert!(!store.update_profile("ghost", attrs(json!({"major": "CS"}))));
        assert!(store.get_profile("ghost").is_none());
        assert!(store.list_all_profiles().is_empty());
    }
}

#[test]
fn update_merges_and_advances_updated_at() {
    for Fixture { store, clock, _dir } in both() {
        store.create_profile(attrs(json!({"username": "alice", "major": "CS", "year": 1})));
        let before = store.get_profile("alice").unwrap();

        clock.advance(Duration::seconds(10));
        assert!(store.update_profile("alice", attrs(json!({"year": 2, "minor": "Art"}))));

        let after = store.get_profile("alice").unwrap();
        assert_eq!(after.str_attr("major"), Some("CS"));
        assert_eq!(after.attributes["year"], json!(2));
        assert_eq!(after.str_attr("minor"), Some("Art"));
        assert_eq!(after.created_at, before.created_at);
        assert!(after.updated_at > before.updated_at);
    }
}

#[test]
fn update_ignores_attempts_to_rewrite_identity() {
    for Fixture { store, _dir, .. } in both() {
        store.create_profile(attrs(json!({"username": "alice"})));
        let before = store.get_profile("alice").unwrap();
        assert!(store.update_profile(
            "alice",
            attrs(json!({"username": "mallory", "created_at": 0.0})),
        ));
        let after = store.get_profile("alice").unwrap();
        assert_eq!(after.username, "alice");
        assert_eq!(after.created_at, before.created_at);
    }
}

#[test]
fn delete_cascades_to_preferences_and_recommendations() {
    for Fixture { store, clock, _dir } in both() {
        store.create_profile(attrs(json!({"username": "alice"})));
        store.save_preferences("alice", attrs(json!({"learning_style": "Visual"})));
        let id = store.save_recommendation("alice", attrs(json!({"topic": "Calculus"}))).unwrap();
        clock.advance(Duration::seconds(1));
        store.save_recommendation("alice", attrs(json!({"topic": "Algebra"}))).unwrap();

        assert!(store.delete_profile("alice"));
        assert!(store.get_profile("alice").is_none());
        assert!(store.get_preferences("alice").is_none());
        assert!(store.get_recommendation("alice", id.as_str()).is_none());
        assert!(store.get_all_recommendations("alice").is_empty());

        assert!(!store.delete_profile("alice"));
    }
}

#[test]
fn delete_report_describes_each_step() {
    for Fixture { store, clock, _dir } in both() {
        store.create_profile(attrs(json!({"username": "bob"})));
        for _ in 0..3 {
            store.save_recommendation("bob", Attributes::new()).unwrap();
            clock.advance(Duration::seconds(1));
        }

        let report = store.delete_profile_with_report("bob");
        assert!(report.is_complete());
        let targets: Vec<CascadeTarget> = report.steps.iter().map(|s| s.target).collect();
        assert_eq!(
            targets[..3],
            [CascadeTarget::Profile, CascadeTarget::Preferences, CascadeTarget::Recommendations]
        );
        assert!(matches!(
            report.outcome(CascadeTarget::Feedback),
            None | Some(StepOutcome::Absent)
        ));
        assert_eq!(
            report.outcome(CascadeTarget::Profile),
            Some(&StepOutcome::Removed { count: 1 })
        );
        assert_eq!(report.outcome(CascadeTarget::Preferences), Some(&StepOutcome::Absent));
        assert_eq!(report.recommendations_removed(), 3);
    }
}

#[test]
fn saved_recommendation_carries_system_fields() {
    for Fixture { store, _dir, .. } in both() {
        let id = store
            .save_recommendation("alice", attrs(json!({"topic": "Calculus", "score": 0.9})))
            .unwrap();

        let rec = store.get_recommendation("alice", id.as_str()).unwrap();
        assert_eq!(rec.id, id);
        assert_eq!(rec.username, "alice");
        assert_eq!(rec.created_at, epoch_seconds(start()));
        assert_eq!(rec.get("topic"), Some(&json!("Calculus")));
        assert_eq!(rec.get("score"), Some(&json!(0.9)));
    }
}

#[test]
fn recommendations_come_back_newest_first() {
    for Fixture { store, clock, _dir } in both() {
        let mut ids = Vec::new();
        for topic in ["first", "second", "third"] {
            ids.push(store.save_recommendation("alice", attrs(json!({"topic": topic}))).unwrap());
            clock.advance(Duration::seconds(1));
        }

        let all = store.get_all_recommendations("alice");
        let topics: Vec<&Value> = all.iter().filter_map(|r| r.get("topic")).collect();
        assert_eq!(topics, [&json!("third"), &json!("second"), &json!("first")]);
        assert_eq!(all[0].id, ids[2]);
    }
}

#[test]
fn recommendation_delete_is_scoped_and_reports_missing() {
    for Fixture { store, _dir, .. } in both() {
        let id = store.save_recommendation("alice", Attributes::new()).unwrap();
        assert!(!store.delete_recommendation("bob", id.as_str()));
        assert!(store.delete_recommendation("alice", id.as_str()));
        assert!(!store.delete_recommendation("alice", id.as_str()));
    }
}

#[test]
fn usernames_sanitizing_to_the_same_key_collide() {
    for Fixture { store, _dir, .. } in both() {
        assert!(store.create_profile(attrs(json!({"username": "a.b"}))));
        assert!(!store.create_profile(attrs(json!({"username": "a_b"}))));
        assert_eq!(store.get_profile("a_b").unwrap().username, "a.b");
        assert_eq!(store.list_all_profiles(), ["a_b"]);
    }
}

#[test]
fn list_all_profiles_is_sorted() {
    for Fixture { store, _dir, .. } in both() {
        for name in ["carol", "alice", "bob"] {
            store.create_profile(attrs(json!({"username": name})));
        }
        assert_eq!(store.list_all_profiles(), ["alice", "bob", "carol"]);
    }
}

#[test]
fn search_matches_exact_values_only() {
    for Fixture { store, _dir, .. } in both() {
        store.create_profile(attrs(json!({"username": "u1", "education_level": "Undergraduate"})));
        store.create_profile(attrs(json!({"username": "u2", "education_level": "Graduate"})));
        store.create_profile(attrs(json!({"username": "u3", "education_level": "Undergraduate"})));
        store.create_profile(attrs(json!({"username": "u4"})));

        let hits = store.search_profiles(&attrs(json!({"education_level": "Undergraduate"})));
        let names: Vec<&str> = hits.iter().map(|p| p.username.as_str()).collect();
        assert_eq!(names, ["u1", "u3"]);

        assert!(store
            .search_profiles(&attrs(json!({"education_level": "undergraduate"})))
            .is_empty());
        assert_eq!(store.search_profiles(&Attributes::new()).len(), 4);
        assert_eq!(store.search_profiles(&attrs(json!({"username": "u2"}))).len(), 1);
    }
}

#[test]
fn search_matches_integers_against_stored_floats() {
    for Fixture { store, _dir, .. } in both() {
        store.create_profile(attrs(json!({"username": "a", "gpa": 3.0})));
        store.create_profile(attrs(json!({"username": "b", "gpa": 3.5})));

        let hits = store.search_profiles(&attrs(json!({"gpa": 3})));
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].username, "a");
        assert_eq!(store.search_profiles(&attrs(json!({"gpa": 3.50}))).len(), 1);
    }
}

#[test]
fn preferences_save_replaces_and_update_merges() {
    for Fixture { store, clock, _dir } in both() {
        assert!(store.save_preferences("alice", attrs(json!({"pace": "slow", "goal": "exam"}))));
        clock.advance(Duration::seconds(1));
        assert!(store.update_preferences("alice", attrs(json!({"pace": "fast"}))));

        let prefs = store.get_preferences("alice").unwrap();
        assert_eq!(prefs.get("pace"), Some(&json!("fast")));
        assert_eq!(prefs.get("goal"), Some(&json!("exam")));

        assert!(store.save_preferences("alice", attrs(json!({"pace": "medium"}))));
        let prefs = store.get_preferences("alice").unwrap();
        assert!(prefs.get("goal").is_none());
    }
}

#[test]
fn store_reopened_on_same_directory_sees_existing_records() {
    let dir = tempdir().unwrap();
    {
        let store = ProfileStore::open(StoreConfig::new(dir.path())).unwrap();
        store.create_profile(attrs(json!({"username": "alice"})));
        store.save_preferences("alice", attrs(json!({"pace": "slow"})));
    }
    let store = ProfileStore::open(StoreConfig::new(dir.path())).unwrap();
    assert!(store.get_profile("alice").is_some());
    assert!(store.get_preferences("alice").is_some());
}

#[test]
fn statistics_and_topics_reflect_stored_records() {
    for Fixture { store, clock, _dir } in both() {
        store.create_profile(attrs(json!({
            "username": "a", "education_level": "Undergraduate", "subjects": ["Math", "Physics"],
        })));
        store.create_profile(attrs(json!({
            "username": "b", "education_level": "Undergraduate", "subjects": ["Math"],
        })));
        store.create_profile(attrs(json!({"username": "c", "subjects": ["Art"]})));

        clock.advance(Duration::days(31));
        store.save_recommendation("a", Attributes::new()).unwrap();

        let stats = store.get_statistics();
        assert_eq!(stats.total_profiles, 3);
        assert_eq!(stats.total_recommendations, 1);
        assert_eq!(stats.active_users_last_month, 1);

        let topics = store.get_topic_analytics();
        assert_eq!(topics.subject_popularity[0].subject, "Math");
        assert_eq!(topics.subject_popularity[0].count, 2);
        assert_eq!(topics.subject_by_education_level["Undergraduate"].len(), 2);
        assert_eq!(topics.subject_by_education_level["Unknown"][0].subject, "Art");
        assert_eq!(topics.subject_completion_rates["Math"], 100.0);

        let impact = store.get_recommendation_impact();
        assert_eq!(impact.resource_effectiveness.len(), 7);
        assert_eq!(impact.retention_correlation, 0.72);
    }
}
