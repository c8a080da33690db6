//! Aggregate views over stored records.
//!
//! Statistics and topic analytics are computed from the stored profiles and
//! recommendations. Recommendation impact is a heuristic: no feedback is
//! collected, so ratings are a fixed distribution over the recommendation
//! count and resource scores are stable hash-derived placeholders.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use serde_json::Value;

use crate::profile::Profile;

/// Window used for `active_users_last_month`, in seconds.
pub const ACTIVE_WINDOW_SECS: f64 = 30.0 * 24.0 * 60.0 * 60.0;

/// Education level assumed when a profile does not state one.
pub const UNKNOWN_EDUCATION_LEVEL: &str = "Unknown";

/// Subjects kept per education level.
const TOP_SUBJECTS_PER_LEVEL: usize = 5;

/// Resource categories scored by [`recommendation_impact`].
pub const RESOURCE_TYPES: [&str; 7] = [
    "Online Courses",
    "Videos",
    "Books",
    "Interactive Tools",
    "Tutorials",
    "Research Papers",
    "Projects",
];

/// Share of recommendations per rating 1..=5, in percent.
const RATING_WEIGHTS: [(u8, usize); 5] = [(1, 5), (2, 10), (3, 20), (4, 35), (5, 30)];

const RETENTION_CORRELATION: f64 = 0.72;

/// System-wide counters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Statistics {
    /// Number of stored profiles.
    pub total_profiles: usize,
    /// Number of stored recommendations across all users.
    pub total_recommendations: usize,
    /// Profiles touched, or given a recommendation, in the last 30 days.
    pub active_users_last_month: usize,
    /// When the statistics were computed, epoch seconds.
    pub timestamp: f64,
}

/// One subject and how many profiles list it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubjectCount {
    /// Subject name.
    pub subject: String,
    /// Number of listings.
    pub count: usize,
}

/// Subject preferences across profiles.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopicAnalytics {
    /// All subjects, most listed first.
    pub subject_popularity: Vec<SubjectCount>,
    /// Top five subjects per education level.
    pub subject_by_education_level: BTreeMap<String, Vec<SubjectCount>>,
    /// Estimated completion rate per subject, in percent.
    pub subject_completion_rates: BTreeMap<String, f64>,
    /// When the analytics were computed, epoch seconds.
    pub timestamp: f64,
}

/// Heuristic effectiveness view of stored recommendations.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecommendationImpact {
    /// Estimated number of recommendations per rating (1..=5).
    pub feedback_ratings: BTreeMap<u8, usize>,
    /// Placeholder effectiveness score (0-100) per resource type.
    pub resource_effectiveness: BTreeMap<String, u32>,
    /// Placeholder correlation between recommendations and retention.
    pub retention_correlation: f64,
    /// When the view was computed, epoch seconds.
    pub timestamp: f64,
}

fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

fn ranked(counts: HashMap<String, usize>) -> Vec<SubjectCount> {
    let mut out: Vec<SubjectCount> = counts
        .into_iter()
        .map(|(subject, count)| SubjectCount { subject, count })
        .collect();
    out.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.subject.cmp(&b.subject)));
    out
}

fn subjects_of(profile: &Profile) -> impl Iterator<Item = &str> {
    profile
        .attributes
        .get("subjects")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(Value::as_str)
}

/// True if a profile counts as active at `now`.
///
/// `latest_recommendation` is the newest `created_at` among the user's
/// recommendations, if any.
#[must_use]
pub fn is_active(profile: &Profile, latest_recommendation: Option<f64>, now: f64) -> bool {
    let cutoff = now - ACTIVE_WINDOW_SECS;
    profile.updated_at >= cutoff || latest_recommendation.is_some_and(|t| t >= cutoff)
}

/// Counts subject listings overall and per education level.
#[must_use]
pub fn topic_analytics(profiles: &[Profile], timestamp: f64) -> TopicAnalytics {
    let mut overall: HashMap<String, usize> = HashMap::new();
    let mut by_level: HashMap<String, HashMap<String, usize>> = HashMap::new();

    for profile in profiles {
        let level = profile
            .str_attr("education_level")
            .unwrap_or(UNKNOWN_EDUCATION_LEVEL)
            .to_string();
        let level_counts = by_level.entry(level).or_default();
        for subject in subjects_of(profile) {
            *overall.entry(subject.to_string()).or_default() += 1;
            *level_counts.entry(subject.to_string()).or_default() += 1;
        }
    }

    let max = overall.values().copied().max().unwrap_or(1).max(1);
    #[allow(clippy::cast_precision_loss)]
    let subject_completion_rates = overall
        .iter()
        .map(|(subject, &count)| {
            (subject.clone(), round1(30.0 + 70.0 * (count as f64 / max as f64)))
        })
        .collect();

    let subject_by_education_level = by_level
        .into_iter()
        .map(|(level, counts)| {
            let mut top = ranked(counts);
            top.truncate(TOP_SUBJECTS_PER_LEVEL);
            (level, top)
        })
        .collect();

    TopicAnalytics {
        subject_popularity: ranked(overall),
        subject_by_education_level,
        subject_completion_rates,
        timestamp,
    }
}

/// Stable score in `75..=100` for a resource type.
fn resource_score(name: &str) -> u32 {
    let digest = blake3::hash(name.as_bytes());
    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&digest.as_bytes()[..8]);
    let bucket = u64::from_le_bytes(prefix) % 100;

    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let score = (50.0 + 50.0 * (0.5 + 0.5 * (bucket as f64) / 100.0)).round() as u32;
    score
}

/// Builds the heuristic impact view for `total_recommendations`.
#[must_use]
pub fn recommendation_impact(total_recommendations: usize, timestamp: f64) -> RecommendationImpact {
    let feedback_ratings = RATING_WEIGHTS
        .iter()
        .map(|&(rating, pct)| (rating, total_recommendations * pct / 100))
        .collect();

    let resource_effectiveness = RESOURCE_TYPES
        .iter()
        .map(|name| ((*name).to_string(), resource_score(name)))
        .collect();

    RecommendationImpact {
        feedback_ratings,
        resource_effectiveness,
        retention_correlation: RETENTION_CORRELATION,
        timestamp,
    }
}
