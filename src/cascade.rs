//! Outcome of a cascading profile delete.
//!
//! Deleting a profile removes the profile record, then the user's
//! preferences, then every recommendation of the user, then any feedback
//! left by other tools when the store has a feedback backend. Steps are not
//! transactional: a failed step is recorded and the remaining steps still
//! run, nothing already removed is restored.

use std::fmt;

use serde::Serialize;

/// Record kind touched by one cascade step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CascadeTarget {
    /// The profile record itself.
    Profile,
    /// The preferences record.
    Preferences,
    /// All recommendation records.
    Recommendations,
    /// Feedback records written by other tools.
    Feedback,
}

impl fmt::Display for CascadeTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Profile => "profile",
            Self::Preferences => "preferences",
            Self::Recommendations => "recommendations",
            Self::Feedback => "feedback",
        })
    }
}

/// What happened in one step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StepOutcome {
    /// `count` records were removed.
    Removed {
        /// Number of records removed.
        count: usize,
    },
    /// Nothing to remove.
    Absent,
    /// The step failed.
    Failed {
        /// Error description.
        error: String,
    },
    /// Not attempted because the profile could not be removed.
    Skipped,
}

/// One step of a cascade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CascadeStep {
    /// Record kind.
    pub target: CascadeTarget,
    /// Result of the step.
    pub outcome: StepOutcome,
}

/// Structured result of `delete_profile_with_report`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CascadeReport {
    /// Username the delete was requested for.
    pub username: String,
    /// Steps in execution order.
    pub steps: Vec<CascadeStep>,
}

impl CascadeReport {
    pub(crate) fn new(username: &str) -> Self {
        Self {
            username: username.to_string(),
            steps: Vec::with_capacity(4),
        }
    }

    pub(crate) fn record(&mut self, target: CascadeTarget, outcome: StepOutcome) {
        self.steps.push(CascadeStep { target, outcome });
    }

    /// Outcome for `target`, if that step was recorded.
    #[must_use]
    pub fn outcome(&self, target: CascadeTarget) -> Option<&StepOutcome> {
        self.steps
            .iter()
            .find(|s| s.target == target)
            .map(|s| &s.outcome)
    }

    /// True if the profile record itself was removed.
    #[must_use]
    pub fn profile_removed(&self) -> bool {
        matches!(
            self.outcome(CascadeTarget::Profile),
            Some(StepOutcome::Removed { .. })
        )
    }

    /// True if the profile was removed and no step failed.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.profile_removed() && self.failures().next().is_none()
    }

    /// Steps that failed or were skipped.
    pub fn failures(&self) -> impl Iterator<Item = &CascadeStep> {
        self.steps
            .iter()
            .filter(|s| matches!(s.outcome, StepOutcome::Failed { .. } | StepOutcome::Skipped))
    }

    /// Number of recommendations removed by the cascade.
    #[must_use]
    pub fn recommendations_removed(&self) -> usize {
        match self.outcome(CascadeTarget::Recommendations) {
            Some(StepOutcome::Removed { count }) => *count,
            _ => 0,
        }
    }
}
