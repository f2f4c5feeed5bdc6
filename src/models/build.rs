use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

use super::AnalysisResult;

/// Overall result of a finished build, ordered from worst to best
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum BuildOutcome {
    Aborted,
    NotBuilt,
    Failure,
    Unstable,
    Success,
}

impl BuildOutcome {
    /// Whether this outcome is at least as good as `other`
    pub fn is_better_or_equal_to(self, other: BuildOutcome) -> bool {
        self >= other
    }

    /// The worse of two outcomes
    pub fn combine(self, other: BuildOutcome) -> BuildOutcome {
        self.min(other)
    }
}

/// A lightweight view of one build in a job's history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildRef {
    /// Name of the job that owns the build
    pub job: String,

    /// Build number, unique within the job
    pub number: u32,

    /// Whether the build is still running
    #[serde(default)]
    pub in_progress: bool,

    /// Overall result, absent while the build is running
    #[serde(default)]
    pub outcome: Option<BuildOutcome>,

    /// Analysis results keyed by tool id
    #[serde(default)]
    pub results: BTreeMap<String, AnalysisResult>,
}

impl BuildRef {
    /// Create a finished build with the given outcome and no results
    pub fn completed(job: impl Into<String>, number: u32, outcome: BuildOutcome) -> Self {
        Self {
            job: job.into(),
            number,
            in_progress: false,
            outcome: Some(outcome),
            results: BTreeMap::new(),
        }
    }

    /// Create a build that is still running
    pub fn running(job: impl Into<String>, number: u32) -> Self {
        Self {
            job: job.into(),
            number,
            in_progress: true,
            outcome: None,
            results: BTreeMap::new(),
        }
    }

    /// Attach an analysis result under its tool id
    pub fn with_result(mut self, result: AnalysisResult) -> Self {
        self.results.insert(result.tool_id.clone(), result);
        self
    }

    /// Human readable name, e.g. `Job #2`
    pub fn display_name(&self) -> String {
        display_name(&self.job, self.number)
    }

    pub fn is_completed(&self) -> bool {
        !self.in_progress && self.outcome.is_some()
    }

    /// The analysis result of the given tool, if the build has one
    pub fn result_for(&self, tool_id: &str) -> Option<&AnalysisResult> {
        self.results.get(tool_id)
    }
}

/// Format a build name as `<job> #<number>`
pub fn display_name(job: &str, number: u32) -> String {
    format!("{} #{}", job, number)
}
