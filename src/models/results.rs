use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{IssueSet, Severity};
use crate::quality_gate::{QualityGateResult, QualityGateStatus};

/// Issue counts used to evaluate quality gates
///
/// Delta values are signed: the current count minus the reference count.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueStatistics {
    pub total_error: usize,
    pub total_high: usize,
    pub total_normal: usize,
    pub total_low: usize,

    pub new_error: usize,
    pub new_high: usize,
    pub new_normal: usize,
    pub new_low: usize,

    pub delta_error: i64,
    pub delta_high: i64,
    pub delta_normal: i64,
    pub delta_low: i64,

    pub fixed: usize,
}

impl IssueStatistics {
    pub fn total(&self) -> usize {
        self.total_error + self.total_high + self.total_normal + self.total_low
    }

    pub fn total_of(&self, severity: Severity) -> usize {
        match severity {
            Severity::Error => self.total_error,
            Severity::High => self.total_high,
            Severity::Normal => self.total_normal,
            Severity::Low => self.total_low,
        }
    }

    pub fn new_total(&self) -> usize {
        self.new_error + self.new_high + self.new_normal + self.new_low
    }

    pub fn new_of(&self, severity: Severity) -> usize {
        match severity {
            Severity::Error => self.new_error,
            Severity::High => self.new_high,
            Severity::Normal => self.new_normal,
            Severity::Low => self.new_low,
        }
    }

    pub fn delta_total(&self) -> i64 {
        self.delta_error + self.delta_high + self.delta_normal + self.delta_low
    }

    pub fn delta_of(&self, severity: Severity) -> i64 {
        match severity {
            Severity::Error => self.delta_error,
            Severity::High => self.delta_high,
            Severity::Normal => self.delta_normal,
            Severity::Low => self.delta_low,
        }
    }
}

/// Pointer to the build used as baseline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferencePointer {
    pub job: String,
    pub number: u32,
}

impl ReferencePointer {
    pub fn display_name(&self) -> String {
        super::display_name(&self.job, self.number)
    }
}

/// Result of analyzing the issues of one tool in one build
///
/// Created once per build and never modified after the quality gates have
/// been evaluated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Job that owns the build
    pub job: String,

    /// Build number
    pub build: u32,

    /// Tool id the result belongs to
    pub tool_id: String,

    /// All issues of the build, carrying the analysis log
    pub issues: IssueSet,

    /// Issues not present in the reference build
    pub new_issues: IssueSet,

    /// Issues of the reference build that are gone
    pub fixed_issues: IssueSet,

    /// Issues present in both builds
    pub outstanding_issues: IssueSet,

    pub statistics: IssueStatistics,

    pub quality_gate: QualityGateResult,

    /// Baseline used for the classification, absent on a first build
    pub reference_build: Option<ReferencePointer>,

    pub size_per_origin: BTreeMap<String, usize>,

    /// Issue count per branch when the build fanned out into branches
    #[serde(default)]
    pub size_per_branch: BTreeMap<String, usize>,

    /// First build of the current run of successful quality gates
    pub successful_since_build: Option<u32>,

    /// First build of the current run of builds without issues
    pub no_issues_since_build: Option<u32>,
}

impl AnalysisResult {
    /// An empty result without reference and without gates
    pub fn new(job: impl Into<String>, build: u32, tool_id: impl Into<String>) -> Self {
        let tool_id = tool_id.into();
        Self {
            job: job.into(),
            build,
            issues: IssueSet::new(tool_id.clone()),
            new_issues: IssueSet::new(tool_id.clone()),
            fixed_issues: IssueSet::new(tool_id.clone()),
            outstanding_issues: IssueSet::new(tool_id.clone()),
            tool_id,
            statistics: IssueStatistics::default(),
            quality_gate: QualityGateResult::inactive(),
            reference_build: None,
            size_per_origin: BTreeMap::new(),
            size_per_branch: BTreeMap::new(),
            successful_since_build: None,
            no_issues_since_build: None,
        }
    }

    pub fn total_size(&self) -> usize {
        self.issues.len()
    }

    pub fn size_of(&self, severity: Severity) -> usize {
        self.issues.size_of(severity)
    }

    pub fn new_size(&self) -> usize {
        self.new_issues.len()
    }

    pub fn fixed_size(&self) -> usize {
        self.fixed_issues.len()
    }

    pub fn outstanding_size(&self) -> usize {
        self.outstanding_issues.len()
    }

    pub fn quality_gate_status(&self) -> QualityGateStatus {
        self.quality_gate.overall_status
    }

    /// Whether the quality gates passed or were not configured
    pub fn is_successful(&self) -> bool {
        self.quality_gate.overall_status.is_successful()
    }

    pub fn info_messages(&self) -> &[String] {
        self.issues.info_messages()
    }

    pub fn error_messages(&self) -> &[String] {
        self.issues.error_messages()
    }
}
