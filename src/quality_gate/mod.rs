//! Quality gates: thresholds on issue counts that downgrade a build

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

use crate::models::{BuildOutcome, IssueStatistics, Severity};

mod evaluator;

pub use evaluator::QualityGateEvaluator;

/// The issue count a quality gate is checked against
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum QualityGateType {
    Total,
    TotalError,
    TotalHigh,
    TotalNormal,
    TotalLow,

    New,
    NewError,
    NewHigh,
    NewNormal,
    NewLow,

    Delta,
    DeltaError,
    DeltaHigh,
    DeltaNormal,
    DeltaLow,
}

impl QualityGateType {
    /// Human readable name of the metric
    pub fn display_name(&self) -> String {
        let family = match self.family() {
            MetricFamily::Total => "Total",
            MetricFamily::New => "New",
            MetricFamily::Delta => "Delta",
        };
        match self.severity() {
            None => format!("{} (any severity)", family),
            Some(Severity::Error) => format!("{} (errors only)", family),
            Some(severity) => format!("{} (severity {} only)", family, severity),
        }
    }

    /// Select the count this metric refers to
    pub fn actual_value(&self, statistics: &IssueStatistics) -> i64 {
        match (self.family(), self.severity()) {
            (MetricFamily::Total, None) => statistics.total() as i64,
            (MetricFamily::Total, Some(s)) => statistics.total_of(s) as i64,
            (MetricFamily::New, None) => statistics.new_total() as i64,
            (MetricFamily::New, Some(s)) => statistics.new_of(s) as i64,
            (MetricFamily::Delta, None) => statistics.delta_total(),
            (MetricFamily::Delta, Some(s)) => statistics.delta_of(s),
        }
    }

    fn family(&self) -> MetricFamily {
        use QualityGateType::*;
        match self {
            Total | TotalError | TotalHigh | TotalNormal | TotalLow => MetricFamily::Total,
            New | NewError | NewHigh | NewNormal | NewLow => MetricFamily::New,
            Delta | DeltaError | DeltaHigh | DeltaNormal | DeltaLow => MetricFamily::Delta,
        }
    }

    fn severity(&self) -> Option<Severity> {
        use QualityGateType::*;
        match self {
            Total | New | Delta => None,
            TotalError | NewError | DeltaError => Some(Severity::Error),
            TotalHigh | NewHigh | DeltaHigh => Some(Severity::High),
            TotalNormal | NewNormal | DeltaNormal => Some(Severity::Normal),
            TotalLow | NewLow | DeltaLow => Some(Severity::Low),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MetricFamily {
    Total,
    New,
    Delta,
}

/// How severe a missed quality gate is
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
pub enum QualityGateCriticality {
    /// Reported only
    Note,

    /// Marks the build as unstable
    #[serde(alias = "unstable")]
    #[strum(to_string = "warning", serialize = "unstable")]
    Warning,

    /// Marks the build as failed
    Failure,
}

impl QualityGateCriticality {
    /// The status a gate with this criticality produces when it is missed
    pub fn status(&self) -> QualityGateStatus {
        match self {
            QualityGateCriticality::Note => QualityGateStatus::Note,
            QualityGateCriticality::Warning => QualityGateStatus::Warning,
            QualityGateCriticality::Failure => QualityGateStatus::Failed,
        }
    }
}

/// Outcome of a quality gate evaluation, ordered from best to worst
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
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum QualityGateStatus {
    /// No gate has been evaluated
    Inactive,
    Passed,
    Note,
    Warning,
    Failed,
}

impl Default for QualityGateStatus {
    fn default() -> Self {
        Self::Inactive
    }
}

impl QualityGateStatus {
    pub fn is_successful(&self) -> bool {
        matches!(self, QualityGateStatus::Inactive | QualityGateStatus::Passed)
    }

    /// The build outcome this status forces, if any
    pub fn build_outcome(&self) -> Option<BuildOutcome> {
        match self {
            QualityGateStatus::Warning => Some(BuildOutcome::Unstable),
            QualityGateStatus::Failed => Some(BuildOutcome::Failure),
            _ => None,
        }
    }
}

/// A threshold rule on one metric
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityGate {
    /// Minimum count that misses the gate
    pub threshold: u32,

    /// Metric to check
    #[serde(rename = "type")]
    pub gate_type: QualityGateType,

    /// Status to report when the gate is missed
    #[serde(default = "default_criticality")]
    pub criticality: QualityGateCriticality,
}

fn default_criticality() -> QualityGateCriticality {
    QualityGateCriticality::Warning
}

impl QualityGate {
    pub fn new(
        threshold: u32,
        gate_type: QualityGateType,
        criticality: QualityGateCriticality,
    ) -> Self {
        Self {
            threshold,
            gate_type,
            criticality,
        }
    }

    pub fn name(&self) -> String {
        self.gate_type.display_name()
    }
}

/// Result of evaluating a single gate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateOutcome {
    pub gate: QualityGate,
    pub actual: i64,
    pub status: QualityGateStatus,
    pub message: String,
}

/// Result of evaluating all configured gates
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityGateResult {
    /// Worst status of all gates
    pub overall_status: QualityGateStatus,

    /// Outcomes in the order the gates were configured
    pub outcomes: Vec<GateOutcome>,
}

impl QualityGateResult {
    /// Result for a build without gates
    pub fn inactive() -> Self {
        Self::default()
    }

    pub fn is_successful(&self) -> bool {
        self.overall_status.is_successful()
    }

    /// Log lines describing the evaluation
    pub fn messages(&self) -> Vec<String> {
        if self.outcomes.is_empty() {
            return vec!["No quality gates have been set - skipping".to_string()];
        }
        self.outcomes.iter().map(|o| o.message.clone()).collect()
    }
}

/// Legacy threshold configuration: counts for unstable and failed builds
///
/// A value of 0 disables the corresponding gate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    pub failed_total_all: u32,
    pub failed_total_high: u32,
    pub failed_total_normal: u32,
    pub failed_total_low: u32,
    pub unstable_total_all: u32,
    pub unstable_total_high: u32,
    pub unstable_total_normal: u32,
    pub unstable_total_low: u32,
    pub failed_new_all: u32,
    pub failed_new_high: u32,
    pub failed_new_normal: u32,
    pub failed_new_low: u32,
    pub unstable_new_all: u32,
    pub unstable_new_high: u32,
    pub unstable_new_normal: u32,
    pub unstable_new_low: u32,
}

impl Thresholds {
    /// Map the thresholds to the equivalent list of quality gates
    pub fn to_quality_gates(&self) -> Vec<QualityGate> {
        use QualityGateCriticality::{Failure, Warning};
        use QualityGateType::*;

        let mapping = [
            (self.failed_total_all, Total, Failure),
            (self.failed_total_high, TotalHigh, Failure),
            (self.failed_total_normal, TotalNormal, Failure),
            (self.failed_total_low, TotalLow, Failure),
            (self.unstable_total_all, Total, Warning),
            (self.unstable_total_high, TotalHigh, Warning),
            (self.unstable_total_normal, TotalNormal, Warning),
            (self.unstable_total_low, TotalLow, Warning),
            (self.failed_new_all, New, Failure),
            (self.failed_new_high, NewHigh, Failure),
            (self.failed_new_normal, NewNormal, Failure),
            (self.failed_new_low, NewLow, Failure),
            (self.unstable_new_all, New, Warning),
            (self.unstable_new_high, NewHigh, Warning),
            (self.unstable_new_normal, NewNormal, Warning),
            (self.unstable_new_low, NewLow, Warning),
        ];

        mapping
            .into_iter()
            .filter(|(threshold, _, _)| *threshold > 0)
            .map(|(threshold, gate_type, criticality)| {
                QualityGate::new(threshold, gate_type, criticality)
            })
            .collect()
    }
}
