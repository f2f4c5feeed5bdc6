//! The analysis pipeline of one build and tool

use std::collections::BTreeMap;

use log::{debug, info};

use crate::difference::IssueDifferencer;
use crate::fingerprint::Fingerprinter;
use crate::history::{BuildHistory, ReferenceOverrides};
use crate::models::{AnalysisResult, BuildOutcome, IssueSet, IssueStatistics, ReferencePointer};
use crate::quality_gate::{QualityGate, QualityGateEvaluator, QualityGateResult};
use crate::reference::{ReferencePolicy, ReferenceResolver};

mod reset;

pub use reset::ResetQualityGateCommand;

/// Issues reported by one tool for a completed build
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub job: String,
    pub build: u32,

    /// Outcome of the build before quality gates are applied
    pub reported_outcome: BuildOutcome,

    pub issues: IssueSet,

    /// Issue count per contributing branch, empty for a single report
    pub size_per_branch: BTreeMap<String, usize>,
}

impl AnalysisRequest {
    pub fn new(job: impl Into<String>, build: u32, issues: IssueSet) -> Self {
        Self {
            job: job.into(),
            build,
            reported_outcome: BuildOutcome::Success,
            issues,
            size_per_branch: BTreeMap::new(),
        }
    }

    pub fn with_outcome(mut self, outcome: BuildOutcome) -> Self {
        self.reported_outcome = outcome;
        self
    }

    pub fn with_branch_totals(mut self, size_per_branch: BTreeMap<String, usize>) -> Self {
        self.size_per_branch = size_per_branch;
        self
    }
}

/// Result of the pipeline together with the outcome to record for the build
#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    pub result: AnalysisResult,
    pub outcome: BuildOutcome,
}

/// Runs fingerprinting, reference resolution, classification, and gates
pub struct IssueAnalyzer<'a> {
    history: &'a dyn BuildHistory,
    overrides: &'a dyn ReferenceOverrides,
    fingerprinter: &'a Fingerprinter,
    policy: &'a ReferencePolicy,
    gates: &'a [QualityGate],
}

impl<'a> IssueAnalyzer<'a> {
    pub fn new(
        history: &'a dyn BuildHistory,
        overrides: &'a dyn ReferenceOverrides,
        fingerprinter: &'a Fingerprinter,
        policy: &'a ReferencePolicy,
        gates: &'a [QualityGate],
    ) -> Self {
        Self {
            history,
            overrides,
            fingerprinter,
            policy,
            gates,
        }
    }

    /// Analyze the issues of a build
    ///
    /// Never fails: unreadable sources and history problems degrade to
    /// fallback fingerprints and a build without reference.
    pub fn analyze(&self, request: AnalysisRequest) -> Analysis {
        let AnalysisRequest {
            job,
            build,
            reported_outcome,
            mut issues,
            size_per_branch,
        } = request;
        let tool_id = issues.id.clone();
        debug!("Analyzing {} issues of '{}' for {} #{}", issues.len(), tool_id, job, build);

        self.fingerprinter.fingerprint_all(&mut issues);

        let mut log = issues.copy_empty();
        let resolution =
            ReferenceResolver::new(self.history, self.overrides, self.policy).resolve(&job, build, &tool_id, &mut log);
        let reference = resolution
            .build()
            .and_then(|reference| reference.result_for(&tool_id).map(|result| (reference, &result.issues)));

        let difference = IssueDifferencer::compute(&issues, reference, build, &mut log);
        difference.apply_references(&mut issues);
        let statistics = difference.statistics(&issues, reference.map(|(_, baseline)| baseline));

        let quality_gate = self.evaluate_gates(&statistics, &mut log);

        let gate_outcome = quality_gate
            .overall_status
            .build_outcome()
            .unwrap_or(BuildOutcome::Success);
        let outcome = reported_outcome.combine(gate_outcome);
        if outcome != reported_outcome {
            log.log_info(format!("Setting build result to {}", outcome));
        }

        let (successful_since_build, no_issues_since_build) =
            self.since_builds(&job, build, &tool_id, quality_gate.is_successful(), issues.is_empty());

        let summary = format!(
            "Created analysis result for {} issues (found {} new issues, fixed {} issues)",
            issues.len(),
            difference.new_issues.len(),
            difference.fixed_issues.len()
        );
        info!("[{}] {}", tool_id, summary);
        log.log_info(summary);
        issues.merge_log_messages(&log);

        let size_per_origin = issues.size_per_origin();
        let reference_build = reference.map(|(reference, _)| ReferencePointer {
            job: reference.job.clone(),
            number: reference.number,
        });

        let result = AnalysisResult {
            job,
            build,
            tool_id,
            issues,
            new_issues: difference.new_issues,
            fixed_issues: difference.fixed_issues,
            outstanding_issues: difference.outstanding_issues,
            statistics,
            quality_gate,
            reference_build,
            size_per_origin,
            size_per_branch,
            successful_since_build,
            no_issues_since_build,
        };

        Analysis { result, outcome }
    }

    fn evaluate_gates(&self, statistics: &IssueStatistics, log: &mut IssueSet) -> QualityGateResult {
        let result = QualityGateEvaluator::new(self.gates).evaluate(statistics);
        if result.outcomes.is_empty() {
            log.log_info("No quality gates have been set - skipping");
            return result;
        }

        log.log_info("Evaluating quality gates");
        for message in result.messages() {
            log.log_info(format!("-> {}", message));
        }
        if result.is_successful() {
            log.log_info("-> All quality gates have been passed");
        } else {
            log.log_info(format!(
                "-> Some quality gates have been missed: overall result is {}",
                result.overall_status
            ));
        }
        result
    }

    /// Carry the "since" build numbers over from the previous result of the tool
    fn since_builds(
        &self,
        job: &str,
        build: u32,
        tool_id: &str,
        successful: bool,
        no_issues: bool,
    ) -> (Option<u32>, Option<u32>) {
        let previous = match self.history.prior_builds(job, build) {
            Ok(builds) => builds
                .into_iter()
                .filter(|b| b.is_completed())
                .find_map(|b| b.results.get(tool_id).cloned()),
            Err(e) => {
                debug!("Cannot read previous result of '{}': {}", tool_id, e);
                None
            }
        };

        let successful_since = successful.then(|| {
            previous
                .as_ref()
                .filter(|p| p.is_successful())
                .and_then(|p| p.successful_since_build)
                .unwrap_or(build)
        });
        let no_issues_since = no_issues.then(|| {
            previous
                .as_ref()
                .filter(|p| p.total_size() == 0)
                .and_then(|p| p.no_issues_since_build)
                .unwrap_or(build)
        });
        (successful_since, no_issues_since)
    }
}
