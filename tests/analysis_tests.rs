use std::sync::Arc;

use mockall::mock;
use pretty_assertions::assert_eq;
use tidemark::analysis::{AnalysisRequest, IssueAnalyzer, ResetQualityGateCommand};
use tidemark::errors::{SourceError, TidemarkError};
use tidemark::fingerprint::{Fingerprinter, SourceReader};
use tidemark::history::{InMemoryHistory, InMemoryOverrides, OverrideKey, ReferenceOverrides};
use tidemark::models::{AnalysisResult, BuildOutcome, BuildRef, Issue, IssueSet, Severity};
use tidemark::quality_gate::{
    QualityGate, QualityGateCriticality, QualityGateResult, QualityGateStatus, QualityGateType,
};
use tidemark::reference::ReferencePolicy;

mock! {
    pub Reader {}

    impl SourceReader for Reader {
        fn read_lines(&self, file_name: &str) -> Result<Vec<String>, SourceError>;
    }
}

const TOOL: &str = "pmd";

fn no_sources() -> Fingerprinter {
    let mut reader = MockReader::new();
    reader
        .expect_read_lines()
        .returning(|name| Err(SourceError::NotFound(name.into())));
    Fingerprinter::new(Arc::new(reader))
}

fn issue(message: &str, severity: Severity) -> Issue {
    Issue::new("Main.java", 1)
        .with_severity(severity)
        .with_category("design", message)
        .with_message(message)
}

fn request(build: u32, issues: Vec<Issue>) -> AnalysisRequest {
    AnalysisRequest::new("Job", build, IssueSet::with_issues(TOOL, issues))
}

/// Run the analysis and store the build the way the record command does
fn analyze_and_record(
    history: &InMemoryHistory,
    overrides: &InMemoryOverrides,
    gates: &[QualityGate],
    request: AnalysisRequest,
) -> tidemark::analysis::Analysis {
    let fingerprinter = no_sources();
    let policy = ReferencePolicy::default();
    let analysis = IssueAnalyzer::new(history, overrides, &fingerprinter, &policy, gates).analyze(request.clone());
    history.record(
        BuildRef::completed(request.job, request.build, analysis.outcome).with_result(analysis.result.clone()),
    );
    analysis
}

#[test]
fn test_first_build_is_stable() {
    let history = InMemoryHistory::new();
    let overrides = InMemoryOverrides::new();
    let gates = [QualityGate::new(1, QualityGateType::New, QualityGateCriticality::Failure)];

    let analysis = analyze_and_record(
        &history,
        &overrides,
        &gates,
        request(1, vec![issue("a", Severity::High), issue("b", Severity::Low)]),
    );
    let result = &analysis.result;

    assert_eq!(result.total_size(), 2);
    assert_eq!(result.new_size(), 0);
    assert_eq!(result.fixed_size(), 0);
    assert_eq!(result.outstanding_size(), 2);
    assert_eq!(result.reference_build, None);
    assert_eq!(result.quality_gate_status(), QualityGateStatus::Passed);
    assert_eq!(analysis.outcome, BuildOutcome::Success);
    assert!(result.issues.iter().all(|i| i.reference == Some(1)));
    assert!(result
        .info_messages()
        .contains(&"Created analysis result for 2 issues (found 0 new issues, fixed 0 issues)".to_string()));
}

#[test]
fn test_second_build_compares_against_first() {
    let history = InMemoryHistory::new();
    let overrides = InMemoryOverrides::new();
    let gates = [QualityGate::new(1, QualityGateType::New, QualityGateCriticality::Warning)];

    analyze_and_record(
        &history,
        &overrides,
        &gates,
        request(1, vec![issue("a", Severity::High), issue("b", Severity::Low)]),
    );
    let analysis = analyze_and_record(
        &history,
        &overrides,
        &gates,
        request(2, vec![issue("b", Severity::Low), issue("c", Severity::Error)]),
    );
    let result = &analysis.result;

    assert_eq!(result.reference_build.as_ref().map(|r| r.display_name()), Some("Job #1".to_string()));
    assert_eq!(result.new_size(), 1);
    assert_eq!(result.fixed_size(), 1);
    assert_eq!(result.outstanding_size(), 1);
    assert_eq!(result.statistics.new_error, 1);
    assert_eq!(result.statistics.delta_high, -1);
    assert_eq!(result.quality_gate_status(), QualityGateStatus::Warning);
    assert_eq!(analysis.outcome, BuildOutcome::Unstable);

    let references: Vec<Option<u32>> = result.issues.iter().map(|i| i.reference).collect();
    assert_eq!(references, vec![Some(1), Some(2)]);
    assert!(result
        .info_messages()
        .contains(&"Using reference build 'Job #1' to compute new, fixed, and outstanding issues".to_string()));
    assert!(result
        .info_messages()
        .contains(&"-> Some quality gates have been missed: overall result is WARNING".to_string()));
}

#[test]
fn test_reported_outcome_is_never_improved() {
    let history = InMemoryHistory::new();
    let overrides = InMemoryOverrides::new();

    let analysis = analyze_and_record(
        &history,
        &overrides,
        &[],
        request(1, Vec::new()).with_outcome(BuildOutcome::Failure),
    );

    assert_eq!(analysis.outcome, BuildOutcome::Failure);
    assert!(analysis
        .result
        .info_messages()
        .contains(&"No quality gates have been set - skipping".to_string()));
}

#[test]
fn test_since_builds_are_carried_over() {
    let history = InMemoryHistory::new();
    let overrides = InMemoryOverrides::new();
    let gates = [QualityGate::new(1, QualityGateType::Total, QualityGateCriticality::Failure)];

    let first = analyze_and_record(&history, &overrides, &gates, request(1, Vec::new()));
    let second = analyze_and_record(&history, &overrides, &gates, request(2, Vec::new()));
    let third = analyze_and_record(&history, &overrides, &gates, request(3, vec![issue("a", Severity::Low)]));
    let fourth = analyze_and_record(&history, &overrides, &gates, request(4, Vec::new()));

    assert_eq!(first.result.successful_since_build, Some(1));
    assert_eq!(second.result.successful_since_build, Some(1));
    assert_eq!(second.result.no_issues_since_build, Some(1));
    assert_eq!(third.result.successful_since_build, None);
    assert_eq!(third.result.no_issues_since_build, None);
    assert_eq!(fourth.result.successful_since_build, Some(4));
    assert_eq!(fourth.result.no_issues_since_build, Some(4));
}

#[test]
fn test_reset_makes_failed_build_the_reference_once() {
    let history = InMemoryHistory::new();
    let overrides = InMemoryOverrides::new();
    let gates = [QualityGate::new(1, QualityGateType::New, QualityGateCriticality::Failure)];

    analyze_and_record(&history, &overrides, &gates, request(1, vec![issue("a", Severity::Normal)]));
    let failed = analyze_and_record(
        &history,
        &overrides,
        &gates,
        request(2, vec![issue("a", Severity::Normal), issue("b", Severity::Normal)]),
    );
    assert_eq!(failed.outcome, BuildOutcome::Failure);

    let build = BuildRef::completed("Job", 2, failed.outcome).with_result(failed.result.clone());
    let command = ResetQualityGateCommand::new(&history, &overrides);
    assert!(command.is_enabled(&build, TOOL));
    command.reset(&build, TOOL).expect("Failed to reset reference");
    assert!(!command.is_enabled(&build, TOOL));

    let third = analyze_and_record(
        &history,
        &overrides,
        &gates,
        request(3, vec![issue("a", Severity::Normal), issue("b", Severity::Normal)]),
    );
    assert_eq!(third.result.reference_build.as_ref().map(|r| r.number), Some(2));
    assert_eq!(third.result.new_size(), 0);
    assert_eq!(third.outcome, BuildOutcome::Success);
    assert!(third
        .result
        .info_messages()
        .contains(&"Resetting reference build, ignoring quality gate result for one build".to_string()));
}

fn with_gate(build: u32, status: QualityGateStatus) -> BuildRef {
    let mut result = AnalysisResult::new("Job", build, TOOL);
    result.quality_gate = QualityGateResult {
        overall_status: status,
        outcomes: Vec::new(),
    };
    BuildRef::completed("Job", build, BuildOutcome::Unstable).with_result(result)
}

#[test]
fn test_reset_is_disabled_for_successful_gate() {
    let history = InMemoryHistory::new();
    history.record(with_gate(1, QualityGateStatus::Passed));
    let overrides = InMemoryOverrides::new();
    let command = ResetQualityGateCommand::new(&history, &overrides);

    assert!(!command.is_enabled(&with_gate(1, QualityGateStatus::Passed), TOOL));
    assert!(!command.is_enabled(&with_gate(1, QualityGateStatus::Passed), "other"));
    assert!(matches!(
        command.reset(&with_gate(1, QualityGateStatus::Passed), TOOL),
        Err(TidemarkError::ResetRejected { .. })
    ));
}

#[test]
fn test_reset_is_disabled_for_older_builds() {
    let history = InMemoryHistory::new();
    history.record(with_gate(1, QualityGateStatus::Warning));
    history.record(with_gate(2, QualityGateStatus::Warning));
    let overrides = InMemoryOverrides::new();
    let command = ResetQualityGateCommand::new(&history, &overrides);

    assert!(!command.is_enabled(&with_gate(1, QualityGateStatus::Warning), TOOL));
    assert!(command.is_enabled(&with_gate(2, QualityGateStatus::Warning), TOOL));
    assert!(!overrides
        .is_pending(&OverrideKey::new("Job", 2, TOOL))
        .expect("Failed to query overrides"));
}
