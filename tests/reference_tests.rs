use mockall::mock;
use mockall::predicate::eq;
use tidemark::errors::HistoryError;
use tidemark::history::{BuildHistory, InMemoryHistory, InMemoryOverrides, OverrideKey, ReferenceOverrides};
use tidemark::models::{AnalysisResult, BuildOutcome, BuildRef, IssueSet};
use tidemark::quality_gate::{QualityGateResult, QualityGateStatus};
use tidemark::reference::{ReferencePolicy, ReferenceResolver, Resolution};

mock! {
    pub History {}

    impl BuildHistory for History {
        fn builds(&self, job: &str) -> Result<Vec<BuildRef>, HistoryError>;
        fn has_job(&self, job: &str) -> Result<bool, HistoryError>;
    }
}

const TOOL: &str = "checkstyle";

fn analyzed(job: &str, number: u32, outcome: BuildOutcome, gate: QualityGateStatus) -> BuildRef {
    let mut result = AnalysisResult::new(job, number, TOOL);
    result.quality_gate = QualityGateResult {
        overall_status: gate,
        outcomes: Vec::new(),
    };
    BuildRef::completed(job, number, outcome).with_result(result)
}

fn resolved_number(resolution: &Resolution) -> Option<u32> {
    resolution.build().map(|build| build.number)
}

fn resolve(history: &dyn BuildHistory, overrides: &dyn ReferenceOverrides, policy: &ReferencePolicy, current: u32) -> (Resolution, IssueSet) {
    let mut log = IssueSet::new(TOOL);
    let resolution = ReferenceResolver::new(history, overrides, policy).resolve("Job", current, TOOL, &mut log);
    (resolution, log)
}

#[test]
fn test_walks_back_to_first_successful_gate() {
    let history = InMemoryHistory::new();
    history.record(analyzed("Job", 1, BuildOutcome::Success, QualityGateStatus::Passed));
    history.record(analyzed("Job", 2, BuildOutcome::Success, QualityGateStatus::Failed));
    history.record(BuildRef::running("Job", 3));
    let overrides = InMemoryOverrides::new();

    let (resolution, log) = resolve(&history, &overrides, &ReferencePolicy::default(), 4);

    assert_eq!(resolved_number(&resolution), Some(1));
    assert_eq!(
        log.info_messages(),
        &[
            "Quality gate failed for reference build 'Job #2', analyzing previous builds".to_string(),
            "Quality gate successful for reference build 'Job #1', using this build as reference".to_string(),
        ]
    );
}

#[test]
fn test_note_status_is_not_successful() {
    let history = InMemoryHistory::new();
    history.record(analyzed("Job", 1, BuildOutcome::Success, QualityGateStatus::Inactive));
    history.record(analyzed("Job", 2, BuildOutcome::Success, QualityGateStatus::Note));
    let overrides = InMemoryOverrides::new();

    let (resolution, _) = resolve(&history, &overrides, &ReferencePolicy::default(), 3);

    assert_eq!(resolved_number(&resolution), Some(1));
}

#[test]
fn test_ignore_quality_gate_accepts_missed_gate() {
    let history = InMemoryHistory::new();
    history.record(analyzed("Job", 1, BuildOutcome::Success, QualityGateStatus::Passed));
    history.record(analyzed("Job", 2, BuildOutcome::Failure, QualityGateStatus::Failed));
    let overrides = InMemoryOverrides::new();
    let policy = ReferencePolicy {
        ignore_quality_gate: true,
        ..ReferencePolicy::default()
    };

    let (resolution, log) = resolve(&history, &overrides, &policy, 3);

    assert_eq!(resolved_number(&resolution), Some(2));
    assert!(log
        .info_messages()
        .contains(&"Quality gate has been missed for reference build 'Job #2', but is configured to be ignored".to_string()));
}

#[test]
fn test_overall_result_must_be_success() {
    let history = InMemoryHistory::new();
    history.record(analyzed("Job", 1, BuildOutcome::Success, QualityGateStatus::Passed));
    history.record(analyzed("Job", 2, BuildOutcome::Unstable, QualityGateStatus::Passed));
    let overrides = InMemoryOverrides::new();

    let (default_resolution, _) = resolve(&history, &overrides, &ReferencePolicy::default(), 3);
    assert_eq!(resolved_number(&default_resolution), Some(2));

    let strict = ReferencePolicy {
        overall_must_be_success: true,
        ..ReferencePolicy::default()
    };
    let (strict_resolution, _) = resolve(&history, &overrides, &strict, 3);
    assert_eq!(resolved_number(&strict_resolution), Some(1));
}

#[test]
fn test_failed_builds_are_skipped_by_default() {
    let history = InMemoryHistory::new();
    history.record(analyzed("Job", 1, BuildOutcome::Failure, QualityGateStatus::Passed));
    let overrides = InMemoryOverrides::new();

    let (resolution, log) = resolve(&history, &overrides, &ReferencePolicy::default(), 2);

    assert_eq!(resolution, Resolution::Exhausted);
    assert_eq!(
        log.info_messages().last().map(String::as_str),
        Some("No reference build with successful quality gate found, skipping delta computation")
    );
    assert!(!log.has_errors());
}

#[test]
fn test_builds_without_result_are_skipped() {
    let history = InMemoryHistory::new();
    history.record(analyzed("Job", 1, BuildOutcome::Success, QualityGateStatus::Passed));
    history.record(BuildRef::completed("Job", 2, BuildOutcome::Success));
    let overrides = InMemoryOverrides::new();

    let (resolution, log) = resolve(&history, &overrides, &ReferencePolicy::default(), 3);

    assert_eq!(resolved_number(&resolution), Some(1));
    assert_eq!(
        log.info_messages()[0],
        "Reference build 'Job #2' does not contain a result for 'checkstyle', analyzing previous builds"
    );
}

#[test]
fn test_reset_override_is_used_exactly_once() {
    let history = InMemoryHistory::new();
    history.record(analyzed("Job", 1, BuildOutcome::Success, QualityGateStatus::Passed));
    history.record(analyzed("Job", 2, BuildOutcome::Unstable, QualityGateStatus::Warning));
    let overrides = InMemoryOverrides::new();
    overrides
        .mark(OverrideKey::new("Job", 2, TOOL))
        .expect("Failed to mark reset");

    let (first, log) = resolve(&history, &overrides, &ReferencePolicy::default(), 3);
    assert_eq!(resolved_number(&first), Some(2));
    assert_eq!(
        log.info_messages(),
        &["Resetting reference build, ignoring quality gate result for one build".to_string()]
    );

    let (second, _) = resolve(&history, &overrides, &ReferencePolicy::default(), 3);
    assert_eq!(resolved_number(&second), Some(1));
}

#[test]
fn test_reset_for_other_tool_is_not_consumed() {
    let history = InMemoryHistory::new();
    history.record(analyzed("Job", 1, BuildOutcome::Success, QualityGateStatus::Passed));
    history.record(analyzed("Job", 2, BuildOutcome::Unstable, QualityGateStatus::Warning));
    let overrides = InMemoryOverrides::new();
    let other = OverrideKey::new("Job", 2, "pmd");
    overrides.mark(other.clone()).expect("Failed to mark reset");

    let (resolution, _) = resolve(&history, &overrides, &ReferencePolicy::default(), 3);

    assert_eq!(resolved_number(&resolution), Some(1));
    assert!(overrides.is_pending(&other).expect("Failed to query overrides"));
}

#[test]
fn test_reference_job_is_used() {
    let history = InMemoryHistory::new();
    history.record(analyzed("Job", 1, BuildOutcome::Success, QualityGateStatus::Passed));
    history.record(analyzed("main", 7, BuildOutcome::Success, QualityGateStatus::Passed));
    let overrides = InMemoryOverrides::new();
    let policy = ReferencePolicy {
        job: Some("main".to_string()),
        ..ReferencePolicy::default()
    };

    let (resolution, log) = resolve(&history, &overrides, &policy, 2);

    let build = resolution.build().expect("Expected a reference build");
    assert_eq!(build.display_name(), "main #7");
    assert_eq!(log.info_messages()[0], "Configured reference job: 'main'");
}

#[test]
fn test_reset_applies_to_own_job_when_reference_job_is_configured() {
    let history = InMemoryHistory::new();
    history.record(analyzed("Job", 2, BuildOutcome::Failure, QualityGateStatus::Failed));
    history.record(analyzed("main", 7, BuildOutcome::Success, QualityGateStatus::Passed));
    let overrides = InMemoryOverrides::new();
    let key = OverrideKey::new("Job", 2, TOOL);
    overrides.mark(key.clone()).expect("Failed to mark reset");
    let policy = ReferencePolicy {
        job: Some("main".to_string()),
        ..ReferencePolicy::default()
    };

    let (first, log) = resolve(&history, &overrides, &policy, 3);
    assert_eq!(first.build().map(BuildRef::display_name).as_deref(), Some("Job #2"));
    assert_eq!(log.info_messages()[0], "Resetting reference build, ignoring quality gate result for one build");
    assert!(!overrides.is_pending(&key).expect("Failed to query overrides"));

    let (second, _) = resolve(&history, &overrides, &policy, 3);
    assert_eq!(second.build().map(BuildRef::display_name).as_deref(), Some("main #7"));
}

#[test]
fn test_missing_reference_job_is_not_an_error() {
    let mut history = MockHistory::new();
    history.expect_has_job().with(eq("main")).times(1).returning(|_| Ok(false));
    history.expect_builds().with(eq("Job")).returning(|_| Ok(Vec::new()));
    history.expect_builds().with(eq("main")).times(0);
    let overrides = InMemoryOverrides::new();
    let policy = ReferencePolicy {
        job: Some("main".to_string()),
        ..ReferencePolicy::default()
    };

    let (resolution, log) = resolve(&history, &overrides, &policy, 2);

    assert_eq!(resolution, Resolution::Exhausted);
    assert!(log.info_messages().contains(&"Reference job 'main' not found".to_string()));
    assert!(!log.has_errors());
}

#[test]
fn test_reference_job_without_builds() {
    let mut history = MockHistory::new();
    history.expect_has_job().returning(|_| Ok(true));
    history.expect_builds().returning(|_| Ok(Vec::new()));
    let overrides = InMemoryOverrides::new();
    let policy = ReferencePolicy {
        job: Some("main".to_string()),
        ..ReferencePolicy::default()
    };

    let (resolution, log) = resolve(&history, &overrides, &policy, 2);

    assert_eq!(resolution, Resolution::Exhausted);
    assert!(log.info_messages().contains(&"Reference job 'main' has no builds".to_string()));
}

#[test]
fn test_history_failure_degrades_to_no_reference() {
    let mut history = MockHistory::new();
    history.expect_builds().returning(|job| {
        Err(HistoryError::BuildNotFound {
            job: job.to_string(),
            number: 1,
        })
    });
    let overrides = InMemoryOverrides::new();

    let (resolution, log) = resolve(&history, &overrides, &ReferencePolicy::default(), 2);

    assert_eq!(resolution, Resolution::Exhausted);
    assert!(log.has_errors());
    assert!(log.error_messages()[0].starts_with("Errors while resolving the reference build"));
}
