use pretty_assertions::assert_eq;
use rstest::rstest;
use tidemark::difference::{all_outstanding, classify, IssueDifferencer};
use tidemark::models::{BuildOutcome, BuildRef, Issue, IssueSet, Severity};

/// Issues carrying the given fingerprints; the message records the position
fn issues_with(fingerprints: &[&str]) -> IssueSet {
    IssueSet::with_issues(
        "checkstyle",
        fingerprints
            .iter()
            .enumerate()
            .map(|(position, fingerprint)| {
                Issue::new("Main.java", position + 1)
                    .with_message(format!("{}{}", fingerprint, position))
                    .with_fingerprint(*fingerprint)
            })
            .collect(),
    )
}

fn fingerprints(issues: &IssueSet) -> Vec<String> {
    issues
        .iter()
        .map(|issue| issue.fingerprint.clone().unwrap_or_default())
        .collect()
}

#[test]
fn test_multiset_classification() {
    let baseline = issues_with(&["a", "b", "b", "c"]);
    let current = issues_with(&["b", "c", "c", "d"]);

    let difference = classify(&current, &baseline, 2);

    assert_eq!(fingerprints(&difference.outstanding_issues), vec!["b", "c"]);
    assert_eq!(fingerprints(&difference.new_issues), vec!["c", "d"]);
    assert_eq!(fingerprints(&difference.fixed_issues), vec!["a", "b"]);
}

#[test]
fn test_duplicates_are_matched_in_reported_order() {
    let baseline = issues_with(&["x", "x"]);
    let current = issues_with(&["x"]);

    let difference = classify(&current, &baseline, 2);

    // The first baseline occurrence is consumed, the second one is fixed
    assert_eq!(difference.fixed_issues.len(), 1);
    assert_eq!(difference.fixed_issues.issues()[0].message, "x1");
    assert_eq!(difference.outstanding_issues.len(), 1);
}

#[rstest]
#[case(&[], &[])]
#[case(&["a"], &[])]
#[case(&[], &["a"])]
#[case(&["a", "a", "a"], &["a"])]
#[case(&["a", "b", "c"], &["c", "b", "a"])]
#[case(&["a", "b", "b", "c"], &["b", "c", "c", "d"])]
#[case(&["p", "q"], &["r", "s", "p", "p"])]
fn test_partition_law(#[case] baseline: &[&str], #[case] current: &[&str]) {
    let baseline = issues_with(baseline);
    let current = issues_with(current);

    let difference = classify(&current, &baseline, 7);

    assert_eq!(
        current.len(),
        difference.new_issues.len() + difference.outstanding_issues.len()
    );
    assert_eq!(
        baseline.len(),
        difference.fixed_issues.len() + difference.outstanding_issues.len()
    );

    let mut reassembled = fingerprints(&difference.new_issues);
    reassembled.extend(fingerprints(&difference.outstanding_issues));
    reassembled.sort();
    let mut expected = fingerprints(&current);
    expected.sort();
    assert_eq!(reassembled, expected);
}

#[test]
fn test_first_build_treats_everything_as_outstanding() {
    let current = issues_with(&["a", "b"]);
    let mut log = IssueSet::new("checkstyle");

    let difference = IssueDifferencer::compute(&current, None, 1, &mut log);

    assert!(difference.new_issues.is_empty());
    assert!(difference.fixed_issues.is_empty());
    assert_eq!(fingerprints(&difference.outstanding_issues), vec!["a", "b"]);
    assert!(!difference.has_reference());
    assert_eq!(
        log.info_messages(),
        &[
            "No valid reference build found".to_string(),
            "All reported issues will be considered outstanding".to_string(),
        ]
    );
    assert!(!log.has_errors());
}

#[test]
fn test_delta_report_messages() {
    let reference = BuildRef::completed("Job", 2, BuildOutcome::Success);
    let baseline = issues_with(&["a", "b"]);
    let current = issues_with(&["b", "c", "d"]);
    let mut log = IssueSet::new("checkstyle");

    IssueDifferencer::compute(&current, Some((&reference, &baseline)), 3, &mut log);

    assert_eq!(
        log.info_messages(),
        &[
            "Using reference build 'Job #2' to compute new, fixed, and outstanding issues".to_string(),
            "Issues delta (vs. reference build): outstanding: 1, new: 2, fixed: 1".to_string(),
        ]
    );
}

#[test]
fn test_references_follow_the_first_occurrence() {
    let mut baseline = issues_with(&["a"]);
    baseline.issues_mut()[0].reference = Some(4);
    let mut current = issues_with(&["a", "b"]);

    let difference = classify(&current, &baseline, 9);
    difference.apply_references(&mut current);

    assert_eq!(difference.outstanding_issues.issues()[0].reference, Some(4));
    assert_eq!(difference.new_issues.issues()[0].reference, Some(9));
    assert_eq!(
        current.iter().map(|issue| issue.reference).collect::<Vec<_>>(),
        vec![Some(4), Some(9)]
    );
}

#[test]
fn test_issues_without_fingerprint_match_structurally() {
    let issue = Issue::new("Main.java", 10)
        .with_severity(Severity::High)
        .with_message("null dereference");
    let baseline = IssueSet::with_issues("spotbugs", vec![issue.clone()]);
    let current = IssueSet::with_issues(
        "spotbugs",
        vec![issue.clone(), issue.clone().with_message("resource leak")],
    );

    let difference = classify(&current, &baseline, 2);

    assert_eq!(difference.outstanding_issues.len(), 1);
    assert_eq!(difference.new_issues.len(), 1);
    assert_eq!(difference.new_issues.issues()[0].message, "resource leak");
    assert!(difference.fixed_issues.is_empty());
}

#[test]
fn test_statistics_deltas_require_reference() {
    let baseline = IssueSet::with_issues(
        "pmd",
        vec![
            Issue::new("A.java", 1).with_severity(Severity::High).with_fingerprint("a"),
            Issue::new("A.java", 2).with_severity(Severity::Low).with_fingerprint("b"),
        ],
    );
    let current = IssueSet::with_issues(
        "pmd",
        vec![
            Issue::new("A.java", 1).with_severity(Severity::High).with_fingerprint("a"),
            Issue::new("A.java", 5).with_severity(Severity::High).with_fingerprint("c"),
            Issue::new("A.java", 6).with_severity(Severity::Error).with_fingerprint("d"),
        ],
    );

    let difference = classify(&current, &baseline, 2);
    let statistics = difference.statistics(&current, Some(&baseline));
    assert_eq!(statistics.total(), 3);
    assert_eq!(statistics.new_total(), 2);
    assert_eq!(statistics.new_error, 1);
    assert_eq!(statistics.fixed, 1);
    assert_eq!(statistics.delta_high, 1);
    assert_eq!(statistics.delta_low, -1);
    assert_eq!(statistics.delta_error, 1);
    assert_eq!(statistics.delta_total(), 1);

    let first_build = all_outstanding(&current, 1);
    let statistics = first_build.statistics(&current, Some(&baseline));
    assert_eq!(statistics.total(), 3);
    assert_eq!(statistics.new_total(), 0);
    assert_eq!(statistics.delta_total(), 0);
}
