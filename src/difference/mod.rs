//! Classification of issues into new, fixed, and outstanding

use std::collections::{HashMap, VecDeque};

use log::debug;

use crate::models::{BuildRef, Issue, IssueSet, IssueStatistics, Severity};

/// The three-way split of a build's issues against its reference
#[derive(Debug, Clone, PartialEq)]
pub struct IssueDifference {
    /// Current issues without a counterpart in the reference
    pub new_issues: IssueSet,

    /// Reference issues without a counterpart in the current build
    pub fixed_issues: IssueSet,

    /// Current issues that were matched with a reference issue
    pub outstanding_issues: IssueSet,

    /// Reference assigned to each current issue, in reported order
    references: Vec<Option<u32>>,

    has_reference: bool,
}

impl IssueDifference {
    /// Whether the classification was computed against a reference build
    pub fn has_reference(&self) -> bool {
        self.has_reference
    }

    /// Copy the assigned references onto the issues they were computed for
    pub fn apply_references(&self, current: &mut IssueSet) {
        for (issue, reference) in current.issues_mut().iter_mut().zip(&self.references) {
            issue.reference = *reference;
        }
    }

    /// Counts used by the quality gates
    ///
    /// `current` is the complete issue set of the build, `baseline` the set
    /// of the reference build. Deltas stay zero without a reference.
    pub fn statistics(&self, current: &IssueSet, baseline: Option<&IssueSet>) -> IssueStatistics {
        let mut statistics = IssueStatistics {
            total_error: current.size_of(Severity::Error),
            total_high: current.size_of(Severity::High),
            total_normal: current.size_of(Severity::Normal),
            total_low: current.size_of(Severity::Low),
            new_error: self.new_issues.size_of(Severity::Error),
            new_high: self.new_issues.size_of(Severity::High),
            new_normal: self.new_issues.size_of(Severity::Normal),
            new_low: self.new_issues.size_of(Severity::Low),
            fixed: self.fixed_issues.len(),
            ..IssueStatistics::default()
        };

        if let Some(baseline) = baseline.filter(|_| self.has_reference) {
            let delta = |severity| current.size_of(severity) as i64 - baseline.size_of(severity) as i64;
            statistics.delta_error = delta(Severity::Error);
            statistics.delta_high = delta(Severity::High);
            statistics.delta_normal = delta(Severity::Normal);
            statistics.delta_low = delta(Severity::Low);
        }
        statistics
    }
}

/// Match the current issues against the issues of the reference build
///
/// Issues are matched by fingerprint; issues without one are matched by
/// their properties. Each baseline occurrence matches at most one current
/// issue, in the order both sets were reported. Matched issues keep the
/// reference of the baseline occurrence, all others get `current_build`.
pub fn classify(current: &IssueSet, baseline: &IssueSet, current_build: u32) -> IssueDifference {
    let mut new_issues = current.copy_empty();
    let mut outstanding_issues = current.copy_empty();

    let mut by_fingerprint: HashMap<&str, VecDeque<usize>> = baseline.fingerprint_index();
    let mut consumed = vec![false; baseline.len()];
    let mut references = Vec::with_capacity(current.len());

    for issue in current {
        let matched = match issue.fingerprint.as_deref().filter(|f| !f.is_empty()) {
            Some(fingerprint) => by_fingerprint
                .get_mut(fingerprint)
                .and_then(VecDeque::pop_front),
            None => find_structural_match(issue, baseline, &consumed),
        };

        match matched {
            Some(position) => {
                consumed[position] = true;
                let mut outstanding = issue.clone();
                outstanding.reference = baseline.issues()[position].reference.or(Some(current_build));
                references.push(outstanding.reference);
                outstanding_issues.add(outstanding);
            }
            None => {
                let mut new_issue = issue.clone();
                new_issue.reference = Some(current_build);
                references.push(new_issue.reference);
                new_issues.add(new_issue);
            }
        }
    }

    let mut fixed_issues = baseline.copy_empty();
    fixed_issues.extend(
        baseline
            .iter()
            .zip(&consumed)
            .filter(|(_, consumed)| !**consumed)
            .map(|(issue, _)| issue.clone()),
    );

    debug!(
        "Classified {} issues against {} reference issues: {} new, {} fixed, {} outstanding",
        current.len(),
        baseline.len(),
        new_issues.len(),
        fixed_issues.len(),
        outstanding_issues.len()
    );

    IssueDifference {
        new_issues,
        fixed_issues,
        outstanding_issues,
        references,
        has_reference: true,
    }
}

fn find_structural_match(issue: &Issue, baseline: &IssueSet, consumed: &[bool]) -> Option<usize> {
    baseline
        .iter()
        .zip(consumed)
        .position(|(candidate, consumed)| {
            !*consumed && !candidate.has_fingerprint() && candidate.same_as(issue)
        })
}

/// Classification for a build without reference: everything is outstanding
pub fn all_outstanding(current: &IssueSet, current_build: u32) -> IssueDifference {
    let mut outstanding_issues = current.copy_empty();
    outstanding_issues.extend(current.iter().cloned().map(|mut issue| {
        issue.reference = Some(current_build);
        issue
    }));

    IssueDifference {
        new_issues: current.copy_empty(),
        fixed_issues: current.copy_empty(),
        outstanding_issues,
        references: vec![Some(current_build); current.len()],
        has_reference: false,
    }
}

/// Computes the delta of a build against its resolved reference
///
/// Writes the delta report lines to `log`.
pub struct IssueDifferencer;

impl IssueDifferencer {
    pub fn compute(
        current: &IssueSet,
        reference: Option<(&BuildRef, &IssueSet)>,
        current_build: u32,
        log: &mut IssueSet,
    ) -> IssueDifference {
        let Some((build, baseline)) = reference else {
            log.log_info("No valid reference build found");
            log.log_info("All reported issues will be considered outstanding");
            return all_outstanding(current, current_build);
        };

        log.log_info(format!(
            "Using reference build '{}' to compute new, fixed, and outstanding issues",
            build.display_name()
        ));
        let difference = classify(current, baseline, current_build);
        log.log_info(format!(
            "Issues delta (vs. reference build): outstanding: {}, new: {}, fixed: {}",
            difference.outstanding_issues.len(),
            difference.new_issues.len(),
            difference.fixed_issues.len()
        ));
        difference
    }
}
