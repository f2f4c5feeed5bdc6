//! Merging of issue sets produced by parallel branches of one build

use std::collections::BTreeMap;

use log::{debug, warn};

use crate::models::{Issue, IssueSet, Severity};

/// The result one branch delivered, `None` if the branch produced nothing
#[derive(Debug, Clone, PartialEq)]
pub struct BranchContribution {
    pub branch: String,
    pub issues: Option<IssueSet>,
}

impl BranchContribution {
    pub fn new(branch: impl Into<String>, issues: IssueSet) -> Self {
        Self {
            branch: branch.into(),
            issues: Some(issues),
        }
    }

    /// A branch that did not contribute a result, e.g. because it failed
    pub fn missing(branch: impl Into<String>) -> Self {
        Self {
            branch: branch.into(),
            issues: None,
        }
    }
}

/// Issues of all branches, combined and per branch
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedIssues {
    branches: BTreeMap<String, IssueSet>,
    combined: IssueSet,
}

impl AggregatedIssues {
    /// All issues, ordered by branch id
    pub fn combined(&self) -> &IssueSet {
        &self.combined
    }

    pub fn into_combined(self) -> IssueSet {
        self.combined
    }

    pub fn total(&self) -> usize {
        self.combined.len()
    }

    /// Number of issues a branch contributed, `None` for unknown branches
    pub fn branch_total(&self, branch: &str) -> Option<usize> {
        self.branches.get(branch).map(IssueSet::len)
    }

    /// Issue count per branch, ordered by branch id
    pub fn branch_totals(&self) -> BTreeMap<String, usize> {
        self.branches
            .iter()
            .map(|(branch, issues)| (branch.clone(), issues.len()))
            .collect()
    }

    pub fn branch(&self, branch: &str) -> Option<&IssueSet> {
        self.branches.get(branch)
    }
}

/// Merge the contributions of all branches into one issue set for `tool_id`
///
/// Placement depends only on the branch id, never on the order of
/// `contributions`. Missing contributions count as empty branches.
pub fn merge(tool_id: &str, contributions: Vec<BranchContribution>) -> AggregatedIssues {
    let mut grouped: BTreeMap<String, Vec<IssueSet>> = BTreeMap::new();
    let mut missing = Vec::new();

    for contribution in contributions {
        let group = grouped.entry(contribution.branch.clone()).or_default();
        match contribution.issues {
            Some(issues) => group.push(issues),
            None => missing.push(contribution.branch),
        }
    }
    let contributed = grouped.values().any(|group| !group.is_empty());

    // Several contributions to the same branch must not depend on arrival order
    let mut branches: BTreeMap<String, IssueSet> = BTreeMap::new();
    for (branch, mut group) in grouped {
        group.sort_by(|a, b| {
            (a.info_messages(), a.error_messages()).cmp(&(b.info_messages(), b.error_messages()))
        });
        let mut issues = IssueSet::new(tool_id);
        for contribution in group {
            issues.merge_log_messages(&contribution);
            issues.extend(contribution.into_issues());
        }
        issues.sort_by(compare_issues);
        branches.insert(branch, issues);
    }

    let mut combined = IssueSet::new(tool_id);
    for (branch, issues) in &branches {
        debug!("Branch '{}' contributed {} issues", branch, issues.len());
        combined.merge_log_messages(issues);
        combined.extend(issues.iter().cloned());
    }

    missing.sort();
    missing.dedup();
    for branch in missing {
        combined.log_info(format!("Branch '{}' did not contribute a result", branch));
    }

    if !contributed {
        warn!("No branch contributed issues for '{}'", tool_id);
        combined.log_error("No issues found in any branch: no files found");
    }

    AggregatedIssues { branches, combined }
}

fn compare_issues(a: &Issue, b: &Issue) -> std::cmp::Ordering {
    sort_key(a).cmp(&sort_key(b))
}

/// Every field of an issue: location first, then its properties
type SortKey<'a> = (
    (&'a str, usize, usize, usize, usize, Severity),
    (&'a str, &'a str, &'a str, &'a str, &'a str, &'a str, &'a str, Option<&'a str>, Option<u32>),
);

fn sort_key(issue: &Issue) -> SortKey<'_> {
    (
        (
            &issue.file_name,
            issue.line_start,
            issue.line_end,
            issue.column_start,
            issue.column_end,
            issue.severity,
        ),
        (
            &issue.category,
            &issue.issue_type,
            &issue.message,
            &issue.description,
            &issue.package_name,
            &issue.module_name,
            &issue.origin,
            issue.fingerprint.as_deref(),
            issue.reference,
        ),
    )
}
