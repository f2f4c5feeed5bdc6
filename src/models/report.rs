//! Ordered issue collections with attached log messages

use std::collections::{BTreeMap, HashMap, VecDeque};

use log::debug;
use serde::{Deserialize, Serialize};

use super::{Issue, Severity};

/// The issues of one build for one tool, in the order they were reported
///
/// Duplicate fingerprints are kept as distinct occurrences. Informational and
/// error messages produced while processing the set travel along with it so
/// they can be printed to the build log afterwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IssueSet {
    /// Tool id the issues belong to
    pub id: String,

    #[serde(default)]
    issues: Vec<Issue>,

    #[serde(default)]
    info_messages: Vec<String>,

    #[serde(default)]
    error_messages: Vec<String>,
}

impl IssueSet {
    /// Create an empty set for the given tool id
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// Create a set that contains the given issues
    pub fn with_issues(id: impl Into<String>, issues: Vec<Issue>) -> Self {
        Self {
            id: id.into(),
            issues,
            ..Self::default()
        }
    }

    /// Create an empty set with the same id and no messages
    pub fn copy_empty(&self) -> Self {
        Self::new(self.id.clone())
    }

    pub fn add(&mut self, issue: Issue) {
        self.issues.push(issue);
    }

    pub fn extend(&mut self, issues: impl IntoIterator<Item = Issue>) {
        self.issues.extend(issues);
    }

    pub fn len(&self) -> usize {
        self.issues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    pub fn issues_mut(&mut self) -> &mut [Issue] {
        &mut self.issues
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Issue> {
        self.issues.iter()
    }

    pub fn into_issues(self) -> Vec<Issue> {
        self.issues
    }

    /// Sort the issues with the given comparator, keeping equal elements in place
    pub fn sort_by<F>(&mut self, compare: F)
    where
        F: FnMut(&Issue, &Issue) -> std::cmp::Ordering,
    {
        self.issues.sort_by(compare);
    }

    /// Number of issues with the given severity
    pub fn size_of(&self, severity: Severity) -> usize {
        self.issues.iter().filter(|i| i.severity == severity).count()
    }

    /// Number of issues per reporting tool
    pub fn size_per_origin(&self) -> BTreeMap<String, usize> {
        let mut sizes = BTreeMap::new();
        for issue in &self.issues {
            *sizes.entry(issue.origin.clone()).or_insert(0) += 1;
        }
        sizes
    }

    /// Positions of all occurrences per fingerprint, in insertion order
    ///
    /// Issues without a fingerprint are not indexed.
    pub fn fingerprint_index(&self) -> HashMap<&str, VecDeque<usize>> {
        let mut index: HashMap<&str, VecDeque<usize>> = HashMap::new();
        for (position, issue) in self.issues.iter().enumerate() {
            if let Some(fingerprint) = issue.fingerprint.as_deref().filter(|f| !f.is_empty()) {
                index.entry(fingerprint).or_default().push_back(position);
            }
        }
        index
    }

    /// Append an informational message
    pub fn log_info(&mut self, message: impl Into<String>) {
        let message = message.into();
        debug!("[{}] {}", self.id, message);
        self.info_messages.push(message);
    }

    /// Append an error message
    pub fn log_error(&mut self, message: impl Into<String>) {
        let message = message.into();
        debug!("[{}] error: {}", self.id, message);
        self.error_messages.push(message);
    }

    pub fn info_messages(&self) -> &[String] {
        &self.info_messages
    }

    pub fn error_messages(&self) -> &[String] {
        &self.error_messages
    }

    pub fn has_errors(&self) -> bool {
        !self.error_messages.is_empty()
    }

    /// Copy the log messages of another set into this one
    pub fn merge_log_messages(&mut self, other: &IssueSet) {
        self.info_messages.extend(other.info_messages.iter().cloned());
        self.error_messages.extend(other.error_messages.iter().cloned());
    }
}

impl<'a> IntoIterator for &'a IssueSet {
    type Item = &'a Issue;
    type IntoIter = std::slice::Iter<'a, Issue>;

    fn into_iter(self) -> Self::IntoIter {
        self.issues.iter()
    }
}
