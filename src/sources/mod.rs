//! Providers of parsed issues

use std::fs;
use std::path::{Path, PathBuf};

use log::debug;
use serde::Deserialize;

use crate::errors::SourceError;
use crate::models::{Issue, IssueSet};

/// Something that produces the issues of one tool
///
/// The analysis core depends only on this trait, never on concrete report
/// formats.
pub trait IssueSource: Send + Sync {
    /// Tool id the issues are reported under
    fn id(&self) -> &str;

    /// Read or compute the issues
    fn produce(&self) -> Result<IssueSet, SourceError>;
}

/// Issues that are already in memory
#[derive(Debug, Clone)]
pub struct StaticIssueSource {
    issues: IssueSet,
}

impl StaticIssueSource {
    pub fn new(issues: IssueSet) -> Self {
        Self { issues }
    }
}

impl IssueSource for StaticIssueSource {
    fn id(&self) -> &str {
        &self.issues.id
    }

    fn produce(&self) -> Result<IssueSet, SourceError> {
        Ok(self.issues.clone())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum JsonReport {
    List(Vec<Issue>),
    Document { issues: Vec<Issue> },
}

/// Reads issues from a JSON report
///
/// The report is either a list of issues or an object with an `issues`
/// list. Issues without an origin are attributed to the source's tool id.
#[derive(Debug, Clone)]
pub struct JsonIssueSource {
    id: String,
    path: PathBuf,
}

impl JsonIssueSource {
    pub fn new(id: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            id: id.into(),
            path: path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Parse report content that has already been read
    pub fn parse(&self, content: &str) -> Result<IssueSet, SourceError> {
        let report: JsonReport = serde_json::from_str(content).map_err(|e| SourceError::Malformed {
            path: self.path.clone(),
            message: e.to_string(),
        })?;
        let issues = match report {
            JsonReport::List(issues) | JsonReport::Document { issues } => issues,
        };

        let mut set = IssueSet::new(self.id.clone());
        set.extend(issues.into_iter().map(|mut issue| {
            if issue.origin.is_empty() {
                issue.origin = self.id.clone();
            }
            issue
        }));
        set.log_info(format!(
            "Successfully parsed file {}: found {} issues",
            self.path.display(),
            set.len()
        ));
        Ok(set)
    }
}

impl IssueSource for JsonIssueSource {
    fn id(&self) -> &str {
        &self.id
    }

    fn produce(&self) -> Result<IssueSet, SourceError> {
        if !self.path.is_file() {
            return Err(SourceError::NotFound(self.path.clone()));
        }
        debug!("Reading issues of '{}' from {:?}", self.id, self.path);
        let content = fs::read_to_string(&self.path).map_err(|e| SourceError::Unreadable {
            path: self.path.clone(),
            message: e.to_string(),
        })?;
        self.parse(&content)
    }
}
