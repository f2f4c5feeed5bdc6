//! Core data models for Tidemark

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

pub mod build;
pub mod report;
pub mod results;

pub use build::*;
pub use report::*;
pub use results::*;

/// Severity levels for issues, ordered from `Low` to `Error`
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
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Severity {
    /// Low priority warning
    Low,

    /// Normal priority warning
    Normal,

    /// High priority warning
    High,

    /// Errors
    Error,
}

impl Default for Severity {
    fn default() -> Self {
        Self::Normal
    }
}

impl Severity {
    /// Get the color name for this severity
    pub fn color_name(&self) -> &'static str {
        match self {
            Severity::Error => "red",
            Severity::High => "yellow",
            Severity::Normal => "blue",
            Severity::Low => "magenta",
        }
    }
}

/// A single static analysis finding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Issue {
    /// File where the issue was reported
    #[serde(default)]
    pub file_name: String,

    /// First line (1-indexed, 0 if unknown)
    #[serde(default)]
    pub line_start: usize,

    /// Last line (1-indexed, 0 if unknown)
    #[serde(default)]
    pub line_end: usize,

    /// First column (1-indexed, 0 if unknown)
    #[serde(default)]
    pub column_start: usize,

    /// Last column (1-indexed, 0 if unknown)
    #[serde(default)]
    pub column_end: usize,

    /// Severity of the issue
    #[serde(default)]
    pub severity: Severity,

    /// Category, e.g. the rule set
    #[serde(default)]
    pub category: String,

    /// Type, e.g. the rule id
    #[serde(default, rename = "type")]
    pub issue_type: String,

    /// Issue message
    #[serde(default)]
    pub message: String,

    /// Longer description
    #[serde(default)]
    pub description: String,

    /// Package or namespace
    #[serde(default)]
    pub package_name: String,

    /// Module the file belongs to
    #[serde(default)]
    pub module_name: String,

    /// Tool that reported the issue
    #[serde(default)]
    pub origin: String,

    /// Content fingerprint, assigned by the fingerprinter
    #[serde(default)]
    pub fingerprint: Option<String>,

    /// Build in which the issue first showed up
    #[serde(default)]
    pub reference: Option<u32>,
}

impl Issue {
    /// Create an issue for the given file and line
    pub fn new(file_name: impl Into<String>, line: usize) -> Self {
        Self {
            file_name: file_name.into(),
            line_start: line,
            line_end: line,
            ..Self::default()
        }
    }

    /// Set the severity
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// Set category and type
    pub fn with_category(mut self, category: impl Into<String>, issue_type: impl Into<String>) -> Self {
        self.category = category.into();
        self.issue_type = issue_type.into();
        self
    }

    /// Set the message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Set the package name
    pub fn with_package(mut self, package_name: impl Into<String>) -> Self {
        self.package_name = package_name.into();
        self
    }

    /// Set the origin tool
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = origin.into();
        self
    }

    /// Set the fingerprint
    pub fn with_fingerprint(mut self, fingerprint: impl Into<String>) -> Self {
        self.fingerprint = Some(fingerprint.into());
        self
    }

    /// Whether a fingerprint has been assigned
    pub fn has_fingerprint(&self) -> bool {
        self.fingerprint.as_deref().is_some_and(|f| !f.is_empty())
    }

    /// Structural equality: all properties except fingerprint and reference
    pub fn same_as(&self, other: &Issue) -> bool {
        self.file_name == other.file_name
            && self.line_start == other.line_start
            && self.line_end == other.line_end
            && self.column_start == other.column_start
            && self.column_end == other.column_end
            && self.severity == other.severity
            && self.category == other.category
            && self.issue_type == other.issue_type
            && self.message == other.message
            && self.description == other.description
            && self.package_name == other.package_name
            && self.module_name == other.module_name
            && self.origin == other.origin
    }
}
