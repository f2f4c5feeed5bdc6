//! Content based issue fingerprints
//!
//! A fingerprint identifies an issue across builds. When the affected source
//! file can be read, the fingerprint is a hash of the lines surrounding the
//! reported line, so it survives unrelated edits that only shift line
//! numbers. Otherwise it falls back to a hash of the issue's properties.
//!
//! The number of context lines is part of the identity: changing it changes
//! every context fingerprint and therefore what counts as the same issue.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::debug;
use rayon::prelude::*;
use sha2::{Digest, Sha256};

use crate::errors::SourceError;
use crate::models::{Issue, IssueSet};

/// Number of lines before and after the reported line that form the context
pub const DEFAULT_LINES_LOOK_AHEAD: usize = 3;

const FULL_PREFIX: &str = "FULL-";
const FALLBACK_PREFIX: &str = "FALLBACK-";

/// Reads the lines of affected source files
pub trait SourceReader: Send + Sync {
    fn read_lines(&self, file_name: &str) -> Result<Vec<String>, SourceError>;
}

/// Reads source files from disk, resolving relative names against a root
#[derive(Debug, Clone, Default)]
pub struct FileSourceReader {
    root: Option<PathBuf>,
}

impl FileSourceReader {
    pub fn new() -> Self {
        Self { root: None }
    }

    /// Resolve relative file names against `root`
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = Some(root.into());
        self
    }

    fn resolve(&self, file_name: &str) -> PathBuf {
        let path = Path::new(file_name);
        match &self.root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path.to_path_buf(),
        }
    }
}

impl SourceReader for FileSourceReader {
    fn read_lines(&self, file_name: &str) -> Result<Vec<String>, SourceError> {
        let path = self.resolve(file_name);
        if !path.is_file() {
            return Err(SourceError::NotFound(path));
        }

        let bytes = fs::read(&path).map_err(|e| SourceError::Unreadable {
            path: path.clone(),
            message: e.to_string(),
        })?;

        Ok(String::from_utf8_lossy(&bytes)
            .lines()
            .map(str::to_string)
            .collect())
    }
}

/// Compute the fingerprint of an issue
///
/// Uses the lines `[line - look_ahead, line + look_ahead]` (clamped to the
/// file) when `source_lines` is available and the reported line lies inside
/// the file, the content independent fallback otherwise.
pub fn compute_fingerprint(issue: &Issue, source_lines: Option<&[String]>, look_ahead: usize) -> String {
    match source_lines {
        Some(lines) if issue.line_start >= 1 && issue.line_start <= lines.len() => {
            context_fingerprint(lines, issue.line_start, look_ahead)
        }
        _ => fallback_fingerprint(issue),
    }
}

fn context_fingerprint(lines: &[String], line: usize, look_ahead: usize) -> String {
    let first = line.saturating_sub(look_ahead).max(1);
    let last = (line + look_ahead).min(lines.len());

    let mut hasher = Sha256::new();
    for text in &lines[first - 1..last] {
        hasher.update(text.trim().as_bytes());
        hasher.update([b'\n']);
    }
    format!("{}{:x}", FULL_PREFIX, hasher.finalize())
}

/// Fingerprint built from severity, category, type, message, and package
pub fn fallback_fingerprint(issue: &Issue) -> String {
    let mut hasher = Sha256::new();
    hasher.update(issue.severity.to_string().as_bytes());
    hasher.update([0u8]);
    hasher.update(issue.category.as_bytes());
    hasher.update([0u8]);
    hasher.update(issue.issue_type.as_bytes());
    hasher.update([0u8]);
    hasher.update(issue.message.as_bytes());
    hasher.update([0u8]);
    hasher.update(issue.package_name.as_bytes());
    format!("{}{:x}", FALLBACK_PREFIX, hasher.finalize())
}

/// Assigns fingerprints to all issues of a set that do not have one yet
pub struct Fingerprinter {
    reader: Arc<dyn SourceReader>,
    lines_look_ahead: usize,
}

impl Fingerprinter {
    pub fn new(reader: Arc<dyn SourceReader>) -> Self {
        Self {
            reader,
            lines_look_ahead: DEFAULT_LINES_LOOK_AHEAD,
        }
    }

    pub fn with_lines_look_ahead(mut self, lines_look_ahead: usize) -> Self {
        self.lines_look_ahead = lines_look_ahead;
        self
    }

    pub fn lines_look_ahead(&self) -> usize {
        self.lines_look_ahead
    }

    /// Fingerprint every issue lacking one
    ///
    /// Each affected file is read once. Files that cannot be read are logged
    /// and their issues receive the fallback fingerprint.
    pub fn fingerprint_all(&self, issues: &mut IssueSet) {
        let files: BTreeSet<String> = issues
            .iter()
            .filter(|issue| !issue.has_fingerprint())
            .map(|issue| issue.file_name.clone())
            .collect();

        if files.is_empty() {
            return;
        }

        let sources: BTreeMap<String, Result<Vec<String>, SourceError>> = files
            .into_par_iter()
            .map(|file| {
                let lines = self.reader.read_lines(&file);
                (file, lines)
            })
            .collect();

        let mut missing = 0;
        for (file, lines) in &sources {
            if let Err(err) = lines {
                missing += 1;
                debug!("Using fallback fingerprints for '{}': {}", file, err);
                issues.log_info(format!(
                    "Can't read source file '{}', using fallback fingerprint: {}",
                    file, err
                ));
            }
        }

        let look_ahead = self.lines_look_ahead;
        let created = issues.iter().filter(|issue| !issue.has_fingerprint()).count();
        issues
            .issues_mut()
            .par_iter_mut()
            .filter(|issue| !issue.has_fingerprint())
            .for_each(|issue| {
                let lines = sources
                    .get(&issue.file_name)
                    .and_then(|result| result.as_ref().ok())
                    .map(Vec::as_slice);
                let fingerprint = compute_fingerprint(issue, lines, look_ahead);
                issue.fingerprint = Some(fingerprint);
            });

        issues.log_info(format!(
            "Created fingerprints for {} issues ({} source files could not be read)",
            created, missing
        ));
    }
}
