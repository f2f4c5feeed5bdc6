//! Build history and reference overrides
//!
//! The resolver never walks a live object graph. It asks a `BuildHistory`
//! for an ordered list of lightweight `BuildRef` records and consults
//! `ReferenceOverrides` for pending one-shot resets.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, PoisonError};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::errors::HistoryError;
use crate::models::BuildRef;

mod store;

pub use store::JsonHistoryStore;

/// Provides the builds of a job
pub trait BuildHistory: Send + Sync {
    /// All builds of the job, newest first; empty if the job is unknown
    fn builds(&self, job: &str) -> Result<Vec<BuildRef>, HistoryError>;

    /// Whether a job with the given name exists
    fn has_job(&self, job: &str) -> Result<bool, HistoryError>;

    /// Builds of the job older than `before`, newest first
    fn prior_builds(&self, job: &str, before: u32) -> Result<Vec<BuildRef>, HistoryError> {
        Ok(self
            .builds(job)?
            .into_iter()
            .filter(|build| build.number < before)
            .collect())
    }
}

/// Identifies a pending reset: a build and the tool id it applies to
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OverrideKey {
    pub job: String,
    pub build: u32,
    pub tool_id: String,
}

impl OverrideKey {
    pub fn new(job: impl Into<String>, build: u32, tool_id: impl Into<String>) -> Self {
        Self {
            job: job.into(),
            build,
            tool_id: tool_id.into(),
        }
    }
}

/// A consumed reset request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResetOverride {
    pub key: OverrideKey,
}

/// One-shot "reset reference" requests
///
/// `take` reads and clears atomically, so exactly one resolution observes a
/// request.
pub trait ReferenceOverrides: Send + Sync {
    /// Record a reset request; recording the same key twice is a no-op
    fn mark(&self, key: OverrideKey) -> Result<(), HistoryError>;

    /// Whether a request is pending, without consuming it
    fn is_pending(&self, key: &OverrideKey) -> Result<bool, HistoryError>;

    /// Remove and return a pending request
    fn take(&self, key: &OverrideKey) -> Result<Option<ResetOverride>, HistoryError>;
}

/// History kept in memory, used by tests and embedding callers
#[derive(Debug, Default)]
pub struct InMemoryHistory {
    jobs: Mutex<BTreeMap<String, Vec<BuildRef>>>,
}

impl InMemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a build
    pub fn record(&self, build: BuildRef) {
        let mut jobs = self.jobs.lock().unwrap_or_else(PoisonError::into_inner);
        let builds = jobs.entry(build.job.clone()).or_default();
        builds.retain(|b| b.number != build.number);
        builds.push(build);
        builds.sort_by(|a, b| b.number.cmp(&a.number));
    }

    /// Register a job without builds
    pub fn add_job(&self, job: impl Into<String>) {
        let mut jobs = self.jobs.lock().unwrap_or_else(PoisonError::into_inner);
        jobs.entry(job.into()).or_default();
    }
}

impl BuildHistory for InMemoryHistory {
    fn builds(&self, job: &str) -> Result<Vec<BuildRef>, HistoryError> {
        let jobs = self.jobs.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(jobs.get(job).cloned().unwrap_or_default())
    }

    fn has_job(&self, job: &str) -> Result<bool, HistoryError> {
        let jobs = self.jobs.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(jobs.contains_key(job))
    }
}

/// Reset requests kept in memory
#[derive(Debug, Default)]
pub struct InMemoryOverrides {
    pending: Mutex<BTreeSet<OverrideKey>>,
}

impl InMemoryOverrides {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ReferenceOverrides for InMemoryOverrides {
    fn mark(&self, key: OverrideKey) -> Result<(), HistoryError> {
        debug!("Marking reference reset for {:?}", key);
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        pending.insert(key);
        Ok(())
    }

    fn is_pending(&self, key: &OverrideKey) -> Result<bool, HistoryError> {
        let pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(pending.contains(key))
    }

    fn take(&self, key: &OverrideKey) -> Result<Option<ResetOverride>, HistoryError> {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(pending
            .remove(key)
            .then(|| ResetOverride { key: key.clone() }))
    }
}
