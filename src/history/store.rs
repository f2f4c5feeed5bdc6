use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use log::debug;
use serde::{Deserialize, Serialize};

use super::{BuildHistory, OverrideKey, ReferenceOverrides, ResetOverride};
use crate::errors::HistoryError;
use crate::models::BuildRef;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct HistoryFile {
    #[serde(default)]
    jobs: BTreeMap<String, Vec<BuildRef>>,

    #[serde(default)]
    pending_resets: BTreeSet<OverrideKey>,
}

/// Build history persisted as a single JSON document
///
/// Every mutation is written back before the call returns and only becomes
/// visible once the write succeeded. Reset requests
/// are consumed under the same lock that guards the write, so a request is
/// observed by exactly one resolution.
#[derive(Debug)]
pub struct JsonHistoryStore {
    path: PathBuf,
    state: Mutex<HistoryFile>,
}

impl JsonHistoryStore {
    /// Open the store at `path`, starting empty if the file does not exist
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, HistoryError> {
        let path = path.into();
        let state = if path.exists() {
            debug!("Loading history store from {:?}", path);
            let content = fs::read_to_string(&path).map_err(|e| HistoryError::Store {
                path: path.clone(),
                message: e.to_string(),
            })?;
            serde_json::from_str(&content)?
        } else {
            debug!("History store {:?} does not exist yet", path);
            HistoryFile::default()
        };

        Ok(Self {
            path,
            state: Mutex::new(state),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Store a build
    ///
    /// If the build already exists its results are extended and its outcome
    /// becomes the worse of both. A second result for the same tool is
    /// rejected.
    pub fn record(&self, build: BuildRef) -> Result<(), HistoryError> {
        let mut state = self.lock();
        let mut next = state.clone();
        let builds = next.jobs.entry(build.job.clone()).or_default();
        match builds.iter_mut().find(|b| b.number == build.number) {
            Some(existing) => {
                if let Some(tool) = build.results.keys().find(|tool| existing.results.contains_key(*tool)) {
                    return Err(HistoryError::DuplicateResult {
                        job: build.job.clone(),
                        number: build.number,
                        tool: tool.clone(),
                    });
                }
                existing.outcome = match (existing.outcome, build.outcome) {
                    (Some(a), Some(b)) => Some(a.combine(b)),
                    (a, b) => a.or(b),
                };
                existing.in_progress = existing.in_progress && build.in_progress;
                existing.results.extend(build.results);
            }
            None => {
                builds.push(build);
                builds.sort_by(|a, b| b.number.cmp(&a.number));
            }
        }
        self.commit(&mut state, next)
    }

    /// The newest build of a job
    pub fn newest_build(&self, job: &str) -> Result<BuildRef, HistoryError> {
        self.lock()
            .jobs
            .get(job)
            .and_then(|builds| builds.first())
            .cloned()
            .ok_or_else(|| HistoryError::JobNotFound(job.to_string()))
    }

    /// Look up a single build
    pub fn build(&self, job: &str, number: u32) -> Result<BuildRef, HistoryError> {
        let state = self.lock();
        state
            .jobs
            .get(job)
            .and_then(|builds| builds.iter().find(|b| b.number == number))
            .cloned()
            .ok_or_else(|| HistoryError::BuildNotFound {
                job: job.to_string(),
                number,
            })
    }

    /// Names of all known jobs
    pub fn jobs(&self) -> Vec<String> {
        self.lock().jobs.keys().cloned().collect()
    }

    /// The number the next build of `job` should get
    pub fn next_build_number(&self, job: &str) -> u32 {
        self.lock()
            .jobs
            .get(job)
            .and_then(|builds| builds.first())
            .map_or(1, |newest| newest.number + 1)
    }

    fn lock(&self) -> MutexGuard<'_, HistoryFile> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Write `next` and make it the current state once it is on disk
    fn commit(&self, state: &mut HistoryFile, next: HistoryFile) -> Result<(), HistoryError> {
        self.save(&next)?;
        *state = next;
        Ok(())
    }

    fn save(&self, state: &HistoryFile) -> Result<(), HistoryError> {
        let content = serde_json::to_string_pretty(state)?;
        let temp_path = self.path.with_extension("json.tmp");

        let store_error = |e: std::io::Error| HistoryError::Store {
            path: self.path.clone(),
            message: e.to_string(),
        };
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(store_error)?;
        }
        fs::write(&temp_path, content).map_err(store_error)?;
        fs::rename(&temp_path, &self.path).map_err(store_error)?;
        debug!("Saved history store to {:?}", self.path);
        Ok(())
    }
}

impl BuildHistory for JsonHistoryStore {
    fn builds(&self, job: &str) -> Result<Vec<BuildRef>, HistoryError> {
        Ok(self.lock().jobs.get(job).cloned().unwrap_or_default())
    }

    fn has_job(&self, job: &str) -> Result<bool, HistoryError> {
        Ok(self.lock().jobs.contains_key(job))
    }
}

impl ReferenceOverrides for JsonHistoryStore {
    fn mark(&self, key: OverrideKey) -> Result<(), HistoryError> {
        let mut state = self.lock();
        if state.pending_resets.contains(&key) {
            return Ok(());
        }
        let mut next = state.clone();
        next.pending_resets.insert(key);
        self.commit(&mut state, next)
    }

    fn is_pending(&self, key: &OverrideKey) -> Result<bool, HistoryError> {
        Ok(self.lock().pending_resets.contains(key))
    }

    fn take(&self, key: &OverrideKey) -> Result<Option<ResetOverride>, HistoryError> {
        let mut state = self.lock();
        if !state.pending_resets.contains(key) {
            return Ok(None);
        }
        let mut next = state.clone();
        next.pending_resets.remove(key);
        self.commit(&mut state, next)?;
        Ok(Some(ResetOverride { key: key.clone() }))
    }
}
