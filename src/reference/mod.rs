//! Selection of the reference build used as comparison baseline
//!
//! The resolver walks a job's history strictly backwards, starting with the
//! build before the current one (or with the newest build of a configured
//! reference job), and stops at the first build that qualifies.

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::errors::HistoryError;
use crate::history::{BuildHistory, OverrideKey, ReferenceOverrides};
use crate::models::{BuildOutcome, BuildRef, IssueSet};

/// Rules that decide which prior build qualifies as reference
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReferencePolicy {
    /// Take the reference from another job instead of the current one
    pub job: Option<String>,

    /// Accept builds whose own quality gate was missed
    pub ignore_quality_gate: bool,

    /// Only accept builds whose overall result is a success
    pub overall_must_be_success: bool,
}

impl ReferencePolicy {
    fn required_outcome(&self) -> BuildOutcome {
        if self.overall_must_be_success {
            BuildOutcome::Success
        } else {
            BuildOutcome::Unstable
        }
    }

    fn checks_outcome(&self) -> bool {
        self.overall_must_be_success || !self.ignore_quality_gate
    }

    fn reference_job<'a>(&'a self, current_job: &'a str) -> Option<&'a str> {
        self.job
            .as_deref()
            .map(str::trim)
            .filter(|job| !job.is_empty() && *job != current_job)
    }
}

/// Outcome of a reference resolution
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// A qualifying build was found
    Found(BuildRef),

    /// No build qualifies; all current issues are outstanding
    Exhausted,
}

impl Resolution {
    pub fn build(&self) -> Option<&BuildRef> {
        match self {
            Resolution::Found(build) => Some(build),
            Resolution::Exhausted => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Resolution::Found(_))
    }
}

/// Walks the build history to find the reference build for a tool
pub struct ReferenceResolver<'a> {
    history: &'a dyn BuildHistory,
    overrides: &'a dyn ReferenceOverrides,
    policy: &'a ReferencePolicy,
}

impl<'a> ReferenceResolver<'a> {
    pub fn new(
        history: &'a dyn BuildHistory,
        overrides: &'a dyn ReferenceOverrides,
        policy: &'a ReferencePolicy,
    ) -> Self {
        Self {
            history,
            overrides,
            policy,
        }
    }

    /// Resolve the reference for build `current_build` of `job`
    ///
    /// Progress is written to `log`. History failures are logged as errors
    /// and end the resolution without a reference.
    pub fn resolve(&self, job: &str, current_build: u32, tool_id: &str, log: &mut IssueSet) -> Resolution {
        let prior = match self.history.prior_builds(job, current_build) {
            Ok(prior) => prior,
            Err(e) => return exhausted_by_error(describe(e), log),
        };

        if let Some(build) = self.take_override(&prior, tool_id, log) {
            return Resolution::Found(build);
        }

        match self.candidates(job, prior, log) {
            Ok(Some(candidates)) => self.walk(candidates, tool_id, log),
            Ok(None) => Resolution::Exhausted,
            Err(message) => exhausted_by_error(message, log),
        }
    }

    /// Builds to walk: the job's own prior builds or those of the reference job
    fn candidates(
        &self,
        job: &str,
        prior: Vec<BuildRef>,
        log: &mut IssueSet,
    ) -> Result<Option<Vec<BuildRef>>, String> {
        let Some(reference_job) = self.policy.reference_job(job) else {
            return Ok(Some(prior));
        };

        log.log_info(format!("Configured reference job: '{}'", reference_job));
        if !self.history.has_job(reference_job).map_err(describe)? {
            log.log_info(format!("Reference job '{}' not found", reference_job));
            return Ok(None);
        }

        let builds = self.history.builds(reference_job).map_err(describe)?;
        if builds.is_empty() {
            log.log_info(format!("Reference job '{}' has no builds", reference_job));
            return Ok(None);
        }
        Ok(Some(builds))
    }

    /// Consume a pending reset on the previous completed build of the current job
    fn take_override(&self, prior: &[BuildRef], tool_id: &str, log: &mut IssueSet) -> Option<BuildRef> {
        let previous = prior.iter().find(|build| build.is_completed())?;
        let key = OverrideKey::new(previous.job.clone(), previous.number, tool_id);

        match self.overrides.take(&key) {
            Ok(Some(_)) => {
                log.log_info("Resetting reference build, ignoring quality gate result for one build");
                if previous.result_for(tool_id).is_some() {
                    return Some(previous.clone());
                }
                log.log_info(format!(
                    "Reference build '{}' does not contain a result for '{}', ignoring reset",
                    previous.display_name(),
                    tool_id
                ));
                None
            }
            Ok(None) => None,
            Err(e) => {
                log.log_error(format!("Failed to read reset request for '{}': {}", previous.display_name(), e));
                None
            }
        }
    }

    fn walk(&self, candidates: Vec<BuildRef>, tool_id: &str, log: &mut IssueSet) -> Resolution {
        let required = self.policy.required_outcome();
        let mut skipped = false;

        for build in candidates {
            if !build.is_completed() {
                debug!("Skipping {}: still in progress", build.display_name());
                continue;
            }
            if self.policy.checks_outcome()
                && !build.outcome.is_some_and(|o| o.is_better_or_equal_to(required))
            {
                debug!("Skipping {}: result worse than {}", build.display_name(), required);
                continue;
            }

            let name = build.display_name();
            let gate_successful = build.result_for(tool_id).map(|r| r.is_successful());
            match gate_successful {
                Some(true) => {
                    log.log_info(format!(
                        "Quality gate successful for reference build '{}', using this build as reference",
                        name
                    ));
                    return Resolution::Found(build);
                }
                Some(false) if self.policy.ignore_quality_gate => {
                    log.log_info(format!(
                        "Quality gate has been missed for reference build '{}', but is configured to be ignored",
                        name
                    ));
                    return Resolution::Found(build);
                }
                Some(false) => {
                    if !skipped {
                        log.log_info(format!(
                            "Quality gate failed for reference build '{}', analyzing previous builds",
                            name
                        ));
                        skipped = true;
                    }
                }
                None => {
                    if !skipped {
                        log.log_info(format!(
                            "Reference build '{}' does not contain a result for '{}', analyzing previous builds",
                            name, tool_id
                        ));
                        skipped = true;
                    }
                }
            }
        }

        log.log_info("No reference build with successful quality gate found, skipping delta computation");
        Resolution::Exhausted
    }
}

fn exhausted_by_error(message: String, log: &mut IssueSet) -> Resolution {
    warn!("{}", message);
    log.log_error(message);
    Resolution::Exhausted
}

fn describe(error: HistoryError) -> String {
    format!("Errors while resolving the reference build: {}", error)
}
