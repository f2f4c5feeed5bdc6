use log::{debug, info};

use crate::errors::TidemarkError;
use crate::history::{BuildHistory, OverrideKey, ReferenceOverrides};
use crate::models::BuildRef;

/// Marks a build so the next analysis uses it as reference regardless of
/// its quality gate result
pub struct ResetQualityGateCommand<'a> {
    history: &'a dyn BuildHistory,
    overrides: &'a dyn ReferenceOverrides,
}

impl<'a> ResetQualityGateCommand<'a> {
    pub fn new(history: &'a dyn BuildHistory, overrides: &'a dyn ReferenceOverrides) -> Self {
        Self { history, overrides }
    }

    /// Whether a reset can be requested for the result of `tool_id` in `build`
    pub fn is_enabled(&self, build: &BuildRef, tool_id: &str) -> bool {
        match self.check(build, tool_id) {
            Ok(()) => true,
            Err(reason) => {
                debug!("Reset of {} for '{}' disabled: {}", build.display_name(), tool_id, reason);
                false
            }
        }
    }

    /// Request the reset
    ///
    /// Fails with `ResetRejected` if the command is not enabled for the build.
    pub fn reset(&self, build: &BuildRef, tool_id: &str) -> Result<(), TidemarkError> {
        self.check(build, tool_id)
            .map_err(|reason| TidemarkError::ResetRejected {
                build: build.display_name(),
                tool: tool_id.to_string(),
                reason,
            })?;

        self.overrides
            .mark(OverrideKey::new(build.job.clone(), build.number, tool_id))?;
        info!(
            "Resetting reference build: {} will be used as reference for '{}' once",
            build.display_name(),
            tool_id
        );
        Ok(())
    }

    fn check(&self, build: &BuildRef, tool_id: &str) -> Result<(), String> {
        let result = build
            .result_for(tool_id)
            .ok_or_else(|| format!("no analysis result for '{}'", tool_id))?;
        if result.is_successful() {
            return Err("quality gate has not been missed".to_string());
        }

        let key = OverrideKey::new(build.job.clone(), build.number, tool_id);
        if self.overrides.is_pending(&key).map_err(|e| e.to_string())? {
            return Err("reset has already been requested".to_string());
        }

        let newest = self
            .history
            .builds(&build.job)
            .map_err(|e| e.to_string())?
            .first()
            .map(|newest| newest.number);
        if newest != Some(build.number) {
            return Err("only the newest build can be reset".to_string());
        }
        Ok(())
    }
}
