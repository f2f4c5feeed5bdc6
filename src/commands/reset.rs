use crate::analysis::ResetQualityGateCommand;
use crate::cli::{ResetArgs, Verbosity};
use crate::errors::TidemarkError;
use crate::history::JsonHistoryStore;
use crate::models::BuildRef;

/// Command handler for the reset-reference command
pub struct ResetReferenceCommand {
    verbosity: Verbosity,
}

impl ResetReferenceCommand {
    pub fn new(verbosity: Verbosity) -> Self {
        Self { verbosity }
    }

    /// Request a one-shot reference reset for a build
    pub fn execute(&self, args: ResetArgs, store: &JsonHistoryStore) -> Result<BuildRef, TidemarkError> {
        let build = store.build(&args.job, args.build)?;
        ResetQualityGateCommand::new(store, store).reset(&build, &args.tool)?;

        if self.verbosity >= Verbosity::Normal {
            println!(
                "Reference reset requested: the next build of '{}' will use {} as reference for '{}'",
                args.job,
                build.display_name(),
                args.tool
            );
        }
        Ok(build)
    }
}
