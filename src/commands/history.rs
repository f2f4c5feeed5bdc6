use crate::cli::{HistoryArgs, Verbosity};
use crate::config::TidemarkConfig;
use crate::errors::TidemarkError;
use crate::history::{BuildHistory, JsonHistoryStore};
use crate::models::BuildRef;
use crate::output::formatter_for;

/// Command handler for the history command
pub struct HistoryCommand {
    verbosity: Verbosity,
    use_emoji: bool,
}

impl HistoryCommand {
    pub fn new(verbosity: Verbosity, use_emoji: bool) -> Self {
        Self {
            verbosity,
            use_emoji,
        }
    }

    /// List the builds of a job, newest first
    pub fn execute(
        &self,
        args: HistoryArgs,
        config: &TidemarkConfig,
        store: &JsonHistoryStore,
    ) -> Result<Vec<BuildRef>, TidemarkError> {
        let builds = store.builds(&args.job)?;

        if self.verbosity >= Verbosity::Normal {
            let formatter = formatter_for(args.format.unwrap_or(config.output.format), self.use_emoji);
            println!("{}", formatter.format_history(&args.job, &builds));
        }
        Ok(builds)
    }
}
