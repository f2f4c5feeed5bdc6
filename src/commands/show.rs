use crate::cli::{ShowArgs, Verbosity};
use crate::config::TidemarkConfig;
use crate::errors::{HistoryError, TidemarkError};
use crate::history::JsonHistoryStore;
use crate::models::AnalysisResult;
use crate::output::formatter_for;

/// Command handler for the show command
pub struct ShowCommand {
    verbosity: Verbosity,
    use_emoji: bool,
}

impl ShowCommand {
    pub fn new(verbosity: Verbosity, use_emoji: bool) -> Self {
        Self {
            verbosity,
            use_emoji,
        }
    }

    /// Print the stored results of a build
    pub fn execute(
        &self,
        args: ShowArgs,
        config: &TidemarkConfig,
        store: &JsonHistoryStore,
    ) -> Result<Vec<AnalysisResult>, TidemarkError> {
        let build = match args.build {
            Some(number) => store.build(&args.job, number)?,
            None => store.newest_build(&args.job)?,
        };

        let results: Vec<AnalysisResult> = match &args.tool {
            Some(tool) => {
                let result = build.result_for(tool).ok_or_else(|| HistoryError::ResultNotFound {
                    build: build.display_name(),
                    tool: tool.clone(),
                })?;
                vec![result.clone()]
            }
            None => build.results.values().cloned().collect(),
        };

        if self.verbosity >= Verbosity::Normal {
            let formatter = formatter_for(args.format.unwrap_or(config.output.format), self.use_emoji);
            let output_config = config.output.for_verbosity(self.verbosity);
            println!("{}", formatter.format_build(&build, &results, &output_config));
        }
        Ok(results)
    }
}
