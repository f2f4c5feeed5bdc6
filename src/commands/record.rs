use std::sync::Arc;

use log::debug;

use crate::analysis::{Analysis, AnalysisRequest, IssueAnalyzer};
use crate::cli::{RecordArgs, Verbosity};
use crate::config::TidemarkConfig;
use crate::errors::TidemarkError;
use crate::fingerprint::{FileSourceReader, Fingerprinter};
use crate::history::JsonHistoryStore;
use crate::models::BuildRef;
use crate::output::formatter_for;
use crate::runner::{Branch, BranchRunner};
use crate::sources::{IssueSource, JsonIssueSource};

/// Command handler for the record command
pub struct RecordCommand {
    verbosity: Verbosity,
    use_emoji: bool,
}

impl RecordCommand {
    pub fn new(verbosity: Verbosity, use_emoji: bool) -> Self {
        Self {
            verbosity,
            use_emoji,
        }
    }

    /// Analyze the reports of a build and store the result
    pub async fn execute(
        &self,
        args: RecordArgs,
        config: &TidemarkConfig,
        store: &JsonHistoryStore,
    ) -> Result<Analysis, TidemarkError> {
        let number = args
            .build
            .unwrap_or_else(|| store.next_build_number(&args.job));
        debug!("Recording {} for '{}'", crate::models::display_name(&args.job, number), args.tool);

        let branches = args
            .reports
            .iter()
            .map(|report| {
                let source: Arc<dyn IssueSource> = Arc::new(JsonIssueSource::new(args.tool.clone(), report.path.clone()));
                Branch::new(report.branch.clone(), source)
            })
            .collect();
        let aggregated = BranchRunner::new().run_and_merge(&args.tool, branches).await;
        let branch_totals = aggregated.branch_totals();
        for (branch, total) in &branch_totals {
            debug!("Branch '{}': {} issues", branch, total);
        }

        let mut reader = FileSourceReader::new();
        if let Some(root) = &config.fingerprint.source_root {
            reader = reader.with_root(root.clone());
        }
        let fingerprinter = Fingerprinter::new(Arc::new(reader)).with_lines_look_ahead(config.fingerprint.lines_look_ahead);
        let gates = config.effective_gates();

        let analyzer = IssueAnalyzer::new(store, store, &fingerprinter, &config.reference, &gates);
        let request = AnalysisRequest::new(args.job.clone(), number, aggregated.into_combined())
            .with_outcome(args.outcome)
            .with_branch_totals(branch_totals);
        let analysis = analyzer.analyze(request);

        let build = BuildRef::completed(args.job, number, analysis.outcome).with_result(analysis.result.clone());
        store.record(build.clone())?;

        if self.verbosity >= Verbosity::Normal {
            let formatter = formatter_for(args.format.unwrap_or(config.output.format), self.use_emoji);
            let output_config = config.output.for_verbosity(self.verbosity);
            println!(
                "{}",
                formatter.format_build(&build, std::slice::from_ref(&analysis.result), &output_config)
            );
        }

        Ok(analysis)
    }
}
