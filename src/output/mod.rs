//! Output formatting for Tidemark

use colored::{ColoredString, Colorize};

use crate::config::{OutputConfig, OutputFormat};
use crate::models::{AnalysisResult, BuildOutcome, BuildRef, Issue, IssueSet, Severity};
use crate::quality_gate::QualityGateStatus;

/// Trait for formatting output
pub trait OutputFormatter {
    /// Format the analysis result of one tool
    fn format_result(&self, result: &AnalysisResult, config: &OutputConfig) -> String;

    /// Format the builds of a job, newest first
    fn format_history(&self, job: &str, builds: &[BuildRef]) -> String;

    /// Format the outcome recorded for a build
    fn format_outcome(&self, build: &BuildRef) -> String;

    /// Format a build: the given results followed by its outcome, as one document
    fn format_build(&self, build: &BuildRef, results: &[AnalysisResult], config: &OutputConfig) -> String;
}

/// Pick the formatter for an output format
pub fn formatter_for(format: OutputFormat, use_emoji: bool) -> Box<dyn OutputFormatter> {
    match format {
        OutputFormat::Pretty if use_emoji => Box::new(PrettyFormatter::new()),
        OutputFormat::Pretty => Box::new(PrettyFormatter::without_emoji()),
        OutputFormat::Json => Box::new(JsonFormatter::new()),
    }
}

/// Colored formatter for terminals
#[derive(Clone)]
pub struct PrettyFormatter {
    /// Whether to use emojis
    use_emoji: bool,
}

impl Default for PrettyFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl PrettyFormatter {
    pub fn new() -> Self {
        Self { use_emoji: true }
    }

    pub fn without_emoji() -> Self {
        Self { use_emoji: false }
    }

    fn emoji(&self, emoji: &'static str) -> &'static str {
        if self.use_emoji {
            emoji
        } else {
            ""
        }
    }

    fn colored_status(status: QualityGateStatus) -> ColoredString {
        let text = status.to_string();
        match status {
            QualityGateStatus::Inactive => text.dimmed(),
            QualityGateStatus::Passed => text.green().bold(),
            QualityGateStatus::Note => text.blue().bold(),
            QualityGateStatus::Warning => text.yellow().bold(),
            QualityGateStatus::Failed => text.red().bold(),
        }
    }

    fn colored_outcome(outcome: BuildOutcome) -> ColoredString {
        let text = outcome.to_string().to_uppercase();
        match outcome {
            BuildOutcome::Success => text.green().bold(),
            BuildOutcome::Unstable => text.yellow().bold(),
            BuildOutcome::Failure => text.red().bold(),
            BuildOutcome::NotBuilt | BuildOutcome::Aborted => text.dimmed(),
        }
    }

    fn severity_counts(issues: &IssueSet) -> String {
        let parts: Vec<String> = [Severity::Error, Severity::High, Severity::Normal, Severity::Low]
            .into_iter()
            .filter_map(|severity| {
                let count = issues.size_of(severity);
                (count > 0).then(|| format!("{} {}", count, severity.to_string().color(severity.color_name())))
            })
            .collect();
        parts.join(", ")
    }

    fn format_issue(issue: &Issue) -> String {
        let location = if issue.line_start > 0 {
            format!("{}:{}", issue.file_name, issue.line_start)
        } else {
            issue.file_name.clone()
        };
        format!(
            "    {} {} {}\n",
            format!("[{}]", issue.severity).color(issue.severity.color_name()),
            location.bold(),
            issue.message
        )
    }

    fn format_section(&self, output: &mut String, title: ColoredString, issues: &IssueSet, max: usize) {
        if issues.is_empty() {
            return;
        }
        output.push_str(&format!("  {} ({})\n", title, issues.len()));
        for issue in issues.iter().take(max) {
            output.push_str(&Self::format_issue(issue));
        }
        if issues.len() > max {
            output.push_str(&format!("    {} more\n", format!("... {}", issues.len() - max).dimmed()));
        }
    }
}

impl OutputFormatter for PrettyFormatter {
    fn format_result(&self, result: &AnalysisResult, config: &OutputConfig) -> String {
        let separator = "━".repeat(60).dimmed();
        let mut output = format!("\n{}\n\n", separator);

        output.push_str(&format!(
            "{}{} {} {}\n",
            self.emoji("🌊 "),
            result.tool_id.bold(),
            crate::models::display_name(&result.job, result.build),
            Self::colored_status(result.quality_gate_status())
        ));
        match &result.reference_build {
            Some(reference) => output.push_str(&format!("  Reference: {}\n", reference.display_name())),
            None => output.push_str(&format!("  Reference: {}\n", "none".dimmed())),
        }
        output.push_str(&format!("{}\n\n", separator));

        let counts = Self::severity_counts(&result.issues);
        output.push_str(&format!("  Total: {}", result.total_size()));
        if !counts.is_empty() {
            output.push_str(&format!(" ({})", counts));
        }
        output.push('\n');
        if !result.size_per_branch.is_empty() {
            let branches: Vec<String> = result
                .size_per_branch
                .iter()
                .map(|(branch, total)| format!("{} {}", branch, total))
                .collect();
            output.push_str(&format!("  Branches: {}\n", branches.join(", ")));
        }
        output.push_str(&format!(
            "  {} new, {} fixed, {} outstanding\n\n",
            result.new_size().to_string().red(),
            result.fixed_size().to_string().green(),
            result.outstanding_size()
        ));

        self.format_section(&mut output, "New".red().bold(), &result.new_issues, config.max_issues);
        self.format_section(&mut output, "Fixed".green().bold(), &result.fixed_issues, config.max_issues);
        self.format_section(
            &mut output,
            "Outstanding".bold(),
            &result.outstanding_issues,
            config.max_issues,
        );

        for gate in &result.quality_gate.outcomes {
            output.push_str(&format!(
                "  {}{}: {} (actual {}, threshold {})\n",
                self.emoji("🚦 "),
                gate.gate.name(),
                Self::colored_status(gate.status),
                gate.actual,
                gate.gate.threshold
            ));
        }

        if config.show_log {
            output.push('\n');
            for message in result.info_messages() {
                output.push_str(&format!("  {}\n", message.dimmed()));
            }
        }
        for message in result.error_messages() {
            output.push_str(&format!("  {}\n", message.red()));
        }

        if let Some(since) = result.successful_since_build {
            output.push_str(&format!("\n  {}Quality gate successful since build #{}\n", self.emoji("✨ "), since));
        }
        if let Some(since) = result.no_issues_since_build {
            output.push_str(&format!("  {}No issues since build #{}\n", self.emoji("✨ "), since));
        }

        output
    }

    fn format_history(&self, job: &str, builds: &[BuildRef]) -> String {
        if builds.is_empty() {
            return format!("No builds recorded for '{}'\n", job);
        }

        let mut output = format!("{}{}\n", self.emoji("📜 "), job.bold());
        for build in builds {
            let outcome = match build.outcome {
                Some(outcome) => Self::colored_outcome(outcome),
                None => "RUNNING".dimmed(),
            };
            output.push_str(&format!("  #{:<5} {}", build.number, outcome));
            for (tool, result) in &build.results {
                output.push_str(&format!(
                    "  {} {} ({} new)",
                    tool,
                    result.total_size(),
                    result.new_size()
                ));
            }
            output.push('\n');
        }
        output
    }

    fn format_outcome(&self, build: &BuildRef) -> String {
        let outcome = match build.outcome {
            Some(outcome) => Self::colored_outcome(outcome),
            None => "RUNNING".dimmed(),
        };
        format!("\n  {}{}: {}\n", self.emoji("🏁 "), build.display_name().bold(), outcome)
    }

    fn format_build(&self, build: &BuildRef, results: &[AnalysisResult], config: &OutputConfig) -> String {
        let mut output: String = results
            .iter()
            .map(|result| self.format_result(result, config))
            .collect();
        output.push_str(&self.format_outcome(build));
        output
    }
}

/// JSON formatter for machine-readable output
pub struct JsonFormatter;

impl JsonFormatter {
    pub fn new() -> Self {
        Self
    }

    fn outcome(build: &BuildRef) -> serde_json::Value {
        serde_json::json!({
            "job": build.job,
            "number": build.number,
            "outcome": build.outcome,
        })
    }
}

impl Default for JsonFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputFormatter for JsonFormatter {
    fn format_result(&self, result: &AnalysisResult, _config: &OutputConfig) -> String {
        serde_json::to_string_pretty(result).unwrap_or_else(|_| "{}".to_string())
    }

    fn format_history(&self, job: &str, builds: &[BuildRef]) -> String {
        let summary: Vec<serde_json::Value> = builds
            .iter()
            .map(|build| {
                serde_json::json!({
                    "job": job,
                    "number": build.number,
                    "in_progress": build.in_progress,
                    "outcome": build.outcome,
                    "results": build.results.iter().map(|(tool, result)| {
                        serde_json::json!({
                            "tool_id": tool,
                            "total": result.total_size(),
                            "new": result.new_size(),
                            "fixed": result.fixed_size(),
                            "quality_gate": result.quality_gate_status(),
                        })
                    }).collect::<Vec<_>>(),
                })
            })
            .collect();
        serde_json::to_string_pretty(&summary).unwrap_or_else(|_| "[]".to_string())
    }

    fn format_outcome(&self, build: &BuildRef) -> String {
        serde_json::to_string_pretty(&Self::outcome(build)).unwrap_or_else(|_| "{}".to_string())
    }

    fn format_build(&self, build: &BuildRef, results: &[AnalysisResult], _config: &OutputConfig) -> String {
        let document = serde_json::json!({
            "results": results,
            "outcome": Self::outcome(build),
        });
        serde_json::to_string_pretty(&document).unwrap_or_else(|_| "{}".to_string())
    }
}
