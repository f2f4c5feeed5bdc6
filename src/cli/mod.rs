//! Command-line interface for Tidemark

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::OutputFormat;
use crate::models::BuildOutcome;

/// Verbosity level for output
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd)]
pub enum Verbosity {
    /// Quiet mode - only show errors
    Quiet = 0,

    /// Normal mode - show results
    Normal = 1,

    /// Verbose mode - show results and the analysis log
    Verbose = 2,

    /// Debug mode - show everything including debug info
    Debug = 3,
}

impl Default for Verbosity {
    fn default() -> Self {
        Self::Normal
    }
}

impl From<u8> for Verbosity {
    fn from(value: u8) -> Self {
        match value {
            0 => Self::Normal,
            1 => Self::Verbose,
            _ => Self::Debug,
        }
    }
}

/// Tidemark - track static analysis issues from build to build
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "🌊 Tidemark - track static analysis issues from build to build",
    long_about = "Tidemark fingerprints the issues reported by static analysis tools, compares every build against a reference build, and evaluates quality gates on the new, fixed, and outstanding issues."
)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (-v=show analysis log, -vv=debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (no output unless there are errors)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Custom configuration file
    #[arg(short = 'c', long, global = true)]
    pub config: Option<PathBuf>,

    /// History store file, overrides the configured one
    #[arg(short = 's', long, global = true)]
    pub store: Option<PathBuf>,

    /// Disable emoji in output
    #[arg(long, global = true)]
    pub no_emoji: bool,
}

impl Cli {
    pub fn verbosity(&self) -> Verbosity {
        if self.quiet {
            Verbosity::Quiet
        } else {
            Verbosity::from(self.verbose)
        }
    }
}

/// Commands that Tidemark can execute
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Analyze the issues of a build and record the result
    Record(RecordArgs),

    /// Use a build as reference once, even though it missed its quality gate
    #[command(name = "reset-reference")]
    ResetReference(ResetArgs),

    /// Show a recorded analysis result
    Show(ShowArgs),

    /// List the recorded builds of a job
    History(HistoryArgs),
}

/// A report file, optionally tagged with the branch that produced it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportArg {
    pub branch: String,
    pub path: PathBuf,
}

/// Parse `BRANCH=PATH` or `PATH`; a bare path is its own branch
pub fn parse_report_arg(value: &str) -> Result<ReportArg, String> {
    match value.split_once('=') {
        Some((branch, path)) => {
            if branch.is_empty() || path.is_empty() {
                return Err(format!("expected BRANCH=PATH, got '{}'", value));
            }
            Ok(ReportArg {
                branch: branch.to_string(),
                path: PathBuf::from(path),
            })
        }
        None if value.is_empty() => Err("report path must not be empty".to_string()),
        None => Ok(ReportArg {
            branch: value.to_string(),
            path: PathBuf::from(value),
        }),
    }
}

/// Arguments for the record command
#[derive(Args, Debug)]
pub struct RecordArgs {
    /// Job the build belongs to
    #[arg(short, long)]
    pub job: String,

    /// Build number (defaults to the next free number)
    #[arg(short, long)]
    pub build: Option<u32>,

    /// Tool id the issues are reported under
    #[arg(short, long)]
    pub tool: String,

    /// JSON issue reports, one per branch ([BRANCH=]PATH)
    #[arg(short, long = "report", value_name = "[BRANCH=]PATH", required = true, value_parser = parse_report_arg)]
    pub reports: Vec<ReportArg>,

    /// Outcome of the build before quality gates are applied
    #[arg(long, default_value = "success")]
    pub outcome: BuildOutcome,

    /// Output format (pretty, json)
    #[arg(short, long)]
    pub format: Option<OutputFormat>,
}

/// Arguments for the reset-reference command
#[derive(Args, Debug)]
pub struct ResetArgs {
    #[arg(short, long)]
    pub job: String,

    #[arg(short, long)]
    pub build: u32,

    #[arg(short, long)]
    pub tool: String,
}

/// Arguments for the show command
#[derive(Args, Debug)]
pub struct ShowArgs {
    #[arg(short, long)]
    pub job: String,

    /// Build number (defaults to the newest build)
    #[arg(short, long)]
    pub build: Option<u32>,

    /// Only show this tool (defaults to all tools of the build)
    #[arg(short, long)]
    pub tool: Option<String>,

    /// Output format (pretty, json)
    #[arg(short, long)]
    pub format: Option<OutputFormat>,
}

/// Arguments for the history command
#[derive(Args, Debug)]
pub struct HistoryArgs {
    #[arg(short, long)]
    pub job: String,

    /// Output format (pretty, json)
    #[arg(short, long)]
    pub format: Option<OutputFormat>,
}
