use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tidemark::app::TidemarkApp;
use tidemark::cli::{Cli, Commands, Verbosity};
use tidemark::config::TomlConfigProvider;
use tidemark::models::BuildOutcome;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    let verbosity = cli.verbosity();

    // RUST_LOG wins; -vv turns on debug output otherwise
    let default_level = if verbosity >= Verbosity::Debug { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();

    let base_dir = std::env::current_dir().context("Cannot determine working directory")?;
    let mut config_provider = TomlConfigProvider::new();
    if let Some(config) = cli.config.clone() {
        config_provider = config_provider.with_config_file(config);
    }

    let mut app = TidemarkApp::new(config_provider, base_dir)
        .with_verbosity(verbosity)
        .with_emoji(!cli.no_emoji);
    if let Some(store) = cli.store.clone() {
        app = app.with_store(store);
    }

    match cli.command {
        Commands::Record(args) => {
            let job = args.job.clone();
            let analysis = app
                .record(args)
                .await
                .with_context(|| format!("Failed to record build of '{}'", job))?;
            // Mirror the recorded outcome in the exit code for CI scripts
            if analysis.outcome < BuildOutcome::Unstable {
                return Ok(ExitCode::from(2));
            }
            if analysis.outcome < BuildOutcome::Success {
                return Ok(ExitCode::from(1));
            }
        }
        Commands::ResetReference(args) => {
            app.reset_reference(args)
                .context("Failed to reset the reference build")?;
        }
        Commands::Show(args) => {
            app.show(args).context("Failed to show the analysis result")?;
        }
        Commands::History(args) => {
            app.history(args).context("Failed to list the build history")?;
        }
    }

    Ok(ExitCode::SUCCESS)
}
