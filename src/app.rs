use std::path::{Path, PathBuf};

use log::debug;

use crate::analysis::Analysis;
use crate::cli::{HistoryArgs, RecordArgs, ResetArgs, ShowArgs, Verbosity};
use crate::commands::{HistoryCommand, RecordCommand, ResetReferenceCommand, ShowCommand};
use crate::config::{ConfigProvider, TidemarkConfig};
use crate::errors::TidemarkError;
use crate::history::JsonHistoryStore;
use crate::models::{AnalysisResult, BuildRef};

/// Core application that wires configuration, history store, and commands
pub struct TidemarkApp<C>
where
    C: ConfigProvider,
{
    config_provider: C,
    base_dir: PathBuf,
    store_path: Option<PathBuf>,
    verbosity: Verbosity,
    use_emoji: bool,
}

impl<C> TidemarkApp<C>
where
    C: ConfigProvider,
{
    /// Create an app that looks for its configuration from `base_dir` upwards
    pub fn new(config_provider: C, base_dir: impl Into<PathBuf>) -> Self {
        Self {
            config_provider,
            base_dir: base_dir.into(),
            store_path: None,
            verbosity: Verbosity::default(),
            use_emoji: true,
        }
    }

    /// Set the verbosity level
    pub fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Use this history store instead of the configured one
    pub fn with_store(mut self, path: PathBuf) -> Self {
        self.store_path = Some(path);
        self
    }

    pub fn with_emoji(mut self, use_emoji: bool) -> Self {
        self.use_emoji = use_emoji;
        self
    }

    /// Run the record command
    pub async fn record(&self, args: RecordArgs) -> Result<Analysis, TidemarkError> {
        let config = self.load_config()?;
        let store = self.open_store(&config)?;
        RecordCommand::new(self.verbosity, self.use_emoji)
            .execute(args, &config, &store)
            .await
    }

    /// Run the reset-reference command
    pub fn reset_reference(&self, args: ResetArgs) -> Result<BuildRef, TidemarkError> {
        let config = self.load_config()?;
        let store = self.open_store(&config)?;
        ResetReferenceCommand::new(self.verbosity).execute(args, &store)
    }

    /// Run the show command
    pub fn show(&self, args: ShowArgs) -> Result<Vec<AnalysisResult>, TidemarkError> {
        let config = self.load_config()?;
        let store = self.open_store(&config)?;
        ShowCommand::new(self.verbosity, self.use_emoji).execute(args, &config, &store)
    }

    /// Run the history command
    pub fn history(&self, args: HistoryArgs) -> Result<Vec<BuildRef>, TidemarkError> {
        let config = self.load_config()?;
        let store = self.open_store(&config)?;
        HistoryCommand::new(self.verbosity, self.use_emoji).execute(args, &config, &store)
    }

    fn load_config(&self) -> Result<TidemarkConfig, TidemarkError> {
        Ok(self.config_provider.load_config(&self.base_dir)?)
    }

    fn open_store(&self, config: &TidemarkConfig) -> Result<JsonHistoryStore, TidemarkError> {
        let path = match &self.store_path {
            Some(path) => path.clone(),
            None => resolve(&self.base_dir, &config.store.path),
        };
        debug!("Using history store {:?}", path);
        Ok(JsonHistoryStore::open(path)?)
    }
}

fn resolve(base_dir: &Path, path: &Path) -> PathBuf {
    if path.is_relative() {
        base_dir.join(path)
    } else {
        path.to_path_buf()
    }
}
