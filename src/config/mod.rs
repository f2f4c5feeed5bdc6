//! Configuration management for Tidemark

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

use crate::cli::Verbosity;
use crate::errors::ConfigError;
use crate::fingerprint::DEFAULT_LINES_LOOK_AHEAD;
use crate::quality_gate::{QualityGate, Thresholds};
use crate::reference::ReferencePolicy;

mod provider;

pub use provider::{ConfigProvider, TomlConfigProvider};

/// Default location of the history store, relative to the working directory
pub const DEFAULT_STORE_PATH: &str = ".tidemark/history.json";

/// Fingerprinting configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FingerprintConfig {
    /// Context lines before and after the reported line
    pub lines_look_ahead: usize,

    /// Directory relative source file names are resolved against
    pub source_root: Option<PathBuf>,
}

impl Default for FingerprintConfig {
    fn default() -> Self {
        Self {
            lines_look_ahead: DEFAULT_LINES_LOOK_AHEAD,
            source_root: None,
        }
    }
}

/// History store configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_STORE_PATH),
        }
    }
}

/// Output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum OutputFormat {
    #[default]
    Pretty,
    Json,
}

/// Output configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub format: OutputFormat,

    /// Print the analysis log with every result when running verbosely
    pub show_log: bool,

    /// Max issues to list per classification
    pub max_issues: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Pretty,
            show_log: true,
            max_issues: usize::MAX,
        }
    }
}

impl OutputConfig {
    /// Settings for one command run; the analysis log is printed only with `-v`
    pub fn for_verbosity(&self, verbosity: Verbosity) -> Self {
        Self {
            show_log: self.show_log && verbosity >= Verbosity::Verbose,
            ..self.clone()
        }
    }
}

/// Main configuration for Tidemark
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct TidemarkConfig {
    #[serde(default)]
    pub fingerprint: FingerprintConfig,

    #[serde(default)]
    pub reference: ReferencePolicy,

    /// Quality gates in evaluation order
    #[serde(default)]
    pub quality_gates: Vec<QualityGate>,

    /// Legacy thresholds, appended to the quality gates
    #[serde(default)]
    pub thresholds: Option<Thresholds>,

    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

impl TidemarkConfig {
    /// All configured gates, including the ones mapped from legacy thresholds
    pub fn effective_gates(&self) -> Vec<QualityGate> {
        let mut gates = self.quality_gates.clone();
        if let Some(thresholds) = &self.thresholds {
            gates.extend(thresholds.to_quality_gates());
        }
        gates
    }

    /// Reject values the analysis cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(root) = &self.fingerprint.source_root {
            if !root.is_dir() {
                return Err(ConfigError::Invalid {
                    key: "fingerprint.source_root".to_string(),
                    message: format!("{} is not a directory", root.display()),
                });
            }
        }
        if self.store.path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid {
                key: "store.path".to_string(),
                message: "must not be empty".to_string(),
            });
        }
        if self.reference.job.as_deref().is_some_and(|job| job.trim().is_empty()) {
            return Err(ConfigError::Invalid {
                key: "reference.job".to_string(),
                message: "must not be blank".to_string(),
            });
        }
        Ok(())
    }
}
