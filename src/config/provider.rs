use std::fs;
use std::path::{Path, PathBuf};

use log::debug;

use crate::config::TidemarkConfig;
use crate::errors::ConfigError;

const CONFIG_FILE_NAMES: [&str; 2] = [".tidemark.toml", "tidemark.toml"];

/// Trait for providing configuration to the application
pub trait ConfigProvider {
    /// Load configuration from a base directory
    fn load_config(&self, base_dir: &Path) -> Result<TidemarkConfig, ConfigError>;
}

/// TOML-based configuration provider
#[derive(Debug, Default)]
pub struct TomlConfigProvider {
    /// Explicit configuration file, bypassing the search
    config_path: Option<PathBuf>,
}

impl TomlConfigProvider {
    pub fn new() -> Self {
        Self { config_path: None }
    }

    /// Use the given file instead of searching for one
    pub fn with_config_file(mut self, path: PathBuf) -> Self {
        self.config_path = Some(path);
        self
    }

    /// Find project-level config by traversing directory tree upwards
    pub fn find_project_config(&self, base_dir: &Path) -> Option<PathBuf> {
        let mut current_dir = base_dir.to_path_buf();

        loop {
            for name in CONFIG_FILE_NAMES {
                let config_path = current_dir.join(name);
                if config_path.is_file() {
                    return Some(config_path);
                }
            }

            if !current_dir.pop() {
                break;
            }
        }

        None
    }

    /// Read configuration from a file
    fn read_config_file(&self, path: &Path) -> Result<TidemarkConfig, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::LoadError {
                path: path.to_path_buf(),
                message: "File does not exist".to_string(),
            });
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::LoadError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let config: TidemarkConfig = toml::from_str(&content).map_err(ConfigError::Toml)?;
        Ok(config)
    }
}

impl ConfigProvider for TomlConfigProvider {
    fn load_config(&self, base_dir: &Path) -> Result<TidemarkConfig, ConfigError> {
        let path = match &self.config_path {
            Some(path) => Some(path.clone()),
            None => self.find_project_config(base_dir),
        };

        let config = match path {
            Some(path) => {
                debug!("Loading config from {:?}", path);
                let mut config = self.read_config_file(&path)?;
                // Relative paths in the file are relative to the file itself
                if let Some(dir) = path.parent() {
                    if let Some(root) = config.fingerprint.source_root.take() {
                        config.fingerprint.source_root = Some(dir.join(root));
                    }
                }
                config
            }
            None => {
                debug!("No config file found from {:?}, using defaults", base_dir);
                TidemarkConfig::default()
            }
        };

        config.validate()?;
        Ok(config)
    }
}
