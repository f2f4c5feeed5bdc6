use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for Tidemark
#[derive(Debug, Error)]
pub enum TidemarkError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Build history errors
    #[error("History error: {0}")]
    History(#[from] HistoryError),

    /// Issue source errors
    #[error("Issue source error: {0}")]
    Source(#[from] SourceError),

    /// Reset command rejected
    #[error("Cannot reset reference for {build} and tool '{tool}': {reason}")]
    ResetRejected {
        build: String,
        tool: String,
        reason: String,
    },

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Configuration related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Error loading configuration file
    #[error("Failed to load config from {path}: {message}")]
    LoadError { path: PathBuf, message: String },

    /// Semantically invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    Invalid { key: String, message: String },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Errors raised by build history providers
#[derive(Debug, Error)]
pub enum HistoryError {
    /// The history store could not be read or written
    #[error("Failed to access history store {path}: {message}")]
    Store { path: PathBuf, message: String },

    /// The history store contains malformed data
    #[error("Malformed history store: {0}")]
    Json(#[from] serde_json::Error),

    /// A build was requested that does not exist
    #[error("Build '{job} #{number}' not found")]
    BuildNotFound { job: String, number: u32 },

    /// A result was recorded twice for the same build and tool
    #[error("Build '{job} #{number}' already has a result for '{tool}'")]
    DuplicateResult {
        job: String,
        number: u32,
        tool: String,
    },

    /// A job without any recorded build was requested
    #[error("No builds recorded for job '{0}'")]
    JobNotFound(String),

    /// A build does not contain a result for the requested tool
    #[error("Build '{build}' has no result for '{tool}'")]
    ResultNotFound { build: String, tool: String },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Errors raised while reading source files or parsed issue reports
#[derive(Debug, Error)]
pub enum SourceError {
    /// The file does not exist
    #[error("File '{0}' not found")]
    NotFound(PathBuf),

    /// The file could not be read
    #[error("Failed to read '{path}': {message}")]
    Unreadable { path: PathBuf, message: String },

    /// The issue report is malformed
    #[error("Malformed issue report '{path}': {message}")]
    Malformed { path: PathBuf, message: String },
}
