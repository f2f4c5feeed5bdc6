//! 🌊 Tidemark - track static analysis issues from build to build
//!
//! Tidemark fingerprints reported issues, resolves a reference build from
//! the build history, classifies issues as new, fixed, or outstanding, and
//! evaluates quality gates on the result.

pub mod aggregation;
pub mod analysis;
pub mod app;
pub mod cli;
pub mod commands;
pub mod config;
pub mod difference;
pub mod errors;
pub mod fingerprint;
pub mod history;
pub mod models;
pub mod output;
pub mod quality_gate;
pub mod reference;
pub mod runner;
pub mod sources;
