//! CLI module
//!
//! Command-line interface for running the pipeline.
//!
//! # Commands
//!
//! - `run` - Catalog flow then activity flow
//! - `catalog` - Publish `tracks` and `artists`
//! - `activity` - `users`, `time`, `plays` against a published catalog
//! - `config` - Show the effective configuration

mod commands;
mod runner;

pub use commands::{Cli, Commands, OutputFormat};
pub use runner::Runner;

#[cfg(test)]
mod tests;
