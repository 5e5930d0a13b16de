//! CLI commands and argument parsing

use crate::error::Result;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;

/// Sparkify Lake: song and activity JSON into a Parquet star schema
#[derive(Parser, Debug)]
#[command(name = "sparkify-lake")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Pipeline configuration file (YAML)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Input root, overrides the config file
    /// Supports: /path, file:///path, s3://bucket/path, r2://bucket/path, gs://bucket/path, az://container/path
    #[arg(short, long, global = true)]
    pub input: Option<String>,

    /// Output root, overrides the config file
    #[arg(short, long, global = true)]
    pub output: Option<String>,

    /// Summary format
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commands {
    /// Run the catalog flow, then the activity flow
    Run,

    /// Publish `tracks` and `artists` only
    Catalog,

    /// Build `users`, `time` and `plays` against a published catalog
    Activity,

    /// Print the effective configuration as YAML
    Config,
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Single-line JSON
    Json,
    /// Indented JSON
    Pretty,
}

impl OutputFormat {
    /// Serialize `value` in this format
    pub fn render<T: Serialize>(self, value: &T) -> Result<String> {
        let text = match self {
            OutputFormat::Json => serde_json::to_string(value)?,
            OutputFormat::Pretty => serde_json::to_string_pretty(value)?,
        };
        Ok(text)
    }
}
