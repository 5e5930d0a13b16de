//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands};
use crate::config::{load_config, PipelineConfig};
use crate::error::{Result, ResultExt};
use crate::pipeline::{elapsed_ms, Pipeline};
use crate::types::RunStats;
use serde_json::{json, Value};
use std::time::Instant;
use tracing::debug;

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        let config = self.effective_config()?;

        match self.cli.command {
            Commands::Config => self.show_config(&config),
            Commands::Run => {
                let stats = Pipeline::new(config)?.run().await?;
                self.output_summary("run", &stats)
            }
            Commands::Catalog => {
                let started = Instant::now();
                let pipeline = Pipeline::new(config)?;
                let mut stats = RunStats::new();
                pipeline.run_catalog(&mut stats).await?;
                stats.set_duration(elapsed_ms(started));
                self.output_summary("catalog", &stats)
            }
            Commands::Activity => {
                let started = Instant::now();
                let pipeline = Pipeline::new(config)?;
                let catalog = pipeline.load_catalog().await?;
                let mut stats = RunStats::new();
                pipeline.run_activity(&catalog, &mut stats).await?;
                stats.set_duration(elapsed_ms(started));
                self.output_summary("activity", &stats)
            }
        }
    }

    /// Config file (or defaults) with command-line overrides applied
    pub fn effective_config(&self) -> Result<PipelineConfig> {
        let mut config = match &self.cli.config {
            Some(path) => {
                debug!("Loading config from {}", path.display());
                load_config(path)?
            }
            None => PipelineConfig::default(),
        };

        if let Some(input) = &self.cli.input {
            config = config.with_input(input.clone());
        }
        if let Some(output) = &self.cli.output {
            config = config.with_output(output.clone());
        }

        config.validate()?;
        Ok(config)
    }

    /// Print the effective configuration
    fn show_config(&self, config: &PipelineConfig) -> Result<()> {
        let yaml = serde_yaml::to_string(config).context("Failed to render config")?;
        print!("{yaml}");
        Ok(())
    }

    /// Print the run summary
    fn output_summary(&self, command: &str, stats: &RunStats) -> Result<()> {
        self.output_message(&json!({
            "type": "SUMMARY",
            "command": command,
            "stats": stats,
        }))
    }

    /// Output a message
    fn output_message(&self, msg: &Value) -> Result<()> {
        println!("{}", self.cli.format.render(msg)?);
        Ok(())
    }
}
