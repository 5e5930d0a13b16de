//! Pipeline module
//!
//! Runs the two flows in order. The catalog flow publishes `tracks` and
//! `artists` and yields a `DurableCatalog`; the activity flow needs that
//! catalog before it can resolve any play.
//!
//! # Overview
//!
//! - `Pipeline::run` - catalog flow, then activity flow
//! - `Pipeline::run_catalog` - track records → `tracks`, `artists`
//! - `Pipeline::run_activity` - activity records → `users`, `time`, `plays`
//! - `Pipeline::load_catalog` - reuse a previously published catalog

use crate::config::PipelineConfig;
use crate::error::{Error, Result};
use crate::ingest::read_partitions;
use crate::output::{ParquetWriterConfig, TableSink};
use crate::schema::{ActivityRecord, TrackRecord};
use crate::storage::{GlobPattern, StorageLocation};
use crate::transform::{
    matcher_for, resolve_plays, transform_activity, transform_catalog, DurableCatalog,
};
use crate::types::{RunStats, TableName};
use std::time::Instant;
use tracing::{info, warn};

/// Orchestrates one run over an input root and an output area
pub struct Pipeline {
    config: PipelineConfig,
    input: StorageLocation,
    sink: TableSink,
}

impl Pipeline {
    /// Validate `config` and open its input and output locations
    pub fn new(config: PipelineConfig) -> Result<Self> {
        if config.input.is_empty() {
            return Err(Error::invalid_value("input", "not set (use --input or the config file)"));
        }
        if config.output.is_empty() {
            return Err(Error::invalid_value("output", "not set (use --output or the config file)"));
        }
        let input = StorageLocation::parse(&config.input)?;
        let output = StorageLocation::parse_output(&config.output)?;
        Self::with_locations(config, input, output)
    }

    /// Build a pipeline over already opened locations
    pub fn with_locations(
        config: PipelineConfig,
        input: StorageLocation,
        output: StorageLocation,
    ) -> Result<Self> {
        config.validate()?;
        let sink = TableSink::new(output, ParquetWriterConfig::from(&config.parquet))
            .with_concurrency(config.write_concurrency);
        Ok(Self {
            config,
            input,
            sink,
        })
    }

    /// Sink writing the output tables
    pub fn sink(&self) -> &TableSink {
        &self.sink
    }

    /// Run both flows
    pub async fn run(&self) -> Result<RunStats> {
        let started = Instant::now();
        let mut stats = RunStats::new();

        let catalog = self.run_catalog(&mut stats).await?;
        self.run_activity(&catalog, &mut stats).await?;

        stats.set_duration(elapsed_ms(started));
        info!(
            "Run complete in {}ms: {} tracks, {} plays ({} unmatched events)",
            stats.duration_ms,
            stats.rows(TableName::Tracks).unwrap_or(0),
            stats.rows(TableName::Plays).unwrap_or(0),
            stats.unmatched_plays
        );
        Ok(stats)
    }

    /// Catalog flow: ingest track records, publish `tracks` and `artists`
    ///
    /// The returned catalog is what the output area now holds.
    pub async fn run_catalog(&self, stats: &mut RunStats) -> Result<DurableCatalog> {
        let pattern = GlobPattern::new(&self.config.layout.song_data)?;
        let partitions =
            read_partitions::<TrackRecord>(&self.input, &pattern, self.config.read_concurrency)
                .await?;
        let records: usize = partitions.iter().map(|p| p.len()).sum();
        stats.track_records += records;

        let tables = transform_catalog(&partitions, self.config.track_ids);
        info!(
            "Catalog transform: {} tracks, {} distinct artists",
            tables.tracks.len(),
            tables.artists.len()
        );

        info!("Publishing catalog to {}", self.sink.location().url());
        let (catalog, written) = self.sink.publish_catalog(&tables).await?;
        for table in written {
            stats.add_table(table);
        }
        Ok(catalog)
    }

    /// Activity flow: ingest events, write `users`, `time` and `plays`
    pub async fn run_activity(&self, catalog: &DurableCatalog, stats: &mut RunStats) -> Result<()> {
        let offset = self.config.utc_offset()?;
        let pattern = GlobPattern::new(&self.config.layout.log_data)?;
        let partitions =
            read_partitions::<ActivityRecord>(&self.input, &pattern, self.config.read_concurrency)
                .await?;
        let records: usize = partitions.iter().map(|p| p.len()).sum();
        stats.activity_records += records;

        let activity = transform_activity(&partitions, &self.config.play_page, &offset)?;
        stats.play_events += activity.events.len();
        info!(
            "{} of {} activity records are '{}' events",
            activity.events.len(),
            records,
            self.config.play_page
        );

        stats.add_table(self.sink.write_table(&activity.users).await?);
        stats.add_table(self.sink.write_table(&activity.time).await?);

        let matcher = matcher_for(self.config.matching);
        let resolution = resolve_plays(&activity.events, &activity.time, catalog, matcher.as_ref());
        stats.unmatched_plays += resolution.unmatched;
        if resolution.unmatched > 0 {
            warn!(
                "{} of {} play events matched no catalog entry ({})",
                resolution.unmatched,
                activity.events.len(),
                matcher.name()
            );
        }

        stats.add_table(self.sink.write_table(&resolution.plays).await?);
        Ok(())
    }

    /// Read `tracks` and `artists` from a previous catalog flow
    pub async fn load_catalog(&self) -> Result<DurableCatalog> {
        self.sink.read_catalog().await
    }
}

/// Milliseconds since `started`, saturating
pub(crate) fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
