//! Pipeline configuration
//!
//! This module contains the configuration structures for a pipeline run,
//! loaded from YAML. Every field has a default so an empty document is a
//! valid config once `input` and `output` are supplied (usually from the
//! command line).

use crate::error::{Error, Result, ResultExt};
use chrono::FixedOffset;
use parquet::basic::{Compression, GzipLevel, ZstdLevel};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

// ============================================================================
// Top-Level Pipeline Config
// ============================================================================

/// Complete pipeline configuration loaded from YAML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    /// Input root (local path or storage URL)
    #[serde(default)]
    pub input: String,

    /// Output root (local path or storage URL)
    #[serde(default)]
    pub output: String,

    /// Where the two source families live under `input`
    #[serde(default)]
    pub layout: InputLayout,

    /// Page value that marks a play event
    #[serde(default = "default_play_page")]
    pub play_page: String,

    /// Fixed UTC offset used to decompose timestamps (e.g. "+00:00")
    #[serde(default = "default_timezone")]
    pub timezone: String,

    /// Surrogate key strategy for `tracks.track_id`
    #[serde(default)]
    pub track_ids: TrackIdStrategy,

    /// How play events are matched to catalog entries
    #[serde(default)]
    pub matching: MatchStrategy,

    /// Maximum number of objects read concurrently
    #[serde(default = "default_read_concurrency")]
    pub read_concurrency: usize,

    /// Maximum number of part files uploaded concurrently
    #[serde(default = "default_write_concurrency")]
    pub write_concurrency: usize,

    /// Parquet output settings
    #[serde(default)]
    pub parquet: ParquetSettings,
}

fn default_play_page() -> String {
    "NextSong".to_string()
}

fn default_timezone() -> String {
    "+00:00".to_string()
}

fn default_read_concurrency() -> usize {
    16
}

fn default_write_concurrency() -> usize {
    8
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input: String::new(),
            output: String::new(),
            layout: InputLayout::default(),
            play_page: default_play_page(),
            timezone: default_timezone(),
            track_ids: TrackIdStrategy::default(),
            matching: MatchStrategy::default(),
            read_concurrency: default_read_concurrency(),
            write_concurrency: default_write_concurrency(),
            parquet: ParquetSettings::default(),
        }
    }
}

impl PipelineConfig {
    /// Set the input root
    #[must_use]
    pub fn with_input(mut self, input: impl Into<String>) -> Self {
        self.input = input.into();
        self
    }

    /// Set the output root
    #[must_use]
    pub fn with_output(mut self, output: impl Into<String>) -> Self {
        self.output = output.into();
        self
    }

    /// Set the surrogate key strategy
    #[must_use]
    pub fn with_track_ids(mut self, strategy: TrackIdStrategy) -> Self {
        self.track_ids = strategy;
        self
    }

    /// Set the matching strategy
    #[must_use]
    pub fn with_matching(mut self, strategy: MatchStrategy) -> Self {
        self.matching = strategy;
        self
    }

    /// Parsed timezone offset
    pub fn utc_offset(&self) -> Result<FixedOffset> {
        self.timezone.parse::<FixedOffset>().map_err(|e| {
            Error::invalid_value("timezone", format!("'{}': {e}", self.timezone))
        })
    }

    /// Validate the configuration
    ///
    /// Does not require `input`/`output`; those are checked by the
    /// pipeline when it opens storage, so a config file may leave them
    /// to the command line.
    pub fn validate(&self) -> Result<()> {
        if self.layout.song_data.trim().is_empty() {
            return Err(Error::invalid_value("layout.song_data", "cannot be empty"));
        }
        if self.layout.log_data.trim().is_empty() {
            return Err(Error::invalid_value("layout.log_data", "cannot be empty"));
        }
        if self.play_page.is_empty() {
            return Err(Error::invalid_value("play_page", "cannot be empty"));
        }
        if self.read_concurrency == 0 {
            return Err(Error::invalid_value(
                "read_concurrency",
                "must be greater than zero",
            ));
        }
        if self.write_concurrency == 0 {
            return Err(Error::invalid_value(
                "write_concurrency",
                "must be greater than zero",
            ));
        }
        if self.parquet.row_group_size == 0 {
            return Err(Error::invalid_value(
                "parquet.row_group_size",
                "must be greater than zero",
            ));
        }
        self.utc_offset()?;
        Ok(())
    }
}

// ============================================================================
// Input Layout
// ============================================================================

/// Glob patterns, relative to the input root, for each source family
///
/// `*` matches within one path segment and `**` across segments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InputLayout {
    /// Track metadata objects
    #[serde(default = "default_song_data")]
    pub song_data: String,

    /// Activity log objects
    #[serde(default = "default_log_data")]
    pub log_data: String,
}

fn default_song_data() -> String {
    "song_data/*/*/*/*.json".to_string()
}

fn default_log_data() -> String {
    "log_data/*/*/*.json".to_string()
}

impl Default for InputLayout {
    fn default() -> Self {
        Self {
            song_data: default_song_data(),
            log_data: default_log_data(),
        }
    }
}

// ============================================================================
// Strategies
// ============================================================================

/// How `track_id` surrogate keys are assigned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackIdStrategy {
    /// `(partition_index << 33) + row_index`; run-local, depends on input layout
    #[default]
    PartitionCounter,
    /// SHA-256 of the row content; stable across runs over unchanged input
    ContentHash,
}

/// How play events are resolved against the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStrategy {
    /// Title and artist name matched independently by exact text
    #[default]
    ExactText,
    /// Exact text, and the matched track must belong to the matched artist
    ArtistConsistent,
}

// ============================================================================
// Parquet Settings
// ============================================================================

/// Compression codec for output files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompressionKind {
    #[default]
    Snappy,
    Zstd,
    Gzip,
    Uncompressed,
}

impl From<CompressionKind> for Compression {
    fn from(kind: CompressionKind) -> Self {
        match kind {
            CompressionKind::Snappy => Compression::SNAPPY,
            CompressionKind::Zstd => Compression::ZSTD(ZstdLevel::default()),
            CompressionKind::Gzip => Compression::GZIP(GzipLevel::default()),
            CompressionKind::Uncompressed => Compression::UNCOMPRESSED,
        }
    }
}

/// Parquet output settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParquetSettings {
    /// Compression codec
    #[serde(default)]
    pub compression: CompressionKind,

    /// Maximum rows per row group
    #[serde(default = "default_row_group_size")]
    pub row_group_size: usize,

    /// Dictionary-encode columns
    #[serde(default = "default_true")]
    pub dictionary: bool,

    /// Write column statistics
    #[serde(default = "default_true")]
    pub statistics: bool,
}

fn default_true() -> bool {
    true
}

fn default_row_group_size() -> usize {
    1024 * 1024
}

impl Default for ParquetSettings {
    fn default() -> Self {
        Self {
            compression: CompressionKind::default(),
            row_group_size: default_row_group_size(),
            dictionary: true,
            statistics: true,
        }
    }
}

// ============================================================================
// Loading
// ============================================================================

/// Load a pipeline config from a YAML file
pub fn load_config(path: impl AsRef<Path>) -> Result<PipelineConfig> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
    load_config_from_str(&content)
}

/// Load a pipeline config from a YAML string
pub fn load_config_from_str(yaml: &str) -> Result<PipelineConfig> {
    // An empty document deserialises as unit, not as an empty mapping
    if yaml.trim().is_empty() {
        return Ok(PipelineConfig::default());
    }

    let config: PipelineConfig =
        serde_yaml::from_str(yaml).context("Failed to parse config YAML")?;

    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_empty_config() {
        let config = load_config_from_str("").unwrap();
        assert_eq!(config, PipelineConfig::default());
        assert_eq!(config.play_page, "NextSong");
        assert_eq!(config.layout.song_data, "song_data/*/*/*/*.json");
        assert_eq!(config.layout.log_data, "log_data/*/*/*.json");
    }

    #[test]
    fn test_parse_full_config() {
        let yaml = r#"
input: s3://udacity-dend/
output: s3://sparkify-lake/
layout:
  song_data: "song_data/**/*.json"
  log_data: "log_data/**/*.json"
play_page: NextSong
timezone: "-05:00"
track_ids: content_hash
matching: artist_consistent
read_concurrency: 4
write_concurrency: 2
parquet:
  compression: zstd
  row_group_size: 10000
  dictionary: false
  statistics: false
"#;
        let config = load_config_from_str(yaml).unwrap();
        assert_eq!(config.input, "s3://udacity-dend/");
        assert_eq!(config.output, "s3://sparkify-lake/");
        assert_eq!(config.track_ids, TrackIdStrategy::ContentHash);
        assert_eq!(config.matching, MatchStrategy::ArtistConsistent);
        assert_eq!(config.read_concurrency, 4);
        assert_eq!(config.parquet.compression, CompressionKind::Zstd);
        assert_eq!(config.write_concurrency, 2);
        assert_eq!(config.parquet.row_group_size, 10000);
        assert!(!config.parquet.dictionary);
        assert!(!config.parquet.statistics);
        assert_eq!(
            config.utc_offset().unwrap(),
            FixedOffset::west_opt(5 * 3600).unwrap()
        );
    }

    #[test]
    fn test_reject_unknown_field() {
        let err = load_config_from_str("inptu: /data\n").unwrap_err();
        assert!(err.to_string().contains("Failed to parse config YAML"));
    }

    #[test]
    fn test_reject_bad_timezone() {
        let err = load_config_from_str("timezone: Europe/Paris\n").unwrap_err();
        assert!(err.to_string().contains("timezone"));
    }

    #[test]
    fn test_reject_zero_concurrency() {
        let err = load_config_from_str("read_concurrency: 0\n").unwrap_err();
        assert!(err.to_string().contains("read_concurrency"));
    }

    #[test]
    fn test_write_concurrency_is_separate_setting() {
        let config = load_config_from_str("read_concurrency: 32\n").unwrap();
        assert_eq!(config.read_concurrency, 32);
        assert_eq!(config.write_concurrency, 8);

        let err = load_config_from_str("write_concurrency: 0\n").unwrap_err();
        assert!(err.to_string().contains("write_concurrency"));
    }

    #[test]
    fn test_missing_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.yaml");
        let err = load_config(&path).unwrap_err();
        assert!(matches!(err, Error::Other(_)));
        let message = err.to_string();
        assert!(message.contains("Failed to read config file"));
        assert!(message.contains("absent.yaml"));
        assert!(message.contains("IO error"));
    }

    #[test]
    fn test_reject_empty_play_page() {
        let err = load_config_from_str("play_page: \"\"\n").unwrap_err();
        assert!(err.to_string().contains("play_page"));
    }

    #[test]
    fn test_compression_conversion() {
        assert_eq!(
            Compression::from(CompressionKind::Snappy),
            Compression::SNAPPY
        );
        assert_eq!(
            Compression::from(CompressionKind::Uncompressed),
            Compression::UNCOMPRESSED
        );
    }

    #[test]
    fn test_builder_overrides() {
        let config = PipelineConfig::default()
            .with_input("/in")
            .with_output("/out")
            .with_track_ids(TrackIdStrategy::ContentHash);
        assert_eq!(config.input, "/in");
        assert_eq!(config.output, "/out");
        assert_eq!(config.track_ids, TrackIdStrategy::ContentHash);
        assert!(config.validate().is_ok());
    }
}
