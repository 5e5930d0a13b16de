//! Common types used throughout Sparkify Lake
//!
//! Table names for the output area and the statistics reported by a
//! pipeline run.

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Output Tables
// ============================================================================

/// One of the five tables written to the output area
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableName {
    Tracks,
    Artists,
    Users,
    Time,
    Plays,
}

impl TableName {
    /// All tables in the order a full run writes them
    pub const ALL: [TableName; 5] = [
        TableName::Tracks,
        TableName::Artists,
        TableName::Users,
        TableName::Time,
        TableName::Plays,
    ];

    /// Table name as used for its sub-path in the output area
    pub fn as_str(self) -> &'static str {
        match self {
            TableName::Tracks => "tracks",
            TableName::Artists => "artists",
            TableName::Users => "users",
            TableName::Time => "time",
            TableName::Plays => "plays",
        }
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Statistics
// ============================================================================

/// What a single table write produced
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableStats {
    /// Table written
    pub table: TableName,
    /// Rows written
    pub rows: usize,
    /// Distinct partition directories (1 for unpartitioned tables)
    pub partitions: usize,
    /// Parquet files written
    pub files: usize,
}

/// Statistics from a pipeline run
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunStats {
    /// Track records ingested
    pub track_records: usize,
    /// Activity records ingested (all pages)
    pub activity_records: usize,
    /// Activity records that are play events
    pub play_events: usize,
    /// Play events without a catalog match
    pub unmatched_plays: usize,
    /// Per-table write results, in write order
    pub tables: Vec<TableStats>,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl RunStats {
    /// Create new stats
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a table write
    pub fn add_table(&mut self, stats: TableStats) {
        self.tables.push(stats);
    }

    /// Rows written for a table, if it was written in this run
    pub fn rows(&self, table: TableName) -> Option<usize> {
        self.tables
            .iter()
            .find(|t| t.table == table)
            .map(|t| t.rows)
    }

    /// Set duration
    pub fn set_duration(&mut self, ms: u64) {
        self.duration_ms = ms;
    }
}
