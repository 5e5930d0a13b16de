//! Output row types and their Arrow schemas
//!
//! Column order in each schema is the logical order of the table. The
//! physical layout (which columns become partition directories) is
//! declared separately in `output::layout`.

use arrow::datatypes::{DataType, Field, Schema, SchemaRef, TimeUnit};
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Timezone tag carried by every timestamp column
pub const TIMESTAMP_TZ: &str = "UTC";

fn timestamp_type() -> DataType {
    DataType::Timestamp(TimeUnit::Millisecond, Some(TIMESTAMP_TZ.into()))
}

// ============================================================================
// Dimension rows
// ============================================================================

/// Row of the `tracks` table
#[derive(Debug, Clone, PartialEq)]
pub struct TrackRow {
    /// Run-local surrogate key
    pub track_id: i64,
    pub title: Option<String>,
    pub artist_id: Option<String>,
    pub year: Option<i32>,
    pub duration: Option<f64>,
}

/// Row of the `artists` table
#[derive(Debug, Clone, PartialEq)]
pub struct ArtistRow {
    pub artist_id: Option<String>,
    pub name: Option<String>,
    pub location: Option<String>,
    pub longitude: Option<f64>,
    pub latitude: Option<f64>,
}

/// Row of the `users` table
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UserRow {
    pub user_id: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub gender: Option<String>,
    pub level: Option<String>,
}

/// Row of the `time` table, keyed by `start_time`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TimeRow {
    pub start_time: DateTime<Utc>,
    pub hour: i32,
    pub day: i32,
    /// ISO-8601 week number
    pub week: i32,
    pub month: i32,
    pub year: i32,
    /// ISO-8601 weekday, 1 = Monday .. 7 = Sunday
    pub weekday: i32,
}

// ============================================================================
// Fact rows
// ============================================================================

/// Row of the `plays` fact table
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PlayRow {
    pub start_time: DateTime<Utc>,
    pub user_id: Option<String>,
    pub level: Option<String>,
    pub track_id: i64,
    pub artist_id: Option<String>,
    pub session_id: Option<String>,
    pub location: Option<String>,
    pub user_agent: Option<String>,
    /// Null only when the time dimension had no row for `start_time`
    pub year: Option<i32>,
    pub month: Option<i32>,
}

// ============================================================================
// Arrow schemas
// ============================================================================

/// Schema of the `tracks` table
pub fn tracks_schema() -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new("track_id", DataType::Int64, false),
        Field::new("title", DataType::Utf8, true),
        Field::new("artist_id", DataType::Utf8, true),
        Field::new("year", DataType::Int32, true),
        Field::new("duration", DataType::Float64, true),
    ]))
}

/// Schema of the `artists` table
pub fn artists_schema() -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new("artist_id", DataType::Utf8, true),
        Field::new("name", DataType::Utf8, true),
        Field::new("location", DataType::Utf8, true),
        Field::new("longitude", DataType::Float64, true),
        Field::new("latitude", DataType::Float64, true),
    ]))
}

/// Schema of the `users` table
pub fn users_schema() -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new("user_id", DataType::Utf8, true),
        Field::new("first_name", DataType::Utf8, true),
        Field::new("last_name", DataType::Utf8, true),
        Field::new("gender", DataType::Utf8, true),
        Field::new("level", DataType::Utf8, true),
    ]))
}

/// Schema of the `time` table
pub fn time_schema() -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new("start_time", timestamp_type(), false),
        Field::new("hour", DataType::Int32, false),
        Field::new("day", DataType::Int32, false),
        Field::new("week", DataType::Int32, false),
        Field::new("month", DataType::Int32, false),
        Field::new("year", DataType::Int32, false),
        Field::new("weekday", DataType::Int32, false),
    ]))
}

/// Schema of the `plays` table
pub fn plays_schema() -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new("start_time", timestamp_type(), false),
        Field::new("user_id", DataType::Utf8, true),
        Field::new("level", DataType::Utf8, true),
        Field::new("track_id", DataType::Int64, false),
        Field::new("artist_id", DataType::Utf8, true),
        Field::new("session_id", DataType::Utf8, true),
        Field::new("location", DataType::Utf8, true),
        Field::new("user_agent", DataType::Utf8, true),
        Field::new("year", DataType::Int32, true),
        Field::new("month", DataType::Int32, true),
    ]))
}
