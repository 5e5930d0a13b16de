//! Conversion between output rows and Arrow RecordBatches

use crate::error::{Error, Result};
use crate::schema::{
    artists_schema, plays_schema, time_schema, tracks_schema, users_schema, ArtistRow, PlayRow,
    TimeRow, TrackRow, UserRow, TIMESTAMP_TZ,
};
use crate::types::TableName;
use arrow::array::{
    Array, ArrayRef, Float64Array, Int32Array, Int64Array, StringArray,
    TimestampMillisecondArray,
};
use arrow::datatypes::SchemaRef;
use arrow::record_batch::RecordBatch;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// A row type of one output table
pub trait TableRow: Sized {
    /// Table the rows belong to
    const TABLE: TableName;

    /// Full logical schema of the table
    fn schema() -> SchemaRef;

    /// Build a batch with the full schema
    fn to_batch(rows: &[Self]) -> Result<RecordBatch>;

    /// Read rows back from a batch with the full schema
    fn from_batch(batch: &RecordBatch) -> Result<Vec<Self>>;
}

// ============================================================================
// Column helpers
// ============================================================================

fn strings<'a>(values: impl Iterator<Item = &'a Option<String>>) -> ArrayRef {
    Arc::new(values.map(Option::as_deref).collect::<StringArray>())
}

fn timestamps(values: impl Iterator<Item = DateTime<Utc>>) -> ArrayRef {
    let millis: Vec<i64> = values.map(|t| t.timestamp_millis()).collect();
    Arc::new(TimestampMillisecondArray::from(millis).with_timezone(TIMESTAMP_TZ))
}

fn column<'a, T: Array + 'static>(batch: &'a RecordBatch, name: &str) -> Result<&'a T> {
    batch
        .column_by_name(name)
        .ok_or_else(|| Error::output(format!("Column '{name}' missing from batch")))?
        .as_any()
        .downcast_ref::<T>()
        .ok_or_else(|| Error::output(format!("Column '{name}' has unexpected type")))
}

fn opt_string(array: &StringArray, row: usize) -> Option<String> {
    (!array.is_null(row)).then(|| array.value(row).to_string())
}

fn opt_i32(array: &Int32Array, row: usize) -> Option<i32> {
    (!array.is_null(row)).then(|| array.value(row))
}

fn opt_f64(array: &Float64Array, row: usize) -> Option<f64> {
    (!array.is_null(row)).then(|| array.value(row))
}

fn req_i32(array: &Int32Array, name: &str, row: usize) -> Result<i32> {
    opt_i32(array, row).ok_or_else(|| Error::output(format!("Null in non-null column '{name}'")))
}

fn req_i64(array: &Int64Array, name: &str, row: usize) -> Result<i64> {
    if array.is_null(row) {
        return Err(Error::output(format!("Null in non-null column '{name}'")));
    }
    Ok(array.value(row))
}

fn req_timestamp(array: &TimestampMillisecondArray, name: &str, row: usize) -> Result<DateTime<Utc>> {
    if array.is_null(row) {
        return Err(Error::output(format!("Null in non-null column '{name}'")));
    }
    let millis = array.value(row);
    DateTime::from_timestamp_millis(millis)
        .ok_or_else(|| Error::output(format!("Timestamp {millis} out of range in '{name}'")))
}

// ============================================================================
// Table rows
// ============================================================================

impl TableRow for TrackRow {
    const TABLE: TableName = TableName::Tracks;

    fn schema() -> SchemaRef {
        tracks_schema()
    }

    fn to_batch(rows: &[Self]) -> Result<RecordBatch> {
        let columns: Vec<ArrayRef> = vec![
            Arc::new(Int64Array::from_iter_values(rows.iter().map(|r| r.track_id))),
            strings(rows.iter().map(|r| &r.title)),
            strings(rows.iter().map(|r| &r.artist_id)),
            Arc::new(rows.iter().map(|r| r.year).collect::<Int32Array>()),
            Arc::new(rows.iter().map(|r| r.duration).collect::<Float64Array>()),
        ];
        Ok(RecordBatch::try_new(Self::schema(), columns)?)
    }

    fn from_batch(batch: &RecordBatch) -> Result<Vec<Self>> {
        let track_id = column::<Int64Array>(batch, "track_id")?;
        let title = column::<StringArray>(batch, "title")?;
        let artist_id = column::<StringArray>(batch, "artist_id")?;
        let year = column::<Int32Array>(batch, "year")?;
        let duration = column::<Float64Array>(batch, "duration")?;

        (0..batch.num_rows())
            .map(|i| {
                Ok(TrackRow {
                    track_id: req_i64(track_id, "track_id", i)?,
                    title: opt_string(title, i),
                    artist_id: opt_string(artist_id, i),
                    year: opt_i32(year, i),
                    duration: opt_f64(duration, i),
                })
            })
            .collect()
    }
}

impl TableRow for ArtistRow {
    const TABLE: TableName = TableName::Artists;

    fn schema() -> SchemaRef {
        artists_schema()
    }

    fn to_batch(rows: &[Self]) -> Result<RecordBatch> {
        let columns: Vec<ArrayRef> = vec![
            strings(rows.iter().map(|r| &r.artist_id)),
            strings(rows.iter().map(|r| &r.name)),
            strings(rows.iter().map(|r| &r.location)),
            Arc::new(rows.iter().map(|r| r.longitude).collect::<Float64Array>()),
            Arc::new(rows.iter().map(|r| r.latitude).collect::<Float64Array>()),
        ];
        Ok(RecordBatch::try_new(Self::schema(), columns)?)
    }

    fn from_batch(batch: &RecordBatch) -> Result<Vec<Self>> {
        let artist_id = column::<StringArray>(batch, "artist_id")?;
        let name = column::<StringArray>(batch, "name")?;
        let location = column::<StringArray>(batch, "location")?;
        let longitude = column::<Float64Array>(batch, "longitude")?;
        let latitude = column::<Float64Array>(batch, "latitude")?;

        Ok((0..batch.num_rows())
            .map(|i| ArtistRow {
                artist_id: opt_string(artist_id, i),
                name: opt_string(name, i),
                location: opt_string(location, i),
                longitude: opt_f64(longitude, i),
                latitude: opt_f64(latitude, i),
            })
            .collect())
    }
}

impl TableRow for UserRow {
    const TABLE: TableName = TableName::Users;

    fn schema() -> SchemaRef {
        users_schema()
    }

    fn to_batch(rows: &[Self]) -> Result<RecordBatch> {
        let columns: Vec<ArrayRef> = vec![
            strings(rows.iter().map(|r| &r.user_id)),
            strings(rows.iter().map(|r| &r.first_name)),
            strings(rows.iter().map(|r| &r.last_name)),
            strings(rows.iter().map(|r| &r.gender)),
            strings(rows.iter().map(|r| &r.level)),
        ];
        Ok(RecordBatch::try_new(Self::schema(), columns)?)
    }

    fn from_batch(batch: &RecordBatch) -> Result<Vec<Self>> {
        let user_id = column::<StringArray>(batch, "user_id")?;
        let first_name = column::<StringArray>(batch, "first_name")?;
        let last_name = column::<StringArray>(batch, "last_name")?;
        let gender = column::<StringArray>(batch, "gender")?;
        let level = column::<StringArray>(batch, "level")?;

        Ok((0..batch.num_rows())
            .map(|i| UserRow {
                user_id: opt_string(user_id, i),
                first_name: opt_string(first_name, i),
                last_name: opt_string(last_name, i),
                gender: opt_string(gender, i),
                level: opt_string(level, i),
            })
            .collect())
    }
}

impl TableRow for TimeRow {
    const TABLE: TableName = TableName::Time;

    fn schema() -> SchemaRef {
        time_schema()
    }

    fn to_batch(rows: &[Self]) -> Result<RecordBatch> {
        let ints = |f: fn(&TimeRow) -> i32| -> ArrayRef {
            Arc::new(Int32Array::from_iter_values(rows.iter().map(f)))
        };
        let columns: Vec<ArrayRef> = vec![
            timestamps(rows.iter().map(|r| r.start_time)),
            ints(|r| r.hour),
            ints(|r| r.day),
            ints(|r| r.week),
            ints(|r| r.month),
            ints(|r| r.year),
            ints(|r| r.weekday),
        ];
        Ok(RecordBatch::try_new(Self::schema(), columns)?)
    }

    fn from_batch(batch: &RecordBatch) -> Result<Vec<Self>> {
        let start_time = column::<TimestampMillisecondArray>(batch, "start_time")?;
        let hour = column::<Int32Array>(batch, "hour")?;
        let day = column::<Int32Array>(batch, "day")?;
        let week = column::<Int32Array>(batch, "week")?;
        let month = column::<Int32Array>(batch, "month")?;
        let year = column::<Int32Array>(batch, "year")?;
        let weekday = column::<Int32Array>(batch, "weekday")?;

        (0..batch.num_rows())
            .map(|i| {
                Ok(TimeRow {
                    start_time: req_timestamp(start_time, "start_time", i)?,
                    hour: req_i32(hour, "hour", i)?,
                    day: req_i32(day, "day", i)?,
                    week: req_i32(week, "week", i)?,
                    month: req_i32(month, "month", i)?,
                    year: req_i32(year, "year", i)?,
                    weekday: req_i32(weekday, "weekday", i)?,
                })
            })
            .collect()
    }
}

impl TableRow for PlayRow {
    const TABLE: TableName = TableName::Plays;

    fn schema() -> SchemaRef {
        plays_schema()
    }

    fn to_batch(rows: &[Self]) -> Result<RecordBatch> {
        let columns: Vec<ArrayRef> = vec![
            timestamps(rows.iter().map(|r| r.start_time)),
            strings(rows.iter().map(|r| &r.user_id)),
            strings(rows.iter().map(|r| &r.level)),
            Arc::new(Int64Array::from_iter_values(rows.iter().map(|r| r.track_id))),
            strings(rows.iter().map(|r| &r.artist_id)),
            strings(rows.iter().map(|r| &r.session_id)),
            strings(rows.iter().map(|r| &r.location)),
            strings(rows.iter().map(|r| &r.user_agent)),
            Arc::new(rows.iter().map(|r| r.year).collect::<Int32Array>()),
            Arc::new(rows.iter().map(|r| r.month).collect::<Int32Array>()),
        ];
        Ok(RecordBatch::try_new(Self::schema(), columns)?)
    }

    fn from_batch(batch: &RecordBatch) -> Result<Vec<Self>> {
        let start_time = column::<TimestampMillisecondArray>(batch, "start_time")?;
        let user_id = column::<StringArray>(batch, "user_id")?;
        let level = column::<StringArray>(batch, "level")?;
        let track_id = column::<Int64Array>(batch, "track_id")?;
        let artist_id = column::<StringArray>(batch, "artist_id")?;
        let session_id = column::<StringArray>(batch, "session_id")?;
        let location = column::<StringArray>(batch, "location")?;
        let user_agent = column::<StringArray>(batch, "user_agent")?;
        let year = column::<Int32Array>(batch, "year")?;
        let month = column::<Int32Array>(batch, "month")?;

        (0..batch.num_rows())
            .map(|i| {
                Ok(PlayRow {
                    start_time: req_timestamp(start_time, "start_time", i)?,
                    user_id: opt_string(user_id, i),
                    level: opt_string(level, i),
                    track_id: req_i64(track_id, "track_id", i)?,
                    artist_id: opt_string(artist_id, i),
                    session_id: opt_string(session_id, i),
                    location: opt_string(location, i),
                    user_agent: opt_string(user_agent, i),
                    year: opt_i32(year, i),
                    month: opt_i32(month, i),
                })
            })
            .collect()
    }
}
