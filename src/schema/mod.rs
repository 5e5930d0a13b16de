//! Schema module
//!
//! Typed input records for the two source families and the output rows of
//! the five star-schema tables.
//!
//! # Overview
//!
//! - `TrackRecord`, `ActivityRecord` - deserialised straight from JSON
//! - `TrackRow`, `ArtistRow`, `UserRow`, `TimeRow`, `PlayRow` - output rows
//! - `*_schema()` - Arrow schema of each output table

mod records;
mod tables;

pub use records::{ActivityRecord, TrackRecord};
pub use tables::{
    artists_schema, plays_schema, time_schema, tracks_schema, users_schema, ArtistRow, PlayRow,
    TimeRow, TrackRow, UserRow, TIMESTAMP_TZ,
};
