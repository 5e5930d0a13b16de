//! Transform module
//!
//! The pure set transformations of the pipeline. Nothing here touches
//! storage; inputs are decoded partitions and outputs are row vectors.
//!
//! # Overview
//!
//! - `transform_catalog` - track records → `tracks` + `artists`
//! - `transform_activity` - activity records → play events, `users`, `time`
//! - `resolve_plays` - play events × durable catalog × `time` → `plays`
//! - `PlayMatcher` - how event text is matched to catalog entries
//! - `TrackIdGenerator` - surrogate keys for `tracks.track_id`

mod activity;
mod catalog;
mod keys;
mod matching;
mod plays;
mod time;

pub use activity::{
    extract_time, extract_users, filter_plays, transform_activity, ActivityTables, PlayEvent,
};
pub use catalog::{project_artists, project_tracks, transform_catalog, CatalogTables, DurableCatalog};
pub use keys::{content_hash_id, partition_counter_id, TrackContent, TrackIdGenerator, PARTITION_SHIFT};
pub use matching::{
    matcher_for, ArtistConsistentMatcher, CatalogIndex, CatalogMatch, ExactTextMatcher, PlayMatcher,
};
pub use plays::{resolve_plays, PlayResolution};
pub use time::{decompose, start_time_from_millis};
