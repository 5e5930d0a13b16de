//! Track catalog transform
//!
//! Projects track metadata records into the `tracks` and `artists` tables.

use crate::config::TrackIdStrategy;
use crate::ingest::InputPartition;
use crate::schema::{ArtistRow, TrackRecord, TrackRow};
use crate::transform::keys::{TrackContent, TrackIdGenerator};
use std::collections::HashSet;

/// Output of the catalog transform, before it is written
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CatalogTables {
    pub tracks: Vec<TrackRow>,
    pub artists: Vec<ArtistRow>,
}

/// The catalog tables as read back from storage after a complete write
///
/// Only the table sink can build one, so holding a `DurableCatalog`
/// proves the `tracks` and `artists` outputs are visible to readers.
#[derive(Debug, Clone)]
pub struct DurableCatalog {
    tracks: Vec<TrackRow>,
    artists: Vec<ArtistRow>,
}

impl DurableCatalog {
    pub(crate) fn from_storage(tracks: Vec<TrackRow>, artists: Vec<ArtistRow>) -> Self {
        Self { tracks, artists }
    }

    /// Tracks as persisted
    pub fn tracks(&self) -> &[TrackRow] {
        &self.tracks
    }

    /// Artists as persisted
    pub fn artists(&self) -> &[ArtistRow] {
        &self.artists
    }
}

/// Run the catalog transform over every input partition
pub fn transform_catalog(
    partitions: &[InputPartition<TrackRecord>],
    strategy: TrackIdStrategy,
) -> CatalogTables {
    CatalogTables {
        tracks: project_tracks(partitions, strategy),
        artists: project_artists(partitions.iter().flat_map(|p| p.records.iter())),
    }
}

/// One `tracks` row per input record, each with a fresh surrogate key
///
/// Tracks are not deduplicated: two identical records become two rows
/// with different ids.
pub fn project_tracks(
    partitions: &[InputPartition<TrackRecord>],
    strategy: TrackIdStrategy,
) -> Vec<TrackRow> {
    let mut ids = TrackIdGenerator::new(strategy);
    let mut tracks = Vec::with_capacity(partitions.iter().map(InputPartition::len).sum());

    for partition in partitions {
        for (row, record) in partition.records.iter().enumerate() {
            let content = TrackContent {
                title: record.title.as_deref(),
                artist_id: record.artist_id.as_deref(),
                year: record.year,
                duration: record.duration,
            };
            tracks.push(TrackRow {
                track_id: ids.next_id(partition.index, row, &content),
                title: record.title.clone(),
                artist_id: record.artist_id.clone(),
                year: record.year,
                duration: record.duration,
            });
        }
    }

    tracks
}

/// Distinct `artists` rows, compared on all five columns, in first-seen order
///
/// The same artist id with a different name, location or coordinates is a
/// different row and is kept.
pub fn project_artists<'a>(records: impl IntoIterator<Item = &'a TrackRecord>) -> Vec<ArtistRow> {
    let mut seen = HashSet::new();
    let mut artists = Vec::new();

    for record in records {
        let row = ArtistRow {
            artist_id: record.artist_id.clone(),
            name: record.artist_name.clone(),
            location: record.artist_location.clone(),
            longitude: record.artist_longitude,
            latitude: record.artist_latitude,
        };
        if seen.insert(ArtistKey::of(&row)) {
            artists.push(row);
        }
    }

    artists
}

/// Hashable full-row identity of an artist row
///
/// Floats compare by bit pattern, with -0.0 folded into 0.0 and every NaN
/// treated as the same value.
#[derive(Debug, PartialEq, Eq, Hash)]
pub(crate) struct ArtistKey {
    artist_id: Option<String>,
    name: Option<String>,
    location: Option<String>,
    longitude: Option<u64>,
    latitude: Option<u64>,
}

impl ArtistKey {
    pub(crate) fn of(row: &ArtistRow) -> Self {
        Self {
            artist_id: row.artist_id.clone(),
            name: row.name.clone(),
            location: row.location.clone(),
            longitude: row.longitude.map(float_key),
            latitude: row.latitude.map(float_key),
        }
    }
}

fn float_key(value: f64) -> u64 {
    if value == 0.0 {
        0.0f64.to_bits()
    } else if value.is_nan() {
        f64::NAN.to_bits()
    } else {
        value.to_bits()
    }
}
