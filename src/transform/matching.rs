//! Matching play events to catalog entries
//!
//! Events carry no catalog keys, only the song title and artist name the
//! player displayed. A `PlayMatcher` turns that text into (track, artist)
//! pairs; swapping the matcher changes the join without touching the rest
//! of fact resolution.

use crate::config::MatchStrategy;
use crate::schema::{ActivityRecord, ArtistRow, TrackRow};
use crate::transform::catalog::{ArtistKey, DurableCatalog};
use std::collections::{HashMap, HashSet};

/// A catalog entry a play event resolved to
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CatalogMatch {
    pub track_id: i64,
    pub artist_id: Option<String>,
}

/// Lookup tables over a durable catalog, keyed by exact text
#[derive(Debug)]
pub struct CatalogIndex<'a> {
    tracks_by_title: HashMap<&'a str, Vec<&'a TrackRow>>,
    artists_by_name: HashMap<&'a str, Vec<&'a ArtistRow>>,
}

impl<'a> CatalogIndex<'a> {
    /// Index a catalog; rows with a null title or name are unreachable
    pub fn new(catalog: &'a DurableCatalog) -> Self {
        let mut tracks_by_title: HashMap<&str, Vec<&TrackRow>> = HashMap::new();
        for track in catalog.tracks() {
            if let Some(title) = track.title.as_deref() {
                tracks_by_title.entry(title).or_default().push(track);
            }
        }

        let mut artists_by_name: HashMap<&str, Vec<&ArtistRow>> = HashMap::new();
        for artist in catalog.artists() {
            if let Some(name) = artist.name.as_deref() {
                artists_by_name.entry(name).or_default().push(artist);
            }
        }

        Self {
            tracks_by_title,
            artists_by_name,
        }
    }

    /// Tracks whose title equals `title`, case-sensitively
    pub fn tracks_titled(&self, title: &str) -> &[&'a TrackRow] {
        self.tracks_by_title
            .get(title)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Artist rows whose name equals `name`, case-sensitively
    pub fn artists_named(&self, name: &str) -> &[&'a ArtistRow] {
        self.artists_by_name
            .get(name)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

/// Strategy for resolving a play event against the catalog
pub trait PlayMatcher: Send + Sync {
    /// Strategy name, for logging
    fn name(&self) -> &'static str;

    /// Every catalog entry the event resolves to; empty means no fact row
    fn resolve(&self, event: &ActivityRecord, index: &CatalogIndex<'_>) -> Vec<CatalogMatch>;
}

/// Title and artist name matched independently by exact text
///
/// Behaves as two inner joins: every track with the event's title paired
/// with every artist row carrying the event's artist name. Duplicate titles
/// or duplicate artist rows multiply the matches.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactTextMatcher;

impl PlayMatcher for ExactTextMatcher {
    fn name(&self) -> &'static str {
        "exact_text"
    }

    fn resolve(&self, event: &ActivityRecord, index: &CatalogIndex<'_>) -> Vec<CatalogMatch> {
        let (Some(song), Some(artist)) = (event.song.as_deref(), event.artist.as_deref()) else {
            return Vec::new();
        };

        let tracks = index.tracks_titled(song);
        let artists = index.artists_named(artist);

        tracks
            .iter()
            .flat_map(|track| {
                artists.iter().map(move |artist| CatalogMatch {
                    track_id: track.track_id,
                    artist_id: artist.artist_id.clone(),
                })
            })
            .collect()
    }
}

/// Exact text, and the track must belong to the matched artist
///
/// Each distinct (track, artist) pair is emitted once, however many
/// artist rows share the id.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArtistConsistentMatcher;

impl PlayMatcher for ArtistConsistentMatcher {
    fn name(&self) -> &'static str {
        "artist_consistent"
    }

    fn resolve(&self, event: &ActivityRecord, index: &CatalogIndex<'_>) -> Vec<CatalogMatch> {
        let (Some(song), Some(artist)) = (event.song.as_deref(), event.artist.as_deref()) else {
            return Vec::new();
        };

        let artist_ids: HashSet<&str> = index
            .artists_named(artist)
            .iter()
            .filter_map(|a| a.artist_id.as_deref())
            .collect();

        let mut seen = HashSet::new();
        index
            .tracks_titled(song)
            .iter()
            .filter_map(|track| {
                let artist_id = track.artist_id.as_deref()?;
                artist_ids.contains(artist_id).then(|| CatalogMatch {
                    track_id: track.track_id,
                    artist_id: Some(artist_id.to_string()),
                })
            })
            .filter(|m| seen.insert(m.clone()))
            .collect()
    }
}

/// Matcher for a configured strategy
pub fn matcher_for(strategy: MatchStrategy) -> Box<dyn PlayMatcher> {
    match strategy {
        MatchStrategy::ExactText => Box::new(ExactTextMatcher),
        MatchStrategy::ArtistConsistent => Box::new(ArtistConsistentMatcher),
    }
}

/// Number of extra artist rows sharing an id with another row
pub(crate) fn duplicate_artist_rows(catalog: &DurableCatalog) -> usize {
    let rows: HashSet<ArtistKey> = catalog.artists().iter().map(ArtistKey::of).collect();
    let ids: HashSet<Option<&str>> = catalog
        .artists()
        .iter()
        .map(|a| a.artist_id.as_deref())
        .collect();
    rows.len().saturating_sub(ids.len())
}
