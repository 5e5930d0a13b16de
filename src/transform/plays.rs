//! Fact resolution for the `plays` table
//!
//! Each play event is matched against the durable catalog, then joined to
//! the time dimension on its exact epoch-millisecond value. The time join
//! is a left join: an event with no time row keeps null `year`/`month`.

use crate::schema::{PlayRow, TimeRow};
use crate::transform::activity::PlayEvent;
use crate::transform::catalog::DurableCatalog;
use crate::transform::matching::{duplicate_artist_rows, CatalogIndex, PlayMatcher};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Output of fact resolution
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlayResolution {
    pub plays: Vec<PlayRow>,
    /// Events that matched no catalog entry and produced no row
    pub unmatched: usize,
}

/// Resolve play events into `plays` rows
///
/// Unmatched events are dropped without error. Rows come out in event
/// order; grouping by (year, month) is left to the partitioned write.
pub fn resolve_plays(
    events: &[PlayEvent],
    time: &[TimeRow],
    catalog: &DurableCatalog,
    matcher: &dyn PlayMatcher,
) -> PlayResolution {
    let index = CatalogIndex::new(catalog);
    let time_by_instant: HashMap<DateTime<Utc>, &TimeRow> =
        time.iter().map(|row| (row.start_time, row)).collect();

    let duplicates = duplicate_artist_rows(catalog);
    if duplicates > 0 {
        debug!(
            "{} artist rows share an id with another row; '{}' may emit one play per row",
            duplicates,
            matcher.name()
        );
    }

    let mut resolution = PlayResolution::default();

    for event in events {
        let matches = matcher.resolve(&event.record, &index);
        if matches.is_empty() {
            resolution.unmatched += 1;
            continue;
        }

        let time_row = time_by_instant.get(&event.start_time);
        if time_row.is_none() {
            warn!(
                "No time row for play at {}; year/month left null",
                event.start_time
            );
        }

        let record = &event.record;
        for found in matches {
            resolution.plays.push(PlayRow {
                start_time: event.start_time,
                user_id: record.user_id.clone(),
                level: record.level.clone(),
                track_id: found.track_id,
                artist_id: found.artist_id,
                session_id: record.session_id.clone(),
                location: record.location.clone(),
                user_agent: record.user_agent.clone(),
                year: time_row.map(|t| t.year),
                month: time_row.map(|t| t.month),
            });
        }
    }

    resolution
}
