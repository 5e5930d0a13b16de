//! Activity transform: play filtering, users and time
//!
//! Non-play events are dropped before anything else; every table built
//! here, and the fact resolution after it, sees play events only.

use crate::error::{Error, Result};
use crate::ingest::InputPartition;
use crate::schema::{ActivityRecord, TimeRow, UserRow};
use crate::transform::time::{decompose, start_time_from_millis};
use chrono::{DateTime, FixedOffset, Utc};
use std::collections::{BTreeMap, HashSet};

/// A play event with its derived timestamp
#[derive(Debug, Clone, PartialEq)]
pub struct PlayEvent {
    /// Event time as received, epoch milliseconds
    pub ts: i64,
    /// Derived timestamp
    pub start_time: DateTime<Utc>,
    pub record: ActivityRecord,
}

/// Output of the activity transform, before it is written
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ActivityTables {
    pub users: Vec<UserRow>,
    pub time: Vec<TimeRow>,
    /// Event-level rows kept for fact resolution
    pub events: Vec<PlayEvent>,
}

/// Run the activity transform over every input partition
pub fn transform_activity(
    partitions: &[InputPartition<ActivityRecord>],
    play_page: &str,
    offset: &FixedOffset,
) -> Result<ActivityTables> {
    let events = filter_plays(partitions, play_page)?;
    Ok(ActivityTables {
        users: extract_users(&events),
        time: extract_time(&events, offset),
        events,
    })
}

/// Keep play events and derive their timestamps
///
/// A play event without a usable `ts` is a schema violation: nothing
/// downstream can place it in time.
pub fn filter_plays(
    partitions: &[InputPartition<ActivityRecord>],
    play_page: &str,
) -> Result<Vec<PlayEvent>> {
    let mut events = Vec::new();

    for partition in partitions {
        for record in &partition.records {
            if !record.is_play(play_page) {
                continue;
            }
            let ts = record.ts.ok_or_else(|| {
                Error::schema(&partition.source, "play event without 'ts'")
            })?;
            let start_time = start_time_from_millis(ts).ok_or_else(|| {
                Error::schema(&partition.source, format!("'ts' {ts} is out of range"))
            })?;
            events.push(PlayEvent {
                ts,
                start_time,
                record: record.clone(),
            });
        }
    }

    Ok(events)
}

/// Distinct `users` rows in first-seen order
///
/// Rows are compared on all five columns, so a user whose level changed
/// appears once per level.
pub fn extract_users(events: &[PlayEvent]) -> Vec<UserRow> {
    let mut seen = HashSet::new();
    let mut users = Vec::new();

    for event in events {
        let record = &event.record;
        let row = UserRow {
            user_id: record.user_id.clone(),
            first_name: record.first_name.clone(),
            last_name: record.last_name.clone(),
            gender: record.gender.clone(),
            level: record.level.clone(),
        };
        if seen.insert(row.clone()) {
            users.push(row);
        }
    }

    users
}

/// One `time` row per distinct timestamp, ordered by timestamp
pub fn extract_time(events: &[PlayEvent], offset: &FixedOffset) -> Vec<TimeRow> {
    let distinct: BTreeMap<i64, DateTime<Utc>> =
        events.iter().map(|e| (e.ts, e.start_time)).collect();

    distinct
        .into_values()
        .map(|start_time| decompose(start_time, offset))
        .collect()
}
