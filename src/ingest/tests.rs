//! Tests for ingest module

use super::*;
use crate::error::Error;
use crate::schema::{ActivityRecord, TrackRecord};
use crate::storage::{GlobPattern, StorageLocation};
use bytes::Bytes;
use object_store::memory::InMemory;
use std::sync::Arc;

// ============================================================================
// Decoder Tests
// ============================================================================

#[test]
fn test_decode_single_object() {
    let data = br#"{"title": "Song A", "artist_id": "AR1", "year": 2001, "duration": 210.0}"#;
    let records: Vec<TrackRecord> = decode_records("a.json", data).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].title.as_deref(), Some("Song A"));
}

#[test]
fn test_decode_json_lines() {
    let data = b"{\"page\": \"Home\", \"ts\": 1}\n{\"page\": \"NextSong\", \"ts\": 2}\n\n";
    let records: Vec<ActivityRecord> = decode_records("events.json", data).unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[1].ts, Some(2));
}

#[test]
fn test_decode_empty() {
    let records: Vec<TrackRecord> = decode_records("empty.json", b"  \n").unwrap();
    assert!(records.is_empty());
}

#[test]
fn test_decode_schema_violation_names_source_and_line() {
    let data = b"{\"ts\": 1}\n{\"ts\": \"soon\"}\n";
    let err = decode_records::<ActivityRecord>("log_data/bad.json", data).unwrap_err();
    assert!(err.is_schema_violation());
    let message = err.to_string();
    assert!(message.contains("log_data/bad.json"));
    assert!(message.contains("line 2"));
}

#[test]
fn test_decode_malformed_json() {
    let err = decode_records::<TrackRecord>("x.json", b"{\"title\": ").unwrap_err();
    assert!(err.is_schema_violation());
}

// ============================================================================
// Reader Tests
// ============================================================================

async fn seeded_location(objects: &[(&str, &str)]) -> StorageLocation {
    let location = StorageLocation::from_store(Arc::new(InMemory::new()), "input", "memory");
    for (key, body) in objects {
        location
            .put(&location.path(key), Bytes::from(body.to_string()))
            .await
            .unwrap();
    }
    location
}

#[tokio::test]
async fn test_read_partitions_in_key_order() {
    let location = seeded_location(&[
        ("song_data/B/A/A/TRBAA.json", r#"{"title": "Second"}"#),
        ("song_data/A/A/A/TRAAA.json", r#"{"title": "First"}"#),
        ("song_data/A/A/A/notes.txt", "ignored"),
    ])
    .await;

    let pattern = GlobPattern::new("song_data/*/*/*/*.json").unwrap();
    let partitions: Vec<InputPartition<TrackRecord>> =
        read_partitions(&location, &pattern, 4).await.unwrap();

    assert_eq!(partitions.len(), 2);
    assert_eq!(partitions[0].index, 0);
    assert_eq!(partitions[0].source, "song_data/A/A/A/TRAAA.json");
    assert_eq!(partitions[0].records[0].title.as_deref(), Some("First"));
    assert_eq!(partitions[1].index, 1);
    assert_eq!(partitions[1].records[0].title.as_deref(), Some("Second"));
}

#[tokio::test]
async fn test_read_partitions_no_input() {
    let location = seeded_location(&[("other/x.json", "{}")]).await;
    let pattern = GlobPattern::new("log_data/*/*/*.json").unwrap();

    let err = read_partitions::<ActivityRecord>(&location, &pattern, 2)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NoInput { .. }));
}

#[tokio::test]
async fn test_read_partitions_fails_fast_on_bad_record() {
    let location = seeded_location(&[
        ("log_data/2018/11/a.json", r#"{"page": "NextSong", "ts": 1}"#),
        ("log_data/2018/11/b.json", r#"{"page": "NextSong", "ts": "later"}"#),
    ])
    .await;
    let pattern = GlobPattern::new("log_data/*/*/*.json").unwrap();

    let err = read_partitions::<ActivityRecord>(&location, &pattern, 2)
        .await
        .unwrap_err();
    assert!(err.is_schema_violation());
    assert!(err.to_string().contains("log_data/2018/11/b.json"));
}
