//! Tests for output module

use super::*;
use crate::schema::{time_schema, ArtistRow, PlayRow, TimeRow, TrackRow, UserRow};
use crate::storage::StorageLocation;
use crate::transform::CatalogTables;
use crate::types::TableName;
use crate::error::Error;
use arrow::array::{Array, Int32Array};
use chrono::{DateTime, TimeZone, Utc};
use object_store::memory::InMemory;
use parquet::basic::{Compression, ZstdLevel};
use pretty_assertions::assert_eq;
use std::sync::Arc;

fn memory_sink() -> TableSink {
    let location = StorageLocation::from_store(Arc::new(InMemory::new()), "lake", "memory");
    TableSink::new(location, ParquetWriterConfig::default())
}

fn track(track_id: i64, title: &str, artist_id: Option<&str>, year: Option<i32>) -> TrackRow {
    TrackRow {
        track_id,
        title: Some(title.to_string()),
        artist_id: artist_id.map(str::to_string),
        year,
        duration: Some(200.5),
    }
}

fn instant(ms: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(ms).unwrap()
}

fn time_row(ms: i64, year: i32, month: i32) -> TimeRow {
    TimeRow {
        start_time: instant(ms),
        hour: 3,
        day: 14,
        week: 46,
        month,
        year,
        weekday: 3,
    }
}

async fn keys(sink: &TableSink, table: &str) -> Vec<String> {
    let location = sink.location();
    location
        .list(table)
        .await
        .unwrap()
        .iter()
        .filter_map(|p| location.relative_key(p))
        .collect()
}

// ============================================================================
// Path Escaping Tests
// ============================================================================

#[test]
fn test_escape_path_value() {
    assert_eq!(escape_path_value("ARJIE2Y1187B994AB7"), "ARJIE2Y1187B994AB7");
    assert_eq!(escape_path_value("AC/DC"), "AC%2FDC");
    assert_eq!(escape_path_value("a=b"), "a%3Db");
    assert_eq!(escape_path_value("100%"), "100%25");
    assert_eq!(escape_path_value("Sigur Rós"), "Sigur Rós");
}

#[test]
fn test_unescape_reverses_escape() {
    for value in ["AC/DC", "a=b:c", "50% off", "tab\there", "[x]{y}"] {
        assert_eq!(unescape_path_value(&escape_path_value(value)), value);
    }
}

#[test]
fn test_parse_partition_dirs() {
    let segments = vec![
        "year=2018".to_string(),
        format!("month={NULL_PARTITION}"),
        "artist_id=AC%2FDC".to_string(),
    ];
    let parsed = parse_partition_dirs(&segments).unwrap();
    assert_eq!(
        parsed,
        vec![
            ("year".to_string(), Some("2018".to_string())),
            ("month".to_string(), None),
            ("artist_id".to_string(), Some("AC/DC".to_string())),
        ]
    );

    let err = parse_partition_dirs(&["not-a-partition".to_string()]).unwrap_err();
    assert!(matches!(err, Error::Output { .. }));
}

// ============================================================================
// Layout Tests
// ============================================================================

#[test]
fn test_partition_spec_per_table() {
    assert_eq!(
        PartitionSpec::for_table(TableName::Tracks).columns(),
        &["year".to_string(), "artist_id".to_string()]
    );
    assert_eq!(
        PartitionSpec::for_table(TableName::Plays).columns(),
        &["year".to_string(), "month".to_string()]
    );
    assert!(PartitionSpec::for_table(TableName::Time).is_partitioned());
    assert!(!PartitionSpec::for_table(TableName::Artists).is_partitioned());
    assert!(!PartitionSpec::for_table(TableName::Users).is_partitioned());
}

#[test]
fn test_file_schema_drops_partition_columns() {
    let spec = PartitionSpec::for_table(TableName::Time);
    let file_schema = spec.file_schema(time_schema().as_ref());
    let names: Vec<&str> = file_schema.fields().iter().map(|f| f.name().as_str()).collect();
    assert_eq!(names, vec!["start_time", "hour", "day", "week", "weekday"]);
}

#[test]
fn test_split_by_partition_groups_rows() {
    let rows = vec![
        time_row(1_542_165_000_000, 2018, 11),
        time_row(1_514_800_000_000, 2018, 1),
        time_row(1_542_166_000_000, 2018, 11),
    ];
    let batch = TimeRow::to_batch(&rows).unwrap();
    let parts = split_by_partition(&batch, &PartitionSpec::for_table(TableName::Time)).unwrap();

    let dirs: Vec<&str> = parts.iter().map(|p| p.dir.as_str()).collect();
    assert_eq!(dirs, vec!["year=2018/month=1", "year=2018/month=11"]);
    assert_eq!(parts[0].batch.num_rows(), 1);
    assert_eq!(parts[1].batch.num_rows(), 2);
    assert!(parts[1].batch.column_by_name("month").is_none());
}

#[test]
fn test_split_and_restore_round_trip() {
    let rows = vec![time_row(1_542_165_000_000, 2018, 11)];
    let batch = TimeRow::to_batch(&rows).unwrap();
    let parts = split_by_partition(&batch, &PartitionSpec::for_table(TableName::Time)).unwrap();

    let segments: Vec<String> = parts[0].dir.split('/').map(str::to_string).collect();
    let values = parse_partition_dirs(&segments).unwrap();
    let restored = restore_partition_columns(&parts[0].batch, &values, &time_schema()).unwrap();

    let month = restored
        .column_by_name("month")
        .unwrap()
        .as_any()
        .downcast_ref::<Int32Array>()
        .unwrap();
    assert_eq!(month.value(0), 11);
    assert_eq!(TimeRow::from_batch(&restored).unwrap(), rows);
}

#[test]
fn test_null_partition_value() {
    let rows = vec![track(7, "Untitled", None, None)];
    let batch = TrackRow::to_batch(&rows).unwrap();
    let parts = split_by_partition(&batch, &PartitionSpec::for_table(TableName::Tracks)).unwrap();

    assert_eq!(
        parts[0].dir,
        format!("year={NULL_PARTITION}/artist_id={NULL_PARTITION}")
    );

    let segments: Vec<String> = parts[0].dir.split('/').map(str::to_string).collect();
    let values = parse_partition_dirs(&segments).unwrap();
    let restored =
        restore_partition_columns(&parts[0].batch, &values, &TrackRow::schema()).unwrap();
    assert!(restored.column_by_name("year").unwrap().is_null(0));
    assert_eq!(TrackRow::from_batch(&restored).unwrap(), rows);
}

#[test]
fn test_unpartitioned_empty_table_yields_one_part() {
    let batch = UserRow::to_batch(&[]).unwrap();
    let parts = split_by_partition(&batch, &PartitionSpec::none()).unwrap();
    assert_eq!(parts.len(), 1);
    assert_eq!(parts[0].batch.num_rows(), 0);

    let batch = PlayRow::to_batch(&[]).unwrap();
    let parts = split_by_partition(&batch, &PartitionSpec::for_table(TableName::Plays)).unwrap();
    assert!(parts.is_empty());
}

// ============================================================================
// Batch Conversion Tests
// ============================================================================

#[test]
fn test_play_batch_keeps_utc_timestamps() {
    let rows = vec![PlayRow {
        start_time: instant(1_542_241_826_796),
        user_id: Some("26".to_string()),
        level: Some("free".to_string()),
        track_id: 8_589_934_593,
        artist_id: Some("AR5E44Z1187B9A1D74".to_string()),
        session_id: Some("583".to_string()),
        location: Some("San Jose-Sunnyvale-Santa Clara, CA".to_string()),
        user_agent: None,
        year: None,
        month: None,
    }];

    let batch = PlayRow::to_batch(&rows).unwrap();
    assert_eq!(batch.schema(), PlayRow::schema());
    assert_eq!(PlayRow::from_batch(&batch).unwrap(), rows);
}

#[test]
fn test_from_batch_rejects_wrong_schema() {
    let batch = UserRow::to_batch(&[]).unwrap();
    let err = ArtistRow::from_batch(&batch).unwrap_err();
    assert!(matches!(err, Error::Output { .. }));
}

// ============================================================================
// Parquet Codec Tests
// ============================================================================

#[test]
fn test_writer_config_suffix() {
    assert_eq!(ParquetWriterConfig::default().file_suffix(), ".snappy.parquet");
    let zstd = ParquetWriterConfig::new()
        .with_compression(Compression::ZSTD(ZstdLevel::default()))
        .with_row_group_size(1000);
    assert_eq!(zstd.file_suffix(), ".zstd.parquet");
    assert_eq!(zstd.row_group_size(), 1000);
    let plain = ParquetWriterConfig::new().with_compression(Compression::UNCOMPRESSED);
    assert_eq!(plain.file_suffix(), ".parquet");
}

#[test]
fn test_encode_decode_parquet() {
    let rows = vec![ArtistRow {
        artist_id: Some("ARD7TVE1187B99BFB1".to_string()),
        name: Some("Casual".to_string()),
        location: Some("California - LA".to_string()),
        longitude: None,
        latitude: Some(34.05),
    }];
    let batch = ArtistRow::to_batch(&rows).unwrap();
    let config = ParquetWriterConfig::new()
        .with_dictionary(false)
        .with_statistics(false);

    let data = encode_parquet(batch.schema(), &[batch], &config).unwrap();
    assert_eq!(&data[..4], b"PAR1");

    let (schema, batches) = decode_parquet(data).unwrap();
    assert_eq!(schema.fields(), ArtistRow::schema().fields());
    assert_eq!(ArtistRow::from_batch(&batches[0]).unwrap(), rows);
}

#[test]
fn test_parquet_settings_control_encoding() {
    use crate::config::ParquetSettings;
    use parquet::file::reader::{FileReader, SerializedFileReader};

    let rows = vec![ArtistRow {
        artist_id: Some("AR5KOSW1187FB35FF4".to_string()),
        name: Some("Elena".to_string()),
        location: None,
        longitude: None,
        latitude: None,
    }];
    let batch = ArtistRow::to_batch(&rows).unwrap();

    let chunk_for = |settings: &ParquetSettings| {
        let config = ParquetWriterConfig::from(settings);
        let data = encode_parquet(batch.schema(), &[batch.clone()], &config).unwrap();
        let reader = SerializedFileReader::new(data).unwrap();
        reader.metadata().row_group(0).column(0).clone()
    };

    let enabled = chunk_for(&ParquetSettings::default());
    assert!(enabled.dictionary_page_offset().is_some());
    assert!(enabled.statistics().is_some());

    let disabled = chunk_for(&ParquetSettings {
        dictionary: false,
        statistics: false,
        ..ParquetSettings::default()
    });
    assert!(disabled.dictionary_page_offset().is_none());
    assert!(disabled.statistics().is_none());
}

// ============================================================================
// Table Sink Tests
// ============================================================================

#[tokio::test]
async fn test_write_partitioned_table_layout() {
    let sink = memory_sink();
    let rows = vec![
        track(0, "Der Kleine Dompfaff", Some("ARJIE2Y1187B994AB7"), Some(0)),
        track(1, "I Didn't Mean To", Some("ARD7TVE1187B99BFB1"), Some(2003)),
        track(2, "Setanta matins", Some("ARD7TVE1187B99BFB1"), Some(2003)),
    ];

    let stats = sink.write_table(&rows).await.unwrap();
    assert_eq!(stats.table, TableName::Tracks);
    assert_eq!(stats.rows, 3);
    assert_eq!(stats.partitions, 2);
    assert_eq!(stats.files, 2);

    assert_eq!(
        keys(&sink, "tracks").await,
        vec![
            "tracks/_SUCCESS",
            "tracks/year=0/artist_id=ARJIE2Y1187B994AB7/part-00000.snappy.parquet",
            "tracks/year=2003/artist_id=ARD7TVE1187B99BFB1/part-00000.snappy.parquet",
        ]
    );

    let mut read: Vec<TrackRow> = sink.read_table().await.unwrap();
    read.sort_by_key(|t| t.track_id);
    assert_eq!(read, rows);
}

#[tokio::test]
async fn test_escaped_partition_values_round_trip() {
    let sink = memory_sink();
    let rows = vec![track(5, "Back In Black", Some("AC/DC=1"), Some(1980))];

    sink.write_table(&rows).await.unwrap();
    let read: Vec<TrackRow> = sink.read_table().await.unwrap();
    assert_eq!(read, rows);
}

#[tokio::test]
async fn test_write_table_overwrites() {
    let sink = memory_sink();
    sink.write_table(&[
        track(0, "Old", Some("AR1"), Some(1999)),
        track(1, "Older", Some("AR2"), Some(1998)),
    ])
    .await
    .unwrap();

    let fresh = vec![track(9, "New", Some("AR3"), Some(2020))];
    sink.write_table(&fresh).await.unwrap();

    let read: Vec<TrackRow> = sink.read_table().await.unwrap();
    assert_eq!(read, fresh);
    assert_eq!(keys(&sink, "tracks").await.len(), 2);
}

#[tokio::test]
async fn test_unpartitioned_empty_table_still_readable() {
    let sink = memory_sink();
    let stats = sink.write_table::<UserRow>(&[]).await.unwrap();
    assert_eq!(stats.files, 1);
    assert_eq!(stats.partitions, 0);

    let read: Vec<UserRow> = sink.read_table().await.unwrap();
    assert!(read.is_empty());
}

#[tokio::test]
async fn test_partitioned_empty_table_writes_only_marker() {
    let sink = memory_sink();
    let stats = sink.write_table::<PlayRow>(&[]).await.unwrap();
    assert_eq!(stats.files, 0);
    assert_eq!(keys(&sink, "plays").await, vec!["plays/_SUCCESS"]);

    let read: Vec<PlayRow> = sink.read_table().await.unwrap();
    assert!(read.is_empty());
}

#[tokio::test]
async fn test_read_without_marker_is_incomplete() {
    let sink = memory_sink();
    let err = sink.read_table::<ArtistRow>().await.unwrap_err();
    assert!(matches!(err, Error::IncompleteTable { ref table } if table == "artists"));
    assert!(!sink.is_complete(TableName::Artists).await.unwrap());
}

#[tokio::test]
async fn test_publish_catalog_reads_back() {
    let sink = memory_sink();
    let tables = CatalogTables {
        tracks: vec![track(0, "Intro", Some("AR1"), Some(2001))],
        artists: vec![ArtistRow {
            artist_id: Some("AR1".to_string()),
            name: Some("Band".to_string()),
            location: None,
            longitude: None,
            latitude: None,
        }],
    };

    let (catalog, stats) = sink.publish_catalog(&tables).await.unwrap();
    assert_eq!(stats.len(), 2);
    assert_eq!(catalog.tracks(), tables.tracks.as_slice());
    assert_eq!(catalog.artists(), tables.artists.as_slice());

    let reloaded = sink.read_catalog().await.unwrap();
    assert_eq!(reloaded.tracks(), catalog.tracks());
}
