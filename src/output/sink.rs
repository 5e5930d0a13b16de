//! Table sink
//!
//! Writes whole tables into the output area with overwrite semantics and
//! reads them back. A table is complete once its `_SUCCESS` marker exists;
//! readers refuse tables without one.

use crate::error::{Error, Result};
use crate::output::batch::TableRow;
use crate::output::layout::{
    parse_partition_dirs, restore_partition_columns, split_by_partition, PartitionSpec,
};
use crate::output::writer::{decode_parquet, encode_parquet, ParquetWriterConfig};
use crate::schema::{ArtistRow, TrackRow};
use crate::storage::StorageLocation;
use crate::transform::{CatalogTables, DurableCatalog};
use crate::types::{TableName, TableStats};
use bytes::Bytes;
use futures::stream::{self, StreamExt, TryStreamExt};
use tracing::{debug, info};

/// Marker object written after every part of a table
pub const SUCCESS_MARKER: &str = "_SUCCESS";

const DEFAULT_WRITE_CONCURRENCY: usize = 8;

/// Writes and reads the tables of one output area
#[derive(Debug, Clone)]
pub struct TableSink {
    location: StorageLocation,
    writer_config: ParquetWriterConfig,
    concurrency: usize,
}

impl TableSink {
    pub fn new(location: StorageLocation, writer_config: ParquetWriterConfig) -> Self {
        Self {
            location,
            writer_config,
            concurrency: DEFAULT_WRITE_CONCURRENCY,
        }
    }

    /// Set how many part files are uploaded at once
    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// The output area this sink writes into
    pub fn location(&self) -> &StorageLocation {
        &self.location
    }

    /// Replace the whole table with `rows`
    ///
    /// Existing objects under the table's prefix are removed first. Part
    /// files are uploaded concurrently; the `_SUCCESS` marker goes last.
    pub async fn write_table<R: TableRow>(&self, rows: &[R]) -> Result<TableStats> {
        let table = R::TABLE;
        let spec = PartitionSpec::for_table(table);

        let removed = self.location.delete_prefix(table.as_str()).await?;
        if removed > 0 {
            debug!("Removed {} existing objects under {}", removed, table);
        }

        let batch = R::to_batch(rows)?;
        let parts = split_by_partition(&batch, &spec)?;
        let suffix = self.writer_config.file_suffix();

        let mut uploads = Vec::with_capacity(parts.len());
        for part in &parts {
            let data = encode_parquet(
                part.batch.schema(),
                std::slice::from_ref(&part.batch),
                &self.writer_config,
            )?;
            let key = if part.dir.is_empty() {
                format!("{table}/part-00000{suffix}")
            } else {
                format!("{table}/{}/part-00000{suffix}", part.dir)
            };
            uploads.push((key, data));
        }

        let files = uploads.len();
        stream::iter(uploads)
            .map(|(key, data)| async move {
                let path = self.location.put(&self.location.path(&key), data).await?;
                debug!("Wrote {}", path);
                Ok::<_, Error>(())
            })
            .buffer_unordered(self.concurrency)
            .try_collect::<Vec<_>>()
            .await?;

        let marker = self.location.path(&format!("{table}/{SUCCESS_MARKER}"));
        self.location.put(&marker, Bytes::new()).await?;

        let partitions = if spec.is_partitioned() { parts.len() } else { 0 };
        info!(
            "Wrote {} rows to {} ({} files, {} partitions)",
            rows.len(),
            table,
            files,
            partitions
        );

        Ok(TableStats {
            table,
            rows: rows.len(),
            partitions,
            files,
        })
    }

    /// Read a complete table back, restoring partition columns from paths
    pub async fn read_table<R: TableRow>(&self) -> Result<Vec<R>> {
        let table = R::TABLE;
        if !self.is_complete(table).await? {
            return Err(Error::IncompleteTable {
                table: table.to_string(),
            });
        }

        let schema = R::schema();
        let mut rows = Vec::new();

        for path in self.location.list(table.as_str()).await? {
            let Some(segments) = self.location.relative_segments(&path) else {
                continue;
            };
            let Some((file, dirs)) = segments.split_last() else {
                continue;
            };
            if !file.ends_with(".parquet") {
                continue;
            }
            // first segment is the table name itself
            let values = parse_partition_dirs(dirs.get(1..).unwrap_or_default())?;

            let (_, batches) = decode_parquet(self.location.get(&path).await?)?;
            for batch in &batches {
                let full = restore_partition_columns(batch, &values, &schema)?;
                rows.extend(R::from_batch(&full)?);
            }
        }

        debug!("Read {} rows from {}", rows.len(), table);
        Ok(rows)
    }

    /// Write `tracks` and `artists`, then read them back as the durable catalog
    pub async fn publish_catalog(
        &self,
        catalog: &CatalogTables,
    ) -> Result<(DurableCatalog, Vec<TableStats>)> {
        let stats = vec![
            self.write_table(&catalog.tracks).await?,
            self.write_table(&catalog.artists).await?,
        ];
        let durable = self.read_catalog().await?;
        Ok((durable, stats))
    }

    /// Load a previously published catalog
    pub async fn read_catalog(&self) -> Result<DurableCatalog> {
        let tracks = self.read_table::<TrackRow>().await?;
        let artists = self.read_table::<ArtistRow>().await?;
        info!(
            "Catalog available: {} tracks, {} artists",
            tracks.len(),
            artists.len()
        );
        Ok(DurableCatalog::from_storage(tracks, artists))
    }

    /// Whether a table has a `_SUCCESS` marker
    pub async fn is_complete(&self, table: TableName) -> Result<bool> {
        let marker = self.location.path(&format!("{table}/{SUCCESS_MARKER}"));
        self.location.exists(&marker).await
    }
}
