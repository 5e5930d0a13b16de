//! Object reader and record decoder

use crate::error::{Error, Result};
use crate::storage::{GlobPattern, StorageLocation};
use futures::{StreamExt, TryStreamExt};
use serde::de::DeserializeOwned;
use tracing::{debug, info};

/// Records decoded from one input object
#[derive(Debug, Clone, PartialEq)]
pub struct InputPartition<T> {
    /// Position of the object in sorted key order
    pub index: usize,
    /// Relative key of the object, for error messages
    pub source: String,
    /// Records in file order
    pub records: Vec<T>,
}

impl<T> InputPartition<T> {
    /// Number of records in the partition
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the partition holds no records
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Decode every JSON value in `data` as a `T`
///
/// Blank input yields no records. The first value that fails to decode
/// is reported with its source and line.
pub fn decode_records<T: DeserializeOwned>(source: &str, data: &[u8]) -> Result<Vec<T>> {
    serde_json::Deserializer::from_slice(data)
        .into_iter::<T>()
        .map(|item| {
            item.map_err(|e| Error::schema(source, format!("line {}: {e}", e.line())))
        })
        .collect()
}

/// Read and decode every object under `location` matching `pattern`
///
/// Objects are fetched with up to `concurrency` requests in flight but the
/// returned partitions keep sorted key order. No matching object is an error.
pub async fn read_partitions<T>(
    location: &StorageLocation,
    pattern: &GlobPattern,
    concurrency: usize,
) -> Result<Vec<InputPartition<T>>>
where
    T: DeserializeOwned + Send + 'static,
{
    let paths = location.list_matching(pattern).await?;
    if paths.is_empty() {
        return Err(Error::NoInput {
            location: location.url().to_string(),
            pattern: pattern.as_str().to_string(),
        });
    }
    info!(
        "Found {} objects matching '{}' under {}",
        paths.len(),
        pattern.as_str(),
        location.url()
    );

    let partitions: Vec<InputPartition<T>> = futures::stream::iter(paths.into_iter().enumerate())
        .map(|(index, path)| async move {
            let source = location
                .relative_key(&path)
                .unwrap_or_else(|| path.to_string());
            let data = location.get(&path).await?;
            let records = decode_records::<T>(&source, &data)?;
            debug!("Decoded {} records from {}", records.len(), source);
            Ok::<_, Error>(InputPartition {
                index,
                source,
                records,
            })
        })
        .buffered(concurrency.max(1))
        .try_collect()
        .await?;

    let total: usize = partitions.iter().map(InputPartition::len).sum();
    info!(
        "Ingested {} records from {} objects matching '{}'",
        total,
        partitions.len(),
        pattern.as_str()
    );
    Ok(partitions)
}
