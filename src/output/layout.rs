//! Physical layout of output tables
//!
//! Partitioning is declared per table and applied only at write/read time;
//! transforms never see it. Partitioned tables use Hive-style directories
//! (`col=value/...`), with partition columns removed from the files and
//! restored from the path when reading.

use crate::error::{Error, Result};
use crate::types::TableName;
use arrow::array::{new_null_array, Array, ArrayRef, StringArray, UInt32Array};
use arrow::compute::{cast, take_record_batch};
use arrow::datatypes::{Schema, SchemaRef};
use arrow::record_batch::RecordBatch;
use arrow::util::display::array_value_to_string;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Directory value used for a null partition value
pub const NULL_PARTITION: &str = "__HIVE_DEFAULT_PARTITION__";

/// Declared partition columns of a table
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PartitionSpec {
    columns: Vec<String>,
}

impl PartitionSpec {
    /// An unpartitioned table
    pub fn none() -> Self {
        Self::default()
    }

    /// Partition by the given columns, outermost first
    pub fn by(columns: &[&str]) -> Self {
        Self {
            columns: columns.iter().map(|c| (*c).to_string()).collect(),
        }
    }

    /// Layout of each output table
    pub fn for_table(table: TableName) -> Self {
        match table {
            TableName::Tracks => Self::by(&["year", "artist_id"]),
            TableName::Time | TableName::Plays => Self::by(&["year", "month"]),
            TableName::Artists | TableName::Users => Self::none(),
        }
    }

    /// Partition column names
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Whether the table is split into directories
    pub fn is_partitioned(&self) -> bool {
        !self.columns.is_empty()
    }

    /// Schema of the data files: the table schema minus partition columns
    pub fn file_schema(&self, schema: &Schema) -> SchemaRef {
        let fields: Vec<_> = schema
            .fields()
            .iter()
            .filter(|f| !self.columns.contains(f.name()))
            .cloned()
            .collect();
        Arc::new(Schema::new_with_metadata(fields, schema.metadata().clone()))
    }
}

/// Rows of one partition directory
#[derive(Debug, Clone)]
pub struct PartitionedBatch {
    /// Relative directory, empty for unpartitioned tables
    pub dir: String,
    /// Rows with partition columns removed
    pub batch: RecordBatch,
}

/// Split a table batch into one batch per partition directory
///
/// Directories come out in sorted order and rows keep their relative
/// order within a directory. An empty batch yields no partitions for a
/// partitioned table and one empty partition for an unpartitioned one.
pub fn split_by_partition(batch: &RecordBatch, spec: &PartitionSpec) -> Result<Vec<PartitionedBatch>> {
    let file_schema = spec.file_schema(batch.schema().as_ref());

    if !spec.is_partitioned() {
        return Ok(vec![PartitionedBatch {
            dir: String::new(),
            batch: project(batch, &file_schema)?,
        }]);
    }

    let key_columns: Vec<&ArrayRef> = spec
        .columns()
        .iter()
        .map(|name| {
            batch.column_by_name(name).ok_or_else(|| {
                Error::output(format!("Partition column '{name}' not in table schema"))
            })
        })
        .collect::<Result<_>>()?;

    let mut groups: BTreeMap<String, Vec<u32>> = BTreeMap::new();
    for row in 0..batch.num_rows() {
        let mut segments = Vec::with_capacity(key_columns.len());
        for (name, column) in spec.columns().iter().zip(key_columns.iter().copied()) {
            let value = if column.is_null(row) {
                NULL_PARTITION.to_string()
            } else {
                escape_path_value(&array_value_to_string(column, row)?)
            };
            segments.push(format!("{name}={value}"));
        }
        let index = u32::try_from(row)
            .map_err(|_| Error::output("Table too large to partition in one batch"))?;
        groups.entry(segments.join("/")).or_default().push(index);
    }

    groups
        .into_iter()
        .map(|(dir, rows)| {
            let taken = take_record_batch(batch, &UInt32Array::from(rows))?;
            Ok(PartitionedBatch {
                dir,
                batch: project(&taken, &file_schema)?,
            })
        })
        .collect()
}

/// Keep only the columns of `schema`, in its order
fn project(batch: &RecordBatch, schema: &SchemaRef) -> Result<RecordBatch> {
    let columns = schema
        .fields()
        .iter()
        .map(|f| {
            batch
                .column_by_name(f.name())
                .cloned()
                .ok_or_else(|| Error::output(format!("Column '{}' missing from batch", f.name())))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(RecordBatch::try_new(schema.clone(), columns)?)
}

/// Parse `col=value` directory segments into (column, value) pairs
///
/// Values are unescaped; the null marker becomes `None`.
pub fn parse_partition_dirs(segments: &[String]) -> Result<Vec<(String, Option<String>)>> {
    segments
        .iter()
        .map(|segment| {
            let (column, raw) = segment.split_once('=').ok_or_else(|| {
                Error::output(format!("Not a partition directory: '{segment}'"))
            })?;
            let value = if raw == NULL_PARTITION {
                None
            } else {
                Some(unescape_path_value(raw))
            };
            Ok((column.to_string(), value))
        })
        .collect()
}

/// Rebuild a full table batch from a file batch and its directory values
pub fn restore_partition_columns(
    file_batch: &RecordBatch,
    values: &[(String, Option<String>)],
    schema: &SchemaRef,
) -> Result<RecordBatch> {
    let rows = file_batch.num_rows();
    let columns = schema
        .fields()
        .iter()
        .map(|field| {
            if let Some(column) = file_batch.column_by_name(field.name()) {
                return Ok(column.clone());
            }
            let (_, value) = values
                .iter()
                .find(|(name, _)| name == field.name())
                .ok_or_else(|| {
                    Error::output(format!(
                        "Column '{}' neither in file nor in partition path",
                        field.name()
                    ))
                })?;
            match value {
                None => Ok(new_null_array(field.data_type(), rows)),
                Some(text) => {
                    let repeated = StringArray::from(vec![text.as_str(); rows]);
                    Ok(cast(&repeated, field.data_type())?)
                }
            }
        })
        .collect::<Result<Vec<ArrayRef>>>()?;

    Ok(RecordBatch::try_new(schema.clone(), columns)?)
}

/// Characters escaped in partition directory values
fn needs_escape(c: char) -> bool {
    matches!(
        c,
        '\u{01}'..='\u{1F}'
            | '"'
            | '#'
            | '%'
            | '\''
            | '*'
            | '/'
            | ':'
            | '='
            | '?'
            | '\\'
            | '\u{7F}'
            | '{'
            | '['
            | ']'
            | '^'
    )
}

/// `%XX`-escape a partition value for use in a directory name
pub fn escape_path_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if needs_escape(c) {
            out.push_str(&format!("%{:02X}", c as u32));
        } else {
            out.push(c);
        }
    }
    out
}

/// Reverse of `escape_path_value`
pub fn unescape_path_value(value: &str) -> String {
    crate::storage::percent_decode(value)
}
