//! Output module
//!
//! Turns output rows into Parquet files laid out in the output area, and
//! reads complete tables back.
//!
//! # Overview
//!
//! - `TableRow` - row type ↔ Arrow RecordBatch for each table
//! - `PartitionSpec` - Hive-style directory layout per table
//! - `encode_parquet` / `decode_parquet` - Parquet codec
//! - `TableSink` - overwrite-mode table writes, `_SUCCESS` markers, reads

mod batch;
mod layout;
mod sink;
mod writer;

pub use batch::TableRow;
pub use layout::{
    escape_path_value, parse_partition_dirs, restore_partition_columns, split_by_partition,
    unescape_path_value, PartitionSpec, PartitionedBatch, NULL_PARTITION,
};
pub use sink::{TableSink, SUCCESS_MARKER};
pub use writer::{decode_parquet, encode_parquet, ParquetWriterConfig};

#[cfg(test)]
mod tests;
