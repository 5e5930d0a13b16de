//! Ingest module
//!
//! Reads JSON objects from a storage location into typed records.
//!
//! # Overview
//!
//! Every object matching the layout pattern becomes one `InputPartition`,
//! in sorted key order. An object may hold a single JSON value or many
//! values back to back (JSON lines); both decode the same way. Any record
//! that does not fit the declared type aborts ingestion.

mod reader;

pub use reader::{decode_records, read_partitions, InputPartition};

#[cfg(test)]
mod tests;
