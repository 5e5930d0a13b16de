//! Storage module
//!
//! Resolves input and output roots to object stores and provides the
//! listing, reading and writing the pipeline needs.
//!
//! # Overview
//!
//! - `StorageLocation` - a root inside S3, R2, GCS, Azure or the local filesystem
//! - `GlobPattern` - selects input objects by relative key

mod glob;
mod location;

pub use glob::GlobPattern;
pub use location::StorageLocation;

pub(crate) use location::percent_decode;
