// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::unused_self)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::needless_pass_by_value)]

//! # Sparkify Lake
//!
//! Batch ETL from song metadata and user activity logs, stored as JSON
//! objects, into a five-table star schema of partitioned Parquet files.
//!
//! ## Features
//!
//! - **Any object store**: S3, R2, GCS, Azure or the local filesystem for input and output
//! - **Typed ingestion**: JSON and JSON-lines objects decoded into checked records
//! - **Star schema**: `tracks`, `artists`, `users`, `time` dimensions and a `plays` fact table
//! - **Hive layout**: partitioned Parquet with `_SUCCESS` markers and overwrite writes
//! - **Pluggable matching**: free-text matching of plays to the catalog behind a trait
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use sparkify_lake::{Pipeline, PipelineConfig, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = PipelineConfig::default()
//!         .with_input("s3://udacity-dend")
//!         .with_output("s3://my-lake/sparkify");
//!
//!     let stats = Pipeline::new(config)?.run().await?;
//!     println!("{} plays", stats.play_events);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//!  song_data/*/*/*/*.json                 log_data/*/*/*.json
//!           │                                     │
//!      ┌────┴─────┐                          ┌────┴─────┐
//!      │  Ingest  │                          │  Ingest  │
//!      └────┬─────┘                          └────┬─────┘
//!  ┌────────┴─────────┐                 ┌─────────┴────────┐
//!  │ Catalog transform│                 │Activity transform│
//!  └────────┬─────────┘                 └──┬──────────┬────┘
//!     tracks, artists                    users       time
//!           │                               │          │
//!  ┌────────┴─────────┐   DurableCatalog  ┌─┴──────────┴─┐
//!  │    Table sink    │──────────────────▶│ Fact resolve │──▶ plays
//!  └──────────────────┘                   └──────────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Table names and run statistics
pub mod types;

/// Pipeline configuration
pub mod config;

/// Object store locations and glob listing
pub mod storage;

/// Typed input records and output rows
pub mod schema;

/// Reading input objects into partitions
pub mod ingest;

/// Catalog, activity and fact transforms
pub mod transform;

/// Parquet output and table sink
pub mod output;

/// Orchestration of the two flows
pub mod pipeline;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

// Re-export commonly used types
pub use config::{load_config, load_config_from_str, PipelineConfig};
pub use pipeline::Pipeline;
pub use transform::DurableCatalog;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
