//! # Sales Ingest
//!
//! Source loading for the retail sales dashboard: flat CSV files and
//! zip-archived CSVs, merged into one immutable record set.
//!
//! ## Behavior
//!
//! - Columns resolved by header name, case-insensitively
//! - Calendar fields derived once per row at load time
//! - Per-source error isolation: a bad file never fails the session
//! - Concatenation is pure append; duplicates are preserved

#![forbid(unsafe_code)]
#![warn(clippy::all, missing_docs)]

pub mod csv_source;
pub mod error;
pub mod loader;

pub use csv_source::{SourceBatch, read_csv_source};
pub use error::IngestError;
pub use loader::{LoadOutcome, SourceReport, load_csv_file, load_dir};
