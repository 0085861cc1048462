//! Ingestion error types.

use thiserror::Error;

/// Ingestion errors.
///
/// `MalformedRecord` and `EmptySource` are scoped to a single source: the
/// loader reports them and carries on with the remaining sources.
#[derive(Error, Debug)]
pub enum IngestError {
    /// Unparseable field or missing required column; aborts that source
    #[error("{source_name}: {detail}")]
    MalformedRecord { source_name: String, detail: String },

    /// A source yielded zero usable rows
    #[error("{0}: no usable rows")]
    EmptySource(String),

    /// Every source failed or the directory held no recognizable files
    #[error("no usable data in any source")]
    NoUsableData,

    /// CSV reader error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Archive error
    #[error("archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl IngestError {
    pub(crate) fn malformed(source: &str, detail: impl Into<String>) -> Self {
        Self::MalformedRecord {
            source_name: source.to_string(),
            detail: detail.into(),
        }
    }
}

/// Result type for ingestion operations.
pub type Result<T> = std::result::Result<T, IngestError>;
