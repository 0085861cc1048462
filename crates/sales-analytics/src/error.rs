//! Analytics error types.

use thiserror::Error;

/// Analytics errors.
///
/// `EmptyScope` and `NoData` are recoverable query-time conditions: callers
/// surface them as "no data for this selection" rather than rendering a
/// zero that looks like real sales.
#[derive(Error, Debug)]
pub enum AnalyticsError {
    /// A scope filter matched zero rows
    #[error("no rows match {0}")]
    EmptyScope(String),

    /// A requested aggregation partition has no members
    #[error("no data for {0}")]
    NoData(String),

    /// Invalid parameter
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Data conversion error
    #[error("data conversion error: {0}")]
    Conversion(String),
}

/// Result type for analytics operations.
pub type Result<T> = std::result::Result<T, AnalyticsError>;
