//! # Sales Analytics
//!
//! In-memory aggregation engine for the retail sales dashboard. Owns one
//! immutable record-set snapshot and answers a fixed menu of queries.
//!
//! ## Features
//!
//! - Top-N rankings by family, store, or state
//! - Seasonality profiles (weekday, ISO week, month)
//! - Scoped rollups with explicit empty-scope reporting
//! - Promotion comparison with explicit no-data markers
//! - Weekday x month heatmap matrix
//! - Dashboard report rendering (Markdown, JSON)

#![forbid(unsafe_code)]
#![warn(clippy::all, missing_docs)]

pub mod engine;
pub mod error;
pub mod queries;
pub mod reports;

pub use engine::{
    AnalyticsEngine, HeatmapCell, PeriodMean, PeriodValue, PromotionComparison, RankedValue,
    SeasonalityMatrix, top_entity_in_scope,
};
pub use error::AnalyticsError;
pub use queries::{GlobalOverview, Insights, MonthSpan, StateSummary, StoreSummary};
pub use reports::DashboardReport;
