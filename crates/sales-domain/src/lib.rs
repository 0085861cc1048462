//! # Retail Sales Dashboard - Domain Model
//!
//! Core domain entities, calendar derivations, and the query vocabulary
//! shared across all layers: ingestion, analytics, and the CLI front door.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

// =============================================================================
// CALENDAR TYPES
// =============================================================================

/// Day of week, ISO numbering (1 = Monday ... 7 = Sunday).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    /// All weekdays in Monday-to-Sunday order.
    pub const ALL: [Weekday; 7] = [
        Self::Monday,
        Self::Tuesday,
        Self::Wednesday,
        Self::Thursday,
        Self::Friday,
        Self::Saturday,
        Self::Sunday,
    ];

    /// Derive the weekday from a calendar date.
    #[must_use]
    pub fn from_date(date: NaiveDate) -> Self {
        match date.weekday().number_from_monday() {
            1 => Self::Monday,
            2 => Self::Tuesday,
            3 => Self::Wednesday,
            4 => Self::Thursday,
            5 => Self::Friday,
            6 => Self::Saturday,
            _ => Self::Sunday,
        }
    }

    /// ISO weekday number (1 = Monday ... 7 = Sunday).
    #[must_use]
    pub fn number_from_monday(self) -> u8 {
        match self {
            Self::Monday => 1,
            Self::Tuesday => 2,
            Self::Wednesday => 3,
            Self::Thursday => 4,
            Self::Friday => 5,
            Self::Saturday => 6,
            Self::Sunday => 7,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Monday => "Monday",
            Self::Tuesday => "Tuesday",
            Self::Wednesday => "Wednesday",
            Self::Thursday => "Thursday",
            Self::Friday => "Friday",
            Self::Saturday => "Saturday",
            Self::Sunday => "Sunday",
        }
    }
}

/// Recurring calendar period used for seasonality profiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Period {
    DayOfWeek,
    IsoWeek,
    Month,
}

// =============================================================================
// ENTITY TYPES
// =============================================================================

/// One retail transaction row, enriched with calendar fields at load time.
///
/// The derived fields (`year`, `month`, `iso_week`, `day_of_week`) are pure
/// functions of `date`, computed once in the constructor and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesRecord {
    pub store_id: u32,
    pub family: String,
    pub date: NaiveDate,
    pub sales: f64,
    pub on_promotion: bool,
    pub transactions: u32,
    pub state: Option<String>,

    // Derived calendar fields
    pub year: i32,
    pub month: u32,
    pub iso_week: u32,
    pub day_of_week: Weekday,
}

impl SalesRecord {
    /// Build a record, deriving the calendar fields from `date`.
    ///
    /// `sales` must be a non-negative finite quantity.
    pub fn new(
        store_id: u32,
        family: impl Into<String>,
        date: NaiveDate,
        sales: f64,
        on_promotion: bool,
        transactions: u32,
        state: Option<String>,
    ) -> Result<Self, DomainError> {
        if !sales.is_finite() || sales < 0.0 {
            return Err(DomainError::InvalidQuantity {
                field: "sales",
                value: sales,
            });
        }

        Ok(Self {
            store_id,
            family: family.into(),
            date,
            sales,
            on_promotion,
            transactions,
            state,
            year: date.year(),
            month: date.month(),
            iso_week: date.iso_week().week(),
            day_of_week: Weekday::from_date(date),
        })
    }
}

/// Immutable in-memory collection of sales records for one session.
///
/// Built once at load time and replaced wholesale on reload; no mutation
/// path exists. Concatenation is a pure append: duplicate rows across
/// overlapping sources are preserved as-is, never deduplicated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordSet {
    records: Vec<SalesRecord>,
    has_transactions: bool,
}

impl RecordSet {
    #[must_use]
    pub fn new(records: Vec<SalesRecord>, has_transactions: bool) -> Self {
        Self {
            records,
            has_transactions,
        }
    }

    /// Concatenate several record sets in order.
    ///
    /// The transactions capability holds if any input carried the column;
    /// rows from sources without it contribute 0 to transaction sums.
    #[must_use]
    pub fn concat(sets: Vec<RecordSet>) -> Self {
        let has_transactions = sets.iter().any(|s| s.has_transactions);
        let mut records = Vec::with_capacity(sets.iter().map(RecordSet::len).sum());
        for set in sets {
            records.extend(set.records);
        }
        Self {
            records,
            has_transactions,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[must_use]
    pub fn records(&self) -> &[SalesRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SalesRecord> {
        self.records.iter()
    }

    /// Whether any loaded source carried a `transactions` column.
    #[must_use]
    pub fn has_transactions(&self) -> bool {
        self.has_transactions
    }
}

impl<'a> IntoIterator for &'a RecordSet {
    type Item = &'a SalesRecord;
    type IntoIter = std::slice::Iter<'a, SalesRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

// =============================================================================
// QUERY VOCABULARY
// =============================================================================

/// Numeric column an aggregation reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Metric {
    Sales,
    Transactions,
}

impl Metric {
    /// Extract the metric value from a record.
    #[must_use]
    pub fn of(self, record: &SalesRecord) -> f64 {
        match self {
            Self::Sales => record.sales,
            Self::Transactions => f64::from(record.transactions),
        }
    }
}

/// Reduction applied to a grouped metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Reducer {
    Sum,
    Mean,
}

/// Dimension a ranking groups by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GroupBy {
    Family,
    Store,
    State,
}

/// A concrete value of a grouping dimension.
///
/// Rows with an absent `state` never produce a `State` value; state-scoped
/// queries exclude them rather than coercing a default.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GroupValue {
    Family(String),
    Store(u32),
    State(String),
}

impl GroupValue {
    /// Render-ready label for charts and report tables.
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Self::Family(name) | Self::State(name) => name.clone(),
            Self::Store(id) => id.to_string(),
        }
    }
}

impl std::fmt::Display for GroupValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.label())
    }
}

/// Sort direction for rankings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SortOrder {
    Ascending,
    Descending,
}

/// Exact-equality filter restricting records to one dimension value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScopeFilter {
    Store(u32),
    State(String),
}

impl ScopeFilter {
    /// Whether a record falls inside this scope.
    #[must_use]
    pub fn matches(&self, record: &SalesRecord) -> bool {
        match self {
            Self::Store(id) => record.store_id == *id,
            Self::State(name) => record.state.as_deref() == Some(name.as_str()),
        }
    }
}

impl std::fmt::Display for ScopeFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Store(id) => write!(f, "store {id}"),
            Self::State(name) => write!(f, "state {name}"),
        }
    }
}

// =============================================================================
// ERRORS
// =============================================================================

/// Domain-level errors
#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    #[error("invalid quantity for {field}: {value}")]
    InvalidQuantity { field: &'static str, value: f64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(date: &str) -> SalesRecord {
        SalesRecord::new(
            1,
            "GROCERY I",
            date.parse().unwrap(),
            10.0,
            false,
            0,
            None,
        )
        .unwrap()
    }

    #[test]
    fn derived_fields_are_functions_of_date() {
        // 2017-08-15 was a Tuesday in ISO week 33.
        let rec = record("2017-08-15");
        assert_eq!(rec.year, 2017);
        assert_eq!(rec.month, 8);
        assert_eq!(rec.iso_week, 33);
        assert_eq!(rec.day_of_week, Weekday::Tuesday);

        // Deterministic: rebuilding from the same date yields the same fields.
        assert_eq!(record("2017-08-15"), rec);
    }

    #[test]
    fn derived_fields_stay_in_range() {
        let mut date = NaiveDate::from_ymd_opt(2016, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2017, 12, 31).unwrap();
        while date <= end {
            let rec = SalesRecord::new(1, "DAIRY", date, 0.0, false, 0, None).unwrap();
            assert!((1..=12).contains(&rec.month));
            assert!((1..=53).contains(&rec.iso_week));
            assert!((1..=7).contains(&rec.day_of_week.number_from_monday()));
            date = date.succ_opt().unwrap();
        }
    }

    #[test]
    fn weekday_order_is_monday_first() {
        let numbers: Vec<u8> = Weekday::ALL
            .iter()
            .map(|d| d.number_from_monday())
            .collect();
        assert_eq!(numbers, vec![1, 2, 3, 4, 5, 6, 7]);
        assert_eq!(Weekday::ALL[0].as_str(), "Monday");
        assert_eq!(Weekday::ALL[6].as_str(), "Sunday");
    }

    #[test]
    fn negative_sales_are_rejected() {
        let date = NaiveDate::from_ymd_opt(2017, 1, 1).unwrap();
        assert!(SalesRecord::new(1, "DELI", date, -1.0, false, 0, None).is_err());
        assert!(SalesRecord::new(1, "DELI", date, f64::NAN, false, 0, None).is_err());
    }

    #[test]
    fn concat_is_pure_append() {
        let date = NaiveDate::from_ymd_opt(2017, 1, 1).unwrap();
        let rec = SalesRecord::new(1, "DELI", date, 5.0, false, 3, None).unwrap();
        let a = RecordSet::new(vec![rec.clone(), rec.clone()], true);
        let b = RecordSet::new(vec![rec.clone()], false);

        let merged = RecordSet::concat(vec![a, b]);
        // Duplicates preserved, counts summed, capability sticky.
        assert_eq!(merged.len(), 3);
        assert!(merged.has_transactions());
        assert!(merged.iter().all(|r| r == &rec));
    }

    #[test]
    fn scope_filter_never_matches_absent_state() {
        let date = NaiveDate::from_ymd_opt(2017, 1, 1).unwrap();
        let stateless = SalesRecord::new(1, "DELI", date, 5.0, false, 0, None).unwrap();
        let filter = ScopeFilter::State("Pichincha".to_string());
        assert!(!filter.matches(&stateless));
    }
}
