//! CSV source parsing.
//!
//! One CSV text is one source. Columns are resolved by header name,
//! case-insensitively, so files exported with differing header casing all
//! load. A row that cannot be parsed aborts the whole source; sibling
//! sources are unaffected.

use chrono::NaiveDate;
use sales_domain::SalesRecord;

use crate::error::{IngestError, Result};

/// Parsed rows of a single source plus its column capabilities.
#[derive(Debug, Clone)]
pub struct SourceBatch {
    /// Display name of the source (file name, or `archive.zip/entry.csv`)
    pub source: String,
    pub records: Vec<SalesRecord>,
    /// Whether this source carried a `transactions` column
    pub has_transactions: bool,
}

/// Required input columns.
const REQUIRED_COLUMNS: [&str; 4] = ["date", "store_nbr", "family", "sales"];

/// Parse one CSV source into sales records.
///
/// Required columns: `date`, `store_nbr`, `family`, `sales`. Optional:
/// `onpromotion` (missing rows default to not-promoted), `transactions`
/// (missing rows default to 0), `state` (empty cells stay absent; they are
/// never coerced to a default).
pub fn read_csv_source(csv_text: &str, source: &str) -> Result<SourceBatch> {
    // Strip UTF-8 BOM if present
    let text = csv_text.trim_start_matches('\u{FEFF}');

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers = reader.headers()?.clone();
    let position = |name: &str| {
        headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(name))
    };

    for column in REQUIRED_COLUMNS {
        if position(column).is_none() {
            return Err(IngestError::malformed(
                source,
                format!("missing required column '{column}'"),
            ));
        }
    }

    let date_idx = position("date").unwrap_or_default();
    let store_idx = position("store_nbr").unwrap_or_default();
    let family_idx = position("family").unwrap_or_default();
    let sales_idx = position("sales").unwrap_or_default();
    let promo_idx = position("onpromotion");
    let transactions_idx = position("transactions");
    let state_idx = position("state");

    let mut records = Vec::new();

    for (row_nr, row) in reader.records().enumerate() {
        let row = row?;
        let line = row_nr + 2; // 1-based, after the header line

        // Field by position, trimmed; empty cells count as missing
        let get = |idx: usize| {
            row.get(idx)
                .map(str::trim)
                .filter(|value| !value.is_empty())
        };

        let date_raw = get(date_idx)
            .ok_or_else(|| IngestError::malformed(source, format!("row {line}: empty date")))?;
        let date = parse_date(date_raw).ok_or_else(|| {
            IngestError::malformed(source, format!("row {line}: unparseable date '{date_raw}'"))
        })?;

        let store_id = parse_field::<u32>(get(store_idx), source, line, "store_nbr")?;
        let family = get(family_idx)
            .ok_or_else(|| IngestError::malformed(source, format!("row {line}: empty family")))?;
        let sales = parse_field::<f64>(get(sales_idx), source, line, "sales")?;

        let on_promotion = match promo_idx.and_then(get) {
            Some(raw) => parse_promotion(raw).ok_or_else(|| {
                IngestError::malformed(
                    source,
                    format!("row {line}: unparseable onpromotion '{raw}'"),
                )
            })?,
            None => false,
        };

        let transactions = match transactions_idx.and_then(get) {
            Some(raw) => raw.parse::<u32>().map_err(|_| {
                IngestError::malformed(
                    source,
                    format!("row {line}: unparseable transactions '{raw}'"),
                )
            })?,
            None => 0,
        };

        let state = state_idx.and_then(get).map(str::to_string);

        let record =
            SalesRecord::new(store_id, family, date, sales, on_promotion, transactions, state)
                .map_err(|e| IngestError::malformed(source, format!("row {line}: {e}")))?;
        records.push(record);
    }

    if records.is_empty() {
        return Err(IngestError::EmptySource(source.to_string()));
    }

    tracing::debug!(source, rows = records.len(), "parsed CSV source");

    Ok(SourceBatch {
        source: source.to_string(),
        records,
        has_transactions: transactions_idx.is_some(),
    })
}

/// Accepted date formats, tried in order.
fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%d/%m/%Y"))
        .ok()
}

/// A promotion cell is either a boolean literal or a promoted-item count.
fn parse_promotion(raw: &str) -> Option<bool> {
    if raw.eq_ignore_ascii_case("true") {
        return Some(true);
    }
    if raw.eq_ignore_ascii_case("false") {
        return Some(false);
    }
    raw.parse::<f64>().ok().map(|count| count > 0.0)
}

fn parse_field<T: std::str::FromStr>(
    raw: Option<&str>,
    source: &str,
    line: usize,
    field: &str,
) -> Result<T> {
    let raw =
        raw.ok_or_else(|| IngestError::malformed(source, format!("row {line}: empty {field}")))?;
    raw.parse::<T>()
        .map_err(|_| IngestError::malformed(source, format!("row {line}: unparseable {field} '{raw}'")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sales_domain::Weekday;

    const FULL: &str = "\
date,store_nbr,family,sales,onpromotion,transactions,state
2017-08-15,1,GROCERY I,120.5,0,770,Pichincha
2017-08-16,2,DAIRY,33.0,5,120,
2017-08-17,1,GROCERY I,0.0,false,0,Guayas
";

    #[test]
    fn parses_full_schema() {
        let batch = read_csv_source(FULL, "train.csv").unwrap();
        assert_eq!(batch.records.len(), 3);
        assert!(batch.has_transactions);

        let first = &batch.records[0];
        assert_eq!(first.store_id, 1);
        assert_eq!(first.family, "GROCERY I");
        assert_eq!(first.state.as_deref(), Some("Pichincha"));
        assert!(!first.on_promotion);
        assert_eq!(first.transactions, 770);
        assert_eq!(first.day_of_week, Weekday::Tuesday);
        assert_eq!(first.iso_week, 33);

        // Promoted-item counts > 0 read as promoted; empty state stays absent.
        let second = &batch.records[1];
        assert!(second.on_promotion);
        assert_eq!(second.state, None);
    }

    #[test]
    fn optional_columns_default() {
        let text = "date,store_nbr,family,sales\n2017-08-15,1,DELI,10\n";
        let batch = read_csv_source(text, "mini.csv").unwrap();
        assert!(!batch.has_transactions);

        let rec = &batch.records[0];
        assert!(!rec.on_promotion);
        assert_eq!(rec.transactions, 0);
        assert_eq!(rec.state, None);
    }

    #[test]
    fn header_lookup_is_case_insensitive() {
        let text = "Date,Store_Nbr,FAMILY,Sales\n2017-08-15,1,DELI,10\n";
        let batch = read_csv_source(text, "mixed.csv").unwrap();
        assert_eq!(batch.records[0].family, "DELI");
    }

    #[test]
    fn alternate_date_format_is_accepted() {
        let text = "date,store_nbr,family,sales\n15/08/2017,1,DELI,10\n";
        let batch = read_csv_source(text, "eu.csv").unwrap();
        assert_eq!(batch.records[0].month, 8);
        assert_eq!(batch.records[0].day_of_week, Weekday::Tuesday);
    }

    #[test]
    fn missing_required_column_is_malformed() {
        let text = "date,store_nbr,sales\n2017-08-15,1,10\n";
        let err = read_csv_source(text, "broken.csv").unwrap_err();
        assert!(matches!(err, IngestError::MalformedRecord { .. }));
        assert!(err.to_string().contains("family"));
    }

    #[test]
    fn unparseable_date_aborts_the_source() {
        let text = "date,store_nbr,family,sales\nnot-a-date,1,DELI,10\n";
        let err = read_csv_source(text, "bad.csv").unwrap_err();
        assert!(matches!(err, IngestError::MalformedRecord { .. }));
    }

    #[test]
    fn header_only_source_is_empty() {
        let text = "date,store_nbr,family,sales\n";
        let err = read_csv_source(text, "empty.csv").unwrap_err();
        assert!(matches!(err, IngestError::EmptySource(_)));
    }

    #[test]
    fn bom_is_stripped() {
        let text = "\u{FEFF}date,store_nbr,family,sales\n2017-08-15,1,DELI,10\n";
        assert!(read_csv_source(text, "bom.csv").is_ok());
    }
}
