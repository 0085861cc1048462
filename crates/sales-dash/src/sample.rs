//! Randomized sample dataset generation.
//!
//! Writes a CSV with the full input schema so the dashboard can be demoed
//! and smoke-tested without a real export.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate};
use rand::Rng;

const FAMILIES: &[&str] = &[
    "GROCERY I",
    "BEVERAGES",
    "PRODUCE",
    "CLEANING",
    "DAIRY",
    "BREAD/BAKERY",
    "POULTRY",
    "MEATS",
    "PERSONAL CARE",
    "DELI",
];

const STATES: &[&str] = &["Pichincha", "Guayas", "Azuay", "Manabi", "Tungurahua"];

const STORE_COUNT: u32 = 12;
const SPAN_DAYS: i64 = 730;

/// Write `rows` randomized sales rows to `out`.
pub fn generate(out: &Path, rows: usize) -> Result<()> {
    if let Some(parent) = out.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }

    let start = NaiveDate::from_ymd_opt(2016, 1, 1).unwrap_or_default();
    let mut rng = rand::thread_rng();

    let mut writer = csv::Writer::from_path(out)
        .with_context(|| format!("creating {}", out.display()))?;
    writer.write_record([
        "date",
        "store_nbr",
        "family",
        "sales",
        "onpromotion",
        "transactions",
        "state",
    ])?;

    for _ in 0..rows {
        let store = rng.gen_range(1..=STORE_COUNT);
        let family = FAMILIES[rng.gen_range(0..FAMILIES.len())];
        let date = start + Duration::days(rng.gen_range(0..SPAN_DAYS));
        // Promoted lines sell noticeably more, so the comparison tile has
        // something to show.
        let promoted_items = if rng.gen_bool(0.2) {
            rng.gen_range(1..=20)
        } else {
            0
        };
        let base: f64 = rng.gen_range(5.0..400.0);
        let sales = if promoted_items > 0 { base * 1.5 } else { base };
        let transactions = rng.gen_range(50..2500);
        // Stores map onto states round-robin; one store stays stateless to
        // exercise the absent-state path.
        let state = if store == STORE_COUNT {
            ""
        } else {
            STATES[(store as usize) % STATES.len()]
        };

        writer.write_record([
            date.format("%Y-%m-%d").to_string(),
            store.to_string(),
            family.to_string(),
            format!("{sales:.1}"),
            promoted_items.to_string(),
            transactions.to_string(),
            state.to_string(),
        ])?;
    }

    writer.flush()?;
    tracing::info!(path = %out.display(), rows, "sample dataset written");
    Ok(())
}
