//! Predefined dashboard queries.
//!
//! One query per dashboard tile: the global overview, the per-store and
//! per-state drill-downs, and the insights panel. Each returns a fully
//! materialized, render-ready value.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use sales_domain::{GroupBy, GroupValue, Metric, Reducer, ScopeFilter, SortOrder};

use crate::engine::{
    AnalyticsEngine, PromotionComparison, RankedValue, SeasonalityMatrix, group_samples,
    reduce_groups, samples_by_key, sort_ranked, top_entity_in_scope,
};
use crate::error::{AnalyticsError, Result};

/// First and last month covered by the record set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthSpan {
    pub first: (i32, u32),
    pub last: (i32, u32),
    pub distinct_months: usize,
}

impl MonthSpan {
    /// Render-ready `YYYY-MM -> YYYY-MM` label.
    #[must_use]
    pub fn label(&self) -> String {
        format!(
            "{:04}-{:02} -> {:04}-{:02}",
            self.first.0, self.first.1, self.last.0, self.last.1
        )
    }
}

/// Headline figures for the global overview tab.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalOverview {
    pub total_rows: usize,
    pub store_count: usize,
    pub family_count: usize,
    pub state_count: usize,
    /// Absent when the record set is empty
    pub month_span: Option<MonthSpan>,
}

/// Per-store drill-down figures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreSummary {
    pub store_id: u32,
    pub total_sales: f64,
    pub row_count: usize,
    pub promoted_row_count: usize,
    /// `None` when no source carried a transactions column
    pub total_transactions: Option<u64>,
    /// `None` when no source carried a transactions column
    pub promoted_transactions: Option<u64>,
    pub sales_by_year: Vec<(i32, f64)>,
}

/// Per-state drill-down figures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateSummary {
    pub state: String,
    /// `None` when no source carried a transactions column
    pub transactions_by_year: Option<Vec<(i32, u64)>>,
    pub top_stores: Vec<RankedValue>,
    /// Store with the highest summed sales in the state
    pub leading_store: u32,
    /// Best-selling family within that leading store
    pub leading_store_top_family: String,
}

/// The insights panel: heatmap plus promotion comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insights {
    pub seasonality: SeasonalityMatrix,
    pub promotion: PromotionComparison,
}

impl AnalyticsEngine {
    /// Headline figures: distinct stores, families, states, month span.
    #[must_use]
    pub fn global_overview(&self) -> GlobalOverview {
        let records = self.record_set();

        let mut stores = HashSet::new();
        let mut families = HashSet::new();
        let mut states = HashSet::new();
        let mut months = HashSet::new();

        for rec in records {
            stores.insert(rec.store_id);
            families.insert(rec.family.as_str());
            if let Some(state) = rec.state.as_deref() {
                states.insert(state);
            }
            months.insert((rec.year, rec.month));
        }

        let month_span = if months.is_empty() {
            None
        } else {
            let first = months.iter().min().copied().unwrap_or_default();
            let last = months.iter().max().copied().unwrap_or_default();
            Some(MonthSpan {
                first,
                last,
                distinct_months: months.len(),
            })
        };

        GlobalOverview {
            total_rows: records.len(),
            store_count: stores.len(),
            family_count: families.len(),
            state_count: states.len(),
            month_span,
        }
    }

    /// Top `n` product families by summed sales.
    pub fn top_products(&self, n: usize) -> Result<Vec<RankedValue>> {
        self.top_n(GroupBy::Family, Metric::Sales, Reducer::Sum, n, SortOrder::Descending)
    }

    /// Summed sales for every store, ordered by store number.
    #[must_use]
    pub fn sales_by_store(&self) -> Vec<RankedValue> {
        let mut ranked = reduce_groups(
            group_samples(self.record_set().iter(), GroupBy::Store, Metric::Sales),
            Reducer::Sum,
        );
        ranked.sort_by_key(|entry| match entry.key {
            GroupValue::Store(id) => id,
            _ => u32::MAX,
        });
        ranked
    }

    /// Top `n` stores by sales made on promotion.
    ///
    /// Fails with `NoData` when no row in the set is promoted, so callers
    /// can say "no promoted sales" instead of drawing an empty chart.
    pub fn top_promo_stores(&self, n: usize) -> Result<Vec<RankedValue>> {
        let promoted = self.record_set().iter().filter(|rec| rec.on_promotion);
        let groups = samples_by_key(promoted, |rec| Some(rec.store_id), Metric::Sales);
        if groups.is_empty() {
            return Err(AnalyticsError::NoData("promoted sales".to_string()));
        }

        let mut ranked: Vec<RankedValue> = reduce_groups(
            groups
                .into_iter()
                .map(|(store, values)| (GroupValue::Store(store), values))
                .collect(),
            Reducer::Sum,
        );
        sort_ranked(&mut ranked, SortOrder::Descending);
        ranked.truncate(n);
        Ok(ranked)
    }

    /// Per-store drill-down: totals, promotion counts, sales per year.
    pub fn store_summary(&self, store_id: u32) -> Result<StoreSummary> {
        let scope = self.scoped_rollup(&ScopeFilter::Store(store_id))?;
        let has_transactions = scope.has_transactions();

        let mut total_sales = 0.0;
        let mut promoted_rows = 0usize;
        let mut transactions = 0u64;
        let mut promoted_transactions = 0u64;
        for rec in &scope {
            total_sales += rec.sales;
            transactions += u64::from(rec.transactions);
            if rec.on_promotion {
                promoted_rows += 1;
                promoted_transactions += u64::from(rec.transactions);
            }
        }

        Ok(StoreSummary {
            store_id,
            total_sales,
            row_count: scope.len(),
            promoted_row_count: promoted_rows,
            total_transactions: has_transactions.then_some(transactions),
            promoted_transactions: has_transactions.then_some(promoted_transactions),
            sales_by_year: sum_by_year(&scope, |rec| rec.sales),
        })
    }

    /// Per-state drill-down: transactions per year, store ranking, and the
    /// best-selling family of the state's leading store.
    pub fn state_summary(&self, state: &str) -> Result<StateSummary> {
        let scope = self.scoped_rollup(&ScopeFilter::State(state.to_string()))?;
        let scoped = Self::new(scope);

        let transactions_by_year = if scoped.record_set().has_transactions() {
            let mut sums: std::collections::HashMap<i32, u64> = std::collections::HashMap::new();
            for rec in scoped.record_set() {
                *sums.entry(rec.year).or_default() += u64::from(rec.transactions);
            }
            let mut years: Vec<i32> = sums.keys().copied().collect();
            years.sort_unstable();
            Some(years.into_iter().map(|year| (year, sums[&year])).collect())
        } else {
            None
        };

        let top_stores =
            scoped.top_n(GroupBy::Store, Metric::Sales, Reducer::Sum, 10, SortOrder::Descending)?;

        let leading_store =
            match top_entity_in_scope(scoped.record_set(), GroupBy::Store, Metric::Sales)? {
                GroupValue::Store(id) => id,
                other => {
                    return Err(AnalyticsError::InvalidParameter(format!(
                        "expected a store key, got {other}"
                    )));
                }
            };

        let store_scope = scoped.scoped_rollup(&ScopeFilter::Store(leading_store))?;
        let leading_store_top_family =
            match top_entity_in_scope(&store_scope, GroupBy::Family, Metric::Sales)? {
                GroupValue::Family(name) => name,
                other => {
                    return Err(AnalyticsError::InvalidParameter(format!(
                        "expected a family key, got {other}"
                    )));
                }
            };

        Ok(StateSummary {
            state: state.to_string(),
            transactions_by_year,
            top_stores,
            leading_store,
            leading_store_top_family,
        })
    }

    /// The insights panel: seasonality heatmap plus promotion comparison.
    #[must_use]
    pub fn insights(&self) -> Insights {
        Insights {
            seasonality: self.seasonality_matrix(),
            promotion: self.promotion_comparison(),
        }
    }

    /// Distinct store numbers, ascending (selector options).
    #[must_use]
    pub fn store_ids(&self) -> Vec<u32> {
        let mut ids: Vec<u32> = self
            .record_set()
            .iter()
            .map(|rec| rec.store_id)
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Distinct state names, sorted (selector options); absent states are
    /// not an option.
    #[must_use]
    pub fn states(&self) -> Vec<String> {
        let mut states: Vec<String> = self
            .record_set()
            .iter()
            .filter_map(|rec| rec.state.clone())
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        states.sort();
        states
    }
}

/// Sum a per-record value per calendar year, ascending.
fn sum_by_year(
    records: &sales_domain::RecordSet,
    value_of: impl Fn(&sales_domain::SalesRecord) -> f64,
) -> Vec<(i32, f64)> {
    let mut sums: std::collections::HashMap<i32, f64> = std::collections::HashMap::new();
    for rec in records {
        *sums.entry(rec.year).or_default() += value_of(rec);
    }
    let mut years: Vec<i32> = sums.keys().copied().collect();
    years.sort_unstable();
    years.into_iter().map(|year| (year, sums[&year])).collect()
}
