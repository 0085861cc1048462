//! Analytics engine over the in-memory record set.
//!
//! The engine owns one immutable [`RecordSet`] snapshot and answers a fixed
//! menu of aggregation queries. Every query is a pure, eager read returning
//! a fully materialized result; `reload` replaces the snapshot wholesale.
//!
//! Grouping preserves first-encounter order so that equal aggregate values
//! rank in input order, and absent keys stay absent: a day or a heatmap
//! cell with no rows is missing from the output, never reported as zero.

use std::collections::HashMap;
use std::hash::Hash;

use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

use sales_domain::{
    GroupBy, GroupValue, Metric, Period, RecordSet, Reducer, SalesRecord, ScopeFilter, SortOrder,
    Weekday,
};

use crate::error::{AnalyticsError, Result};

/// In-memory analytics engine for retail sales data.
pub struct AnalyticsEngine {
    records: RecordSet,
}

/// One entry of a ranked key/value sequence, ready for a bar chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedValue {
    pub key: GroupValue,
    pub value: f64,
}

/// A concrete value of a seasonality period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PeriodValue {
    Weekday(Weekday),
    Week(u32),
    Month(u32),
}

impl PeriodValue {
    /// Render-ready axis label.
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Self::Weekday(day) => day.as_str().to_string(),
            Self::Week(week) => format!("W{week}"),
            Self::Month(month) => month.to_string(),
        }
    }
}

/// Mean sales for one period value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodMean {
    pub period: PeriodValue,
    pub mean_sales: f64,
}

/// Mean sales for the promoted and non-promoted partitions.
///
/// An empty partition is `None`: "no promoted rows" is distinguishable from
/// "promoted rows averaging zero sales".
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PromotionComparison {
    pub regular: Option<f64>,
    pub promoted: Option<f64>,
}

/// One populated cell of the weekday x month heatmap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatmapCell {
    pub day_of_week: Weekday,
    pub month: u32,
    pub mean_sales: f64,
}

/// Weekday x month grid of mean sales.
///
/// Only combinations present in the data have cells; `cell` returns `None`
/// for the rest so renderers can distinguish "no data" from "zero sales".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeasonalityMatrix {
    cells: Vec<HeatmapCell>,
}

impl SeasonalityMatrix {
    /// Mean sales for one weekday/month combination, if any row fell on it.
    #[must_use]
    pub fn cell(&self, day_of_week: Weekday, month: u32) -> Option<f64> {
        self.cells
            .iter()
            .find(|c| c.day_of_week == day_of_week && c.month == month)
            .map(|c| c.mean_sales)
    }

    /// Months present in the data, ascending.
    #[must_use]
    pub fn months(&self) -> Vec<u32> {
        let mut months: Vec<u32> = self.cells.iter().map(|c| c.month).collect();
        months.sort_unstable();
        months.dedup();
        months
    }

    /// All populated cells, ordered weekday-major, month-minor.
    #[must_use]
    pub fn cells(&self) -> &[HeatmapCell] {
        &self.cells
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl AnalyticsEngine {
    /// Create an engine over a loaded record set.
    #[must_use]
    pub fn new(records: RecordSet) -> Self {
        Self { records }
    }

    /// The current snapshot.
    #[must_use]
    pub fn record_set(&self) -> &RecordSet {
        &self.records
    }

    /// Replace the snapshot wholesale.
    ///
    /// The old record set is discarded; queries issued after `reload` see
    /// only the new data.
    pub fn reload(&mut self, records: RecordSet) {
        tracing::info!(
            old_rows = self.records.len(),
            new_rows = records.len(),
            "record set reloaded"
        );
        self.records = records;
    }

    /// Rank group keys by an aggregated metric and keep the first `n`.
    ///
    /// Ties keep first-encounter input order (stable sort). `n == 0` is an
    /// empty result, not an error. Grouping by state skips rows with no
    /// state. `Metric::Transactions` requires the load-time capability.
    pub fn top_n(
        &self,
        group: GroupBy,
        metric: Metric,
        reducer: Reducer,
        n: usize,
        order: SortOrder,
    ) -> Result<Vec<RankedValue>> {
        self.ensure_metric(metric)?;
        if n == 0 {
            return Ok(Vec::new());
        }

        let mut ranked = reduce_groups(group_samples(self.records.iter(), group, metric), reducer);
        sort_ranked(&mut ranked, order);
        ranked.truncate(n);
        Ok(ranked)
    }

    /// Mean sales per period value.
    ///
    /// Weekday output is ordered Monday to Sunday; weeks and months use
    /// their natural numeric order. Period values with no rows are omitted,
    /// matching the reference dashboard (callers detect a missing day by
    /// key absence, not by a zero).
    #[must_use]
    pub fn aggregate_by_period(&self, period: Period) -> Vec<PeriodMean> {
        match period {
            Period::DayOfWeek => {
                let mut samples: HashMap<Weekday, Vec<f64>> = HashMap::new();
                for rec in &self.records {
                    samples.entry(rec.day_of_week).or_default().push(rec.sales);
                }
                Weekday::ALL
                    .into_iter()
                    .filter_map(|day| {
                        samples.get(&day).map(|values| PeriodMean {
                            period: PeriodValue::Weekday(day),
                            mean_sales: values.iter().mean(),
                        })
                    })
                    .collect()
            }
            Period::IsoWeek => self.numeric_period_means(|rec| rec.iso_week, PeriodValue::Week),
            Period::Month => self.numeric_period_means(|rec| rec.month, PeriodValue::Month),
        }
    }

    fn numeric_period_means(
        &self,
        key_of: impl Fn(&SalesRecord) -> u32,
        wrap: impl Fn(u32) -> PeriodValue,
    ) -> Vec<PeriodMean> {
        let mut samples: HashMap<u32, Vec<f64>> = HashMap::new();
        for rec in &self.records {
            samples.entry(key_of(rec)).or_default().push(rec.sales);
        }
        let mut keys: Vec<u32> = samples.keys().copied().collect();
        keys.sort_unstable();
        keys.into_iter()
            .map(|key| PeriodMean {
                period: wrap(key),
                mean_sales: samples[&key].iter().mean(),
            })
            .collect()
    }

    /// Subset of records matching an exact equality filter.
    ///
    /// Fails with `EmptyScope` when nothing matches; callers surface that
    /// as "no data for this selection" rather than an empty chart.
    pub fn scoped_rollup(&self, filter: &ScopeFilter) -> Result<RecordSet> {
        let matched: Vec<SalesRecord> = self
            .records
            .iter()
            .filter(|rec| filter.matches(rec))
            .cloned()
            .collect();

        if matched.is_empty() {
            return Err(AnalyticsError::EmptyScope(filter.to_string()));
        }
        Ok(RecordSet::new(matched, self.records.has_transactions()))
    }

    /// Engine over a scoped subset, for drill-down views.
    pub fn scoped(&self, filter: &ScopeFilter) -> Result<Self> {
        Ok(Self::new(self.scoped_rollup(filter)?))
    }

    /// Mean sales for the promoted and non-promoted partitions.
    #[must_use]
    pub fn promotion_comparison(&self) -> PromotionComparison {
        let mut promoted = Vec::new();
        let mut regular = Vec::new();
        for rec in &self.records {
            if rec.on_promotion {
                promoted.push(rec.sales);
            } else {
                regular.push(rec.sales);
            }
        }
        PromotionComparison {
            regular: mean_of(&regular),
            promoted: mean_of(&promoted),
        }
    }

    /// Weekday x month grid of mean sales.
    #[must_use]
    pub fn seasonality_matrix(&self) -> SeasonalityMatrix {
        let mut samples: HashMap<(Weekday, u32), Vec<f64>> = HashMap::new();
        for rec in &self.records {
            samples
                .entry((rec.day_of_week, rec.month))
                .or_default()
                .push(rec.sales);
        }

        let mut cells = Vec::with_capacity(samples.len());
        for day in Weekday::ALL {
            for month in 1..=12 {
                if let Some(values) = samples.get(&(day, month)) {
                    cells.push(HeatmapCell {
                        day_of_week: day,
                        month,
                        mean_sales: values.iter().mean(),
                    });
                }
            }
        }
        SeasonalityMatrix { cells }
    }

    pub(crate) fn ensure_metric(&self, metric: Metric) -> Result<()> {
        if metric == Metric::Transactions && !self.records.has_transactions() {
            return Err(AnalyticsError::NoData(
                "transactions (column not provided by any source)".to_string(),
            ));
        }
        Ok(())
    }
}

/// Group key with the maximum summed metric within a scoped record set.
///
/// Callers must scope first: an empty record set fails with `EmptyScope`.
/// Ties keep the first-encountered key in input order.
pub fn top_entity_in_scope(
    records: &RecordSet,
    group: GroupBy,
    metric: Metric,
) -> Result<GroupValue> {
    if records.is_empty() {
        return Err(AnalyticsError::EmptyScope("empty record set".to_string()));
    }
    if metric == Metric::Transactions && !records.has_transactions() {
        return Err(AnalyticsError::NoData(
            "transactions (column not provided by any source)".to_string(),
        ));
    }

    let ranked = reduce_groups(group_samples(records.iter(), group, metric), Reducer::Sum);
    let mut best: Option<&RankedValue> = None;
    for entry in &ranked {
        // Strict comparison keeps the first-encountered key on ties.
        if best.is_none_or(|current| entry.value > current.value) {
            best = Some(entry);
        }
    }
    best.map(|entry| entry.key.clone())
        .ok_or_else(|| AnalyticsError::EmptyScope(format!("no rows carry a {group:?} key")))
}

// =============================================================================
// GROUPING PRIMITIVES
// =============================================================================

/// Accumulate metric samples per group key, preserving first-encounter order.
pub(crate) fn group_samples<'a>(
    records: impl Iterator<Item = &'a SalesRecord>,
    group: GroupBy,
    metric: Metric,
) -> Vec<(GroupValue, Vec<f64>)> {
    samples_by_key(records, |rec| match group {
        GroupBy::Family => Some(GroupValue::Family(rec.family.clone())),
        GroupBy::Store => Some(GroupValue::Store(rec.store_id)),
        // Absent states are excluded, never coerced to a default.
        GroupBy::State => rec.state.clone().map(GroupValue::State),
    }, metric)
}

/// First-encounter-ordered sample accumulator over an arbitrary key.
pub(crate) fn samples_by_key<'a, K: Eq + Hash + Clone>(
    records: impl Iterator<Item = &'a SalesRecord>,
    key_of: impl Fn(&SalesRecord) -> Option<K>,
    metric: Metric,
) -> Vec<(K, Vec<f64>)> {
    let mut index: HashMap<K, usize> = HashMap::new();
    let mut groups: Vec<(K, Vec<f64>)> = Vec::new();

    for rec in records {
        let Some(key) = key_of(rec) else { continue };
        let slot = match index.get(&key) {
            Some(&slot) => slot,
            None => {
                groups.push((key.clone(), Vec::new()));
                index.insert(key, groups.len() - 1);
                groups.len() - 1
            }
        };
        groups[slot].1.push(metric.of(rec));
    }
    groups
}

pub(crate) fn reduce_groups(
    groups: Vec<(GroupValue, Vec<f64>)>,
    reducer: Reducer,
) -> Vec<RankedValue> {
    groups
        .into_iter()
        .map(|(key, values)| RankedValue {
            key,
            value: match reducer {
                Reducer::Sum => values.iter().sum(),
                Reducer::Mean => values.iter().mean(),
            },
        })
        .collect()
}

pub(crate) fn sort_ranked(ranked: &mut [RankedValue], order: SortOrder) {
    match order {
        // Stable sorts: equal values keep first-encounter order.
        SortOrder::Ascending => ranked.sort_by(|a, b| a.value.total_cmp(&b.value)),
        SortOrder::Descending => ranked.sort_by(|a, b| b.value.total_cmp(&a.value)),
    }
}

fn mean_of(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().mean())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(store: u32, family: &str, sales: f64, promo: bool) -> SalesRecord {
        rec_on(store, family, sales, promo, "2017-08-15")
    }

    fn rec_on(store: u32, family: &str, sales: f64, promo: bool, date: &str) -> SalesRecord {
        SalesRecord::new(store, family, date.parse().unwrap(), sales, promo, 0, None).unwrap()
    }

    /// The worked example: three rows across two stores and two families.
    fn example_engine() -> AnalyticsEngine {
        AnalyticsEngine::new(RecordSet::new(
            vec![
                rec(1, "A", 10.0, false),
                rec(1, "B", 30.0, true),
                rec(2, "A", 5.0, false),
            ],
            false,
        ))
    }

    #[test]
    fn top_n_ranks_summed_families() {
        let engine = example_engine();
        let top = engine
            .top_n(GroupBy::Family, Metric::Sales, Reducer::Sum, 1, SortOrder::Descending)
            .unwrap();
        assert_eq!(
            top,
            vec![RankedValue {
                key: GroupValue::Family("B".to_string()),
                value: 30.0
            }]
        );
    }

    #[test]
    fn top_n_is_idempotent() {
        let engine = example_engine();
        let run = || {
            engine
                .top_n(GroupBy::Family, Metric::Sales, Reducer::Sum, 10, SortOrder::Descending)
                .unwrap()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn top_n_zero_is_empty_not_an_error() {
        let engine = example_engine();
        let top = engine
            .top_n(GroupBy::Family, Metric::Sales, Reducer::Sum, 0, SortOrder::Descending)
            .unwrap();
        assert!(top.is_empty());
    }

    #[test]
    fn top_n_ties_keep_input_order() {
        let engine = AnalyticsEngine::new(RecordSet::new(
            vec![
                rec(1, "X", 10.0, false),
                rec(1, "Y", 10.0, false),
                rec(1, "Z", 10.0, false),
            ],
            false,
        ));
        let top = engine
            .top_n(GroupBy::Family, Metric::Sales, Reducer::Sum, 3, SortOrder::Descending)
            .unwrap();
        let keys: Vec<String> = top.iter().map(|e| e.key.label()).collect();
        assert_eq!(keys, vec!["X", "Y", "Z"]);
    }

    #[test]
    fn top_n_ascending_reverses_rank() {
        let engine = example_engine();
        let bottom = engine
            .top_n(GroupBy::Family, Metric::Sales, Reducer::Sum, 1, SortOrder::Ascending)
            .unwrap();
        assert_eq!(bottom[0].key, GroupValue::Family("A".to_string()));
        assert!((bottom[0].value - 15.0).abs() < f64::EPSILON);
    }

    #[test]
    fn top_n_mean_reducer() {
        let engine = example_engine();
        let top = engine
            .top_n(GroupBy::Family, Metric::Sales, Reducer::Mean, 2, SortOrder::Descending)
            .unwrap();
        // A averages (10 + 5) / 2 = 7.5, B averages 30.
        assert_eq!(top[0].key, GroupValue::Family("B".to_string()));
        assert!((top[1].value - 7.5).abs() < f64::EPSILON);
    }

    #[test]
    fn transactions_metric_requires_capability() {
        let engine = example_engine();
        let err = engine
            .top_n(GroupBy::Store, Metric::Transactions, Reducer::Sum, 5, SortOrder::Descending)
            .unwrap_err();
        assert!(matches!(err, AnalyticsError::NoData(_)));
    }

    #[test]
    fn state_grouping_skips_stateless_rows() {
        let mut with_state = rec(1, "A", 10.0, false);
        with_state.state = Some("Pichincha".to_string());
        let engine = AnalyticsEngine::new(RecordSet::new(
            vec![with_state, rec(2, "B", 99.0, false)],
            false,
        ));
        let top = engine
            .top_n(GroupBy::State, Metric::Sales, Reducer::Sum, 10, SortOrder::Descending)
            .unwrap();
        // The stateless 99.0 row contributes to no state bucket.
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].key, GroupValue::State("Pichincha".to_string()));
    }

    #[test]
    fn weekday_profile_omits_absent_days() {
        // 2017-08-14 was a Monday, 2017-08-16 a Wednesday.
        let engine = AnalyticsEngine::new(RecordSet::new(
            vec![
                rec_on(1, "A", 10.0, false, "2017-08-16"),
                rec_on(1, "A", 20.0, false, "2017-08-14"),
            ],
            false,
        ));
        let profile = engine.aggregate_by_period(Period::DayOfWeek);

        // Monday before Wednesday regardless of input order; Tuesday absent.
        let days: Vec<PeriodValue> = profile.iter().map(|p| p.period).collect();
        assert_eq!(
            days,
            vec![
                PeriodValue::Weekday(Weekday::Monday),
                PeriodValue::Weekday(Weekday::Wednesday)
            ]
        );
        assert!(!days.contains(&PeriodValue::Weekday(Weekday::Tuesday)));
    }

    #[test]
    fn month_profile_uses_numeric_order() {
        let engine = AnalyticsEngine::new(RecordSet::new(
            vec![
                rec_on(1, "A", 1.0, false, "2017-12-01"),
                rec_on(1, "A", 2.0, false, "2017-01-05"),
                rec_on(1, "A", 4.0, false, "2017-01-19"),
            ],
            false,
        ));
        let profile = engine.aggregate_by_period(Period::Month);
        assert_eq!(profile.len(), 2);
        assert_eq!(profile[0].period, PeriodValue::Month(1));
        assert!((profile[0].mean_sales - 3.0).abs() < f64::EPSILON);
        assert_eq!(profile[1].period, PeriodValue::Month(12));
    }

    #[test]
    fn scoped_rollup_then_top_entity() {
        let engine = example_engine();
        let scope = engine.scoped_rollup(&ScopeFilter::Store(1)).unwrap();
        assert_eq!(scope.len(), 2);

        let top = top_entity_in_scope(&scope, GroupBy::Family, Metric::Sales).unwrap();
        assert_eq!(top, GroupValue::Family("B".to_string()));
    }

    #[test]
    fn single_group_scope_returns_that_group() {
        let engine = AnalyticsEngine::new(RecordSet::new(
            vec![rec(7, "DELI", 3.0, false), rec(7, "DELI", 4.0, false)],
            false,
        ));
        let scope = engine.scoped_rollup(&ScopeFilter::Store(7)).unwrap();
        let top = top_entity_in_scope(&scope, GroupBy::Family, Metric::Sales).unwrap();
        assert_eq!(top, GroupValue::Family("DELI".to_string()));
    }

    #[test]
    fn empty_scope_is_reported_not_defaulted() {
        let engine = example_engine();
        let err = engine.scoped_rollup(&ScopeFilter::Store(99)).unwrap_err();
        assert!(matches!(err, AnalyticsError::EmptyScope(_)));

        let err = engine
            .scoped_rollup(&ScopeFilter::State("Nowhere".to_string()))
            .unwrap_err();
        assert!(matches!(err, AnalyticsError::EmptyScope(_)));
    }

    #[test]
    fn top_entity_on_empty_set_is_empty_scope() {
        let empty = RecordSet::default();
        let err = top_entity_in_scope(&empty, GroupBy::Family, Metric::Sales).unwrap_err();
        assert!(matches!(err, AnalyticsError::EmptyScope(_)));
    }

    #[test]
    fn top_entity_ties_keep_first_encountered() {
        let records = RecordSet::new(
            vec![rec(1, "A", 10.0, false), rec(1, "B", 10.0, false)],
            false,
        );
        let top = top_entity_in_scope(&records, GroupBy::Family, Metric::Sales).unwrap();
        assert_eq!(top, GroupValue::Family("A".to_string()));
    }

    #[test]
    fn promotion_comparison_matches_reference_example() {
        let engine = example_engine();
        let cmp = engine.promotion_comparison();
        assert!((cmp.regular.unwrap() - 7.5).abs() < f64::EPSILON);
        assert!((cmp.promoted.unwrap() - 30.0).abs() < f64::EPSILON);
    }

    #[test]
    fn empty_promotion_partition_is_none_not_zero() {
        let engine = AnalyticsEngine::new(RecordSet::new(
            vec![rec(1, "A", 10.0, false), rec(2, "A", 5.0, false)],
            false,
        ));
        let cmp = engine.promotion_comparison();
        assert_eq!(cmp.promoted, None);
        assert!(cmp.regular.is_some());
    }

    #[test]
    fn seasonality_matrix_leaves_absent_cells_undefined() {
        // Both rows are August Tuesdays.
        let engine = AnalyticsEngine::new(RecordSet::new(
            vec![
                rec_on(1, "A", 10.0, false, "2017-08-15"),
                rec_on(1, "A", 20.0, false, "2017-08-22"),
            ],
            false,
        ));
        let matrix = engine.seasonality_matrix();
        assert_eq!(matrix.cell(Weekday::Tuesday, 8), Some(15.0));
        assert_eq!(matrix.cell(Weekday::Monday, 8), None);
        assert_eq!(matrix.cell(Weekday::Tuesday, 7), None);
        assert_eq!(matrix.months(), vec![8]);
    }

    #[test]
    fn reload_replaces_the_snapshot_wholesale() {
        let mut engine = example_engine();
        assert_eq!(engine.record_set().len(), 3);

        engine.reload(RecordSet::new(vec![rec(9, "NEW", 1.0, false)], true));
        assert_eq!(engine.record_set().len(), 1);
        assert!(engine.record_set().has_transactions());
        let top = engine
            .top_n(GroupBy::Family, Metric::Sales, Reducer::Sum, 10, SortOrder::Descending)
            .unwrap();
        assert_eq!(top[0].key, GroupValue::Family("NEW".to_string()));
    }

    #[test]
    fn queries_do_not_mutate_the_snapshot() {
        let engine = example_engine();
        let before = engine.record_set().clone();
        let _ = engine.top_n(GroupBy::Store, Metric::Sales, Reducer::Sum, 2, SortOrder::Descending);
        let _ = engine.aggregate_by_period(Period::IsoWeek);
        let _ = engine.seasonality_matrix();
        assert_eq!(engine.record_set(), &before);
    }

    #[test]
    fn iso_week_profile_crosses_year_boundary() {
        // 2016-01-01 falls in ISO week 53 of 2015.
        let engine = AnalyticsEngine::new(RecordSet::new(
            vec![rec_on(1, "A", 10.0, false, "2016-01-01")],
            false,
        ));
        let profile = engine.aggregate_by_period(Period::IsoWeek);
        assert_eq!(profile[0].period, PeriodValue::Week(53));
    }
}
