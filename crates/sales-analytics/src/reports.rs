//! Report generation for dashboard data.

use serde::{Deserialize, Serialize};

use sales_domain::Period;

use crate::engine::{AnalyticsEngine, PeriodMean, RankedValue};
use crate::error::{AnalyticsError, Result};
use crate::queries::{GlobalOverview, Insights, StateSummary, StoreSummary};

/// Comprehensive dashboard report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardReport {
    pub generated_at: String,
    pub overview: GlobalOverview,
    pub top_products: Vec<RankedValue>,
    pub sales_by_store: Vec<RankedValue>,
    /// `None` when no row in the set is promoted
    pub top_promo_stores: Option<Vec<RankedValue>>,
    pub weekday_profile: Vec<PeriodMean>,
    pub weekly_profile: Vec<PeriodMean>,
    pub monthly_profile: Vec<PeriodMean>,
    /// Heatmap and promotion comparison
    pub insights: Insights,
    pub store: Option<StoreSummary>,
    pub state: Option<StateSummary>,
}

impl AnalyticsEngine {
    /// Generate the full dashboard report, optionally with store and state
    /// drill-down sections.
    ///
    /// An unknown store or state surfaces as `EmptyScope` so the caller can
    /// report "no data for this selection".
    pub fn generate_report(
        &self,
        top_n: usize,
        store: Option<u32>,
        state: Option<&str>,
    ) -> Result<DashboardReport> {
        let top_promo_stores = match self.top_promo_stores(top_n) {
            Ok(ranked) => Some(ranked),
            Err(AnalyticsError::NoData(_)) => None,
            Err(err) => return Err(err),
        };

        let store = store.map(|id| self.store_summary(id)).transpose()?;
        let state = state.map(|name| self.state_summary(name)).transpose()?;

        Ok(DashboardReport {
            generated_at: chrono::Utc::now().to_rfc3339(),
            overview: self.global_overview(),
            top_products: self.top_products(top_n)?,
            sales_by_store: self.sales_by_store(),
            top_promo_stores,
            weekday_profile: self.aggregate_by_period(Period::DayOfWeek),
            weekly_profile: self.aggregate_by_period(Period::IsoWeek),
            monthly_profile: self.aggregate_by_period(Period::Month),
            insights: self.insights(),
            store,
            state,
        })
    }

    /// Generate the report as a JSON string.
    pub fn generate_report_json(
        &self,
        top_n: usize,
        store: Option<u32>,
        state: Option<&str>,
    ) -> Result<String> {
        let report = self.generate_report(top_n, store, state)?;
        serde_json::to_string_pretty(&report)
            .map_err(|e| AnalyticsError::Conversion(e.to_string()))
    }
}

impl DashboardReport {
    /// Render the report as Markdown.
    #[must_use]
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();
        md.push_str("# Retail Sales Dashboard Report\n\n");
        md.push_str(&format!("**Generated:** {}\n\n", self.generated_at));

        md.push_str("## Global Overview\n\n");
        md.push_str("| Metric | Value |\n");
        md.push_str("|--------|-------|\n");
        md.push_str(&format!("| Rows | {} |\n", self.overview.total_rows));
        md.push_str(&format!("| Stores | {} |\n", self.overview.store_count));
        md.push_str(&format!("| Product Families | {} |\n", self.overview.family_count));
        md.push_str(&format!("| States | {} |\n", self.overview.state_count));
        if let Some(span) = &self.overview.month_span {
            md.push_str(&format!(
                "| Period | {} months ({}) |\n",
                span.distinct_months,
                span.label()
            ));
        }
        md.push('\n');

        push_ranked_table(&mut md, "Top Products", "Family", &self.top_products);
        push_ranked_table(&mut md, "Sales by Store", "Store", &self.sales_by_store);

        match &self.top_promo_stores {
            Some(ranked) => {
                push_ranked_table(&mut md, "Top Stores on Promotion", "Store", ranked);
            }
            None => md.push_str("## Top Stores on Promotion\n\nNo promoted sales in the data.\n\n"),
        }

        push_profile_table(&mut md, "Mean Sales by Weekday", &self.weekday_profile);
        push_profile_table(&mut md, "Mean Sales by ISO Week", &self.weekly_profile);
        push_profile_table(&mut md, "Mean Sales by Month", &self.monthly_profile);

        md.push_str("## Promotion Comparison\n\n");
        md.push_str("| Partition | Mean Sales |\n");
        md.push_str("|-----------|------------|\n");
        md.push_str(&format!(
            "| Regular | {} |\n",
            optional_value(self.insights.promotion.regular)
        ));
        md.push_str(&format!(
            "| Promoted | {} |\n",
            optional_value(self.insights.promotion.promoted)
        ));
        md.push('\n');

        self.push_seasonality(&mut md);

        if let Some(store) = &self.store {
            md.push_str(&format!("## Store {}\n\n", store.store_id));
            md.push_str("| Metric | Value |\n");
            md.push_str("|--------|-------|\n");
            md.push_str(&format!("| Total Sales | {:.1} |\n", store.total_sales));
            md.push_str(&format!("| Rows | {} |\n", store.row_count));
            md.push_str(&format!("| Promoted Rows | {} |\n", store.promoted_row_count));
            md.push_str(&format!(
                "| Transactions | {} |\n",
                store
                    .total_transactions
                    .map_or_else(|| "n/a".to_string(), |v| v.to_string())
            ));
            md.push_str(&format!(
                "| Promoted Transactions | {} |\n",
                store
                    .promoted_transactions
                    .map_or_else(|| "n/a".to_string(), |v| v.to_string())
            ));
            md.push('\n');

            md.push_str("### Sales by Year\n\n");
            md.push_str("| Year | Sales |\n");
            md.push_str("|------|-------|\n");
            for (year, sales) in &store.sales_by_year {
                md.push_str(&format!("| {year} | {sales:.1} |\n"));
            }
            md.push('\n');
        }

        if let Some(state) = &self.state {
            md.push_str(&format!("## State {}\n\n", state.state));
            if let Some(per_year) = &state.transactions_by_year {
                md.push_str("### Transactions by Year\n\n");
                md.push_str("| Year | Transactions |\n");
                md.push_str("|------|---------------|\n");
                for (year, transactions) in per_year {
                    md.push_str(&format!("| {year} | {transactions} |\n"));
                }
                md.push('\n');
            }
            push_ranked_table(&mut md, "Top Stores in State", "Store", &state.top_stores);
            md.push_str(&format!(
                "Leading store: **{}** - best-selling family there: **{}**\n\n",
                state.leading_store, state.leading_store_top_family
            ));
        }

        md
    }

    fn push_seasonality(&self, md: &mut String) {
        md.push_str("## Seasonality Heatmap (mean sales)\n\n");
        if self.insights.seasonality.is_empty() {
            md.push_str("No data.\n\n");
            return;
        }

        let months = self.insights.seasonality.months();
        md.push_str("| Day |");
        for month in &months {
            md.push_str(&format!(" {month} |"));
        }
        md.push('\n');
        md.push_str("|-----|");
        for _ in &months {
            md.push_str("---|");
        }
        md.push('\n');

        for day in sales_domain::Weekday::ALL {
            md.push_str(&format!("| {} |", day.as_str()));
            for month in &months {
                // Absent cells render as a dash, not as zero.
                match self.insights.seasonality.cell(day, *month) {
                    Some(mean) => md.push_str(&format!(" {mean:.1} |")),
                    None => md.push_str(" - |"),
                }
            }
            md.push('\n');
        }
        md.push('\n');
    }
}

fn push_ranked_table(md: &mut String, title: &str, key_header: &str, ranked: &[RankedValue]) {
    if ranked.is_empty() {
        return;
    }
    md.push_str(&format!("## {title}\n\n"));
    md.push_str(&format!("| Rank | {key_header} | Sales |\n"));
    md.push_str("|------|------|-------|\n");
    for (i, entry) in ranked.iter().enumerate() {
        md.push_str(&format!("| {} | {} | {:.1} |\n", i + 1, entry.key.label(), entry.value));
    }
    md.push('\n');
}

fn push_profile_table(md: &mut String, title: &str, profile: &[PeriodMean]) {
    if profile.is_empty() {
        return;
    }
    md.push_str(&format!("## {title}\n\n"));
    md.push_str("| Period | Mean Sales |\n");
    md.push_str("|--------|------------|\n");
    for point in profile {
        md.push_str(&format!("| {} | {:.1} |\n", point.period.label(), point.mean_sales));
    }
    md.push('\n');
}

fn optional_value(value: Option<f64>) -> String {
    value.map_or_else(|| "no data".to_string(), |v| format!("{v:.1}"))
}
