use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::{
    CategoryTotal, Cents, LedgerSummary, Transaction, recent_transactions,
};

/// Number of recent transactions listed in a report
pub const RECENT_TRANSACTIONS: usize = 5;

/// Number of intervals on the chart's amount axis
pub const CHART_TICKS: i64 = 5;

/// Descriptions longer than this are shortened in tabular output
pub const DESCRIPTION_WIDTH: usize = 25;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetReport {
    pub generated_on: NaiveDate,
    pub total_income: Cents,
    pub total_expense: Cents,
    pub balance: Cents,
    pub categories: Vec<CategoryShare>,
    pub recent: Vec<Transaction>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryShare {
    pub category: String,
    pub total: Cents,
    /// Share of all expenses, rounded to a whole percent
    pub percentage: u32,
}

impl BudgetReport {
    pub fn build(transactions: &[Transaction], generated_on: NaiveDate) -> Self {
        let summary = LedgerSummary::compute(transactions);
        let categories = summary
            .categories
            .iter()
            .map(|c| CategoryShare {
                category: c.category.clone(),
                total: c.total,
                percentage: percent_of(c.total, summary.expense).round() as u32,
            })
            .collect();

        Self {
            generated_on,
            total_income: summary.income,
            total_expense: summary.expense,
            balance: summary.balance,
            categories,
            recent: recent_transactions(transactions, RECENT_TRANSACTIONS)
                .into_iter()
                .cloned()
                .collect(),
        }
    }
}

/// Scaling data for an expenses-by-category bar chart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpenseChart {
    /// Largest category amount; the top of the axis
    pub max: Cents,
    /// Axis labels from the top (`max`) down to zero
    pub ticks: Vec<Cents>,
    /// Bars, largest first
    pub bars: Vec<ChartBar>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartBar {
    pub category: String,
    pub amount: Cents,
    /// Bar height relative to the largest bar (0..=100)
    pub height_percent: f64,
}

impl ExpenseChart {
    /// Build the chart from a category breakdown (already sorted largest first).
    /// Returns `None` when there is nothing to draw.
    pub fn from_breakdown(breakdown: &[CategoryTotal]) -> Option<Self> {
        let max = breakdown.iter().map(|c| c.total).max()?;
        if max <= 0 {
            return None;
        }

        let ticks = (0..=CHART_TICKS)
            .rev()
            .map(|i| (i128::from(max) * i128::from(i) / i128::from(CHART_TICKS)) as Cents)
            .collect();
        let bars = breakdown
            .iter()
            .map(|c| ChartBar {
                category: c.category.clone(),
                amount: c.total,
                height_percent: percent_of(c.total, max),
            })
            .collect();

        Some(Self { max, ticks, bars })
    }
}

fn percent_of(part: Cents, whole: Cents) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

/// Shorten a description for table display: "Weekly groceries at the
/// farmers market" becomes "Weekly groceries at th...".
pub fn truncate_description(description: &str) -> String {
    if description.chars().count() <= DESCRIPTION_WIDTH {
        description.to_string()
    } else {
        let head: String = description.chars().take(DESCRIPTION_WIDTH - 3).collect();
        format!("{}...", head)
    }
}
