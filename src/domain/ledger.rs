use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::{Cents, Transaction};

/// Expense total for one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryTotal {
    pub category: String,
    pub total: Cents,
}

/// Every aggregate derived from the ledger, computed in one pass over a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSummary {
    pub balance: Cents,
    pub income: Cents,
    /// Magnitude of all expenses (always >= 0)
    pub expense: Cents,
    pub categories: Vec<CategoryTotal>,
}

impl LedgerSummary {
    pub fn compute(transactions: &[Transaction]) -> Self {
        Self {
            balance: total_balance(transactions),
            income: total_income(transactions),
            expense: total_expense(transactions),
            categories: category_breakdown(transactions),
        }
    }
}

/// Sum of every amount. Income is positive and expenses negative already.
/// Sums saturate at the `Cents` range instead of overflowing.
pub fn total_balance(transactions: &[Transaction]) -> Cents {
    transactions
        .iter()
        .map(|t| t.amount_cents)
        .fold(0, Cents::saturating_add)
}

/// Sum of amounts strictly greater than zero.
pub fn total_income(transactions: &[Transaction]) -> Cents {
    transactions
        .iter()
        .filter(|t| t.is_income())
        .map(|t| t.amount_cents)
        .fold(0, Cents::saturating_add)
}

/// Sum of absolute values of amounts strictly less than zero.
pub fn total_expense(transactions: &[Transaction]) -> Cents {
    transactions
        .iter()
        .filter(|t| t.is_expense())
        .map(Transaction::magnitude)
        .fold(0, Cents::saturating_add)
}

/// Expense magnitude per category, largest first.
/// Categories are grouped case-insensitively under the first spelling seen,
/// and ties on amount keep the order in which they were first seen.
pub fn category_breakdown(transactions: &[Transaction]) -> Vec<CategoryTotal> {
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut totals: Vec<CategoryTotal> = Vec::new();

    for transaction in transactions.iter().filter(|t| t.is_expense()) {
        let index = *positions
            .entry(transaction.category.to_ascii_lowercase())
            .or_insert_with(|| {
                totals.push(CategoryTotal {
                    category: transaction.category.clone(),
                    total: 0,
                });
                totals.len() - 1
            });
        totals[index].total = totals[index].total.saturating_add(transaction.magnitude());
    }

    totals.retain(|c| c.total != 0);
    // sort_by is stable, which preserves first-encounter order on ties
    totals.sort_by(|a, b| b.total.cmp(&a.total));
    totals
}

/// Relabel every transaction in `from` (matched case-insensitively) as `to`.
/// Returns how many transactions changed.
pub fn reassign_category(transactions: &mut [Transaction], from: &str, to: &str) -> usize {
    let mut changed = 0;
    for transaction in transactions
        .iter_mut()
        .filter(|t| t.category.eq_ignore_ascii_case(from))
    {
        transaction.category = to.to_string();
        changed += 1;
    }
    changed
}

/// The `limit` most recent transactions by date, newest first.
/// On the same date, the later-recorded entry comes first.
pub fn recent_transactions(transactions: &[Transaction], limit: usize) -> Vec<&Transaction> {
    let mut recent: Vec<&Transaction> = transactions.iter().rev().collect();
    recent.sort_by(|a, b| b.date.cmp(&a.date));
    recent.truncate(limit);
    recent
}
