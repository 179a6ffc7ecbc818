use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;

use crate::application::BudgetService;
use crate::domain::{Goal, Transaction, format_cents};
use crate::storage::BlobStore;

/// Everything the tracker stores, for full export/import
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetSnapshot {
    pub version: String,
    pub exported_at: DateTime<Utc>,
    pub transactions: Vec<Transaction>,
    pub categories: Vec<String>,
    #[serde(default)]
    pub goals: Vec<Goal>,
}

/// Exporter for converting budget data to various formats
pub struct Exporter<'a, S: BlobStore> {
    service: &'a BudgetService<S>,
}

impl<'a, S: BlobStore> Exporter<'a, S> {
    pub fn new(service: &'a BudgetService<S>) -> Self {
        Self { service }
    }

    /// Export transactions to CSV. Amounts are written as decimal strings
    /// so the file can be re-imported as-is.
    pub fn export_transactions_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        csv_writer.write_record(["id", "date", "description", "category", "amount"])?;

        let mut count = 0;
        for transaction in self.service.transactions() {
            csv_writer.write_record([
                transaction.id.to_string(),
                transaction.date.format("%Y-%m-%d").to_string(),
                transaction.description.clone(),
                transaction.category.clone(),
                format_cents(transaction.amount_cents),
            ])?;
            count += 1;
        }

        csv_writer.flush()?;
        Ok(count)
    }

    /// Export transactions as a JSON array
    pub fn export_transactions_json<W: Write>(&self, mut writer: W) -> Result<usize> {
        let transactions = self.service.transactions();
        serde_json::to_writer_pretty(&mut writer, transactions)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        Ok(transactions.len())
    }

    /// Export goals to CSV
    pub fn export_goals_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        csv_writer.write_record(["id", "name", "target", "target_date", "saved"])?;

        let mut count = 0;
        for goal in self.service.goals() {
            csv_writer.write_record([
                goal.id.to_string(),
                goal.name.clone(),
                format_cents(goal.target_cents),
                goal.target_date.format("%Y-%m-%d").to_string(),
                format_cents(goal.current_cents),
            ])?;
            count += 1;
        }

        csv_writer.flush()?;
        Ok(count)
    }

    /// Export everything as a JSON snapshot
    pub fn export_full_json<W: Write>(&self, mut writer: W) -> Result<BudgetSnapshot> {
        let snapshot = BudgetSnapshot {
            version: env!("CARGO_PKG_VERSION").to_string(),
            exported_at: Utc::now(),
            transactions: self.service.transactions().to_vec(),
            categories: self.service.categories().names().to_vec(),
            goals: self.service.goals().to_vec(),
        };

        let json = serde_json::to_string_pretty(&snapshot)?;
        writer.write_all(json.as_bytes())?;
        writer.flush()?;

        Ok(snapshot)
    }
}
