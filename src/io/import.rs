use anyhow::{Context, Result};
use serde::Deserialize;
use std::io::Read;
use tracing::warn;

use crate::application::{AppError, BudgetService, NewTransaction};
use crate::domain::FALLBACK_CATEGORY;
use crate::io::export::BudgetSnapshot;
use crate::storage::BlobStore;

/// Result of an import operation
#[derive(Debug, Clone, Default)]
pub struct ImportResult {
    pub imported: usize,
    /// Transactions moved to the fallback category because theirs was unknown
    pub reassigned: usize,
    pub errors: Vec<ImportError>,
}

/// Error that occurred during import
#[derive(Debug, Clone)]
pub struct ImportError {
    pub line: usize,
    pub error: String,
}

/// Options for import operations
#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    /// Validate every row but store nothing
    pub dry_run: bool,
    /// Add categories that don't exist yet instead of rejecting the row
    pub create_missing_categories: bool,
}

/// One row of a transactions CSV; extra columns (such as `id`) are ignored.
#[derive(Debug, Deserialize)]
struct TransactionRow {
    date: String,
    description: String,
    category: String,
    amount: String,
}

impl From<TransactionRow> for NewTransaction {
    fn from(row: TransactionRow) -> Self {
        NewTransaction {
            description: row.description,
            amount: row.amount,
            category: row.category,
            date: row.date,
        }
    }
}

/// Importer for loading data into the budget
pub struct Importer<'a, S: BlobStore> {
    service: &'a mut BudgetService<S>,
}

impl<'a, S: BlobStore> Importer<'a, S> {
    pub fn new(service: &'a mut BudgetService<S>) -> Self {
        Self { service }
    }

    /// Import transactions from CSV. Each row goes through the same
    /// validation as a hand-entered transaction; bad rows are reported and
    /// skipped, good rows are stored.
    pub async fn import_transactions_csv<R: Read>(
        &mut self,
        reader: R,
        options: ImportOptions,
    ) -> Result<ImportResult> {
        let mut csv_reader = csv::Reader::from_reader(reader);
        let mut result = ImportResult::default();

        for (index, row) in csv_reader.deserialize::<TransactionRow>().enumerate() {
            let line = index + 2; // +2 for header and 0-indexing

            let input: NewTransaction = match row {
                Ok(row) => row.into(),
                Err(e) => {
                    result.errors.push(ImportError {
                        line,
                        error: format!("CSV parse error: {}", e),
                    });
                    continue;
                }
            };

            match self.import_row(&input, &options).await {
                Ok(()) => result.imported += 1,
                Err(AppError::Storage(e)) => return Err(e),
                Err(e) => result.errors.push(ImportError {
                    line,
                    error: e.to_string(),
                }),
            }
        }

        Ok(result)
    }

    async fn import_row(
        &mut self,
        input: &NewTransaction,
        options: &ImportOptions,
    ) -> Result<(), AppError> {
        let unknown_category = !self.service.categories().contains(&input.category);
        if unknown_category && options.create_missing_categories && !input.category.trim().is_empty() {
            // Check the other fields first so a bad row never creates a category
            let mut candidate = input.clone();
            candidate.category = FALLBACK_CATEGORY.to_string();
            self.service.validate_transaction(&candidate)?;
            if options.dry_run {
                return Ok(());
            }
            self.service.add_category(&input.category).await?;
        }

        if options.dry_run {
            self.service.validate_transaction(input)?;
        } else {
            self.service.add_transaction(input.clone()).await?;
        }
        Ok(())
    }

    /// Replace all stored data with a JSON snapshot.
    pub async fn import_full_json<R: Read>(
        &mut self,
        reader: R,
        options: ImportOptions,
    ) -> Result<ImportResult> {
        let snapshot: BudgetSnapshot =
            serde_json::from_reader(reader).context("Snapshot is not valid JSON")?;
        let imported = snapshot.transactions.len();

        if options.dry_run {
            return Ok(ImportResult {
                imported,
                ..Default::default()
            });
        }

        let reassigned = self
            .service
            .restore(snapshot.transactions, snapshot.categories, snapshot.goals)
            .await?;
        if reassigned > 0 {
            warn!(reassigned, "snapshot referenced unknown categories");
        }

        Ok(ImportResult {
            imported,
            reassigned,
            errors: Vec::new(),
        })
    }
}
