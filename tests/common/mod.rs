// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use anyhow::Result;
use budget_tracker::application::{BudgetService, NewTransaction};
use budget_tracker::domain::Transaction;
use budget_tracker::storage::{BlobStore, MemoryBlobStore, SqliteBlobStore};
use chrono::NaiveDate;
use tempfile::TempDir;

pub type SqliteService = BudgetService<SqliteBlobStore>;
pub type MemoryService = BudgetService<MemoryBlobStore>;

/// Helper to create a test service with a temporary database
pub async fn test_service() -> Result<(SqliteService, TempDir)> {
    let temp_dir = TempDir::new()?;
    let service = SqliteService::init(&db_path(&temp_dir)).await?;
    Ok((service, temp_dir))
}

/// Reopen the database that `test_service` created in `temp_dir`
pub async fn reopen(temp_dir: &TempDir) -> Result<SqliteService> {
    Ok(SqliteService::connect(&db_path(temp_dir)).await?)
}

pub fn db_path(temp_dir: &TempDir) -> String {
    temp_dir.path().join("test.db").to_str().unwrap().to_string()
}

/// Helper to create a test service over an in-memory store
pub async fn memory_service() -> Result<MemoryService> {
    Ok(MemoryService::in_memory().await?)
}

/// Helper to parse a date string
pub fn day(date_str: &str) -> NaiveDate {
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d").unwrap()
}

pub fn form(description: &str, amount: &str, category: &str, date: &str) -> NewTransaction {
    NewTransaction {
        description: description.into(),
        amount: amount.into(),
        category: category.into(),
        date: date.into(),
    }
}

/// Test fixture: the ledger used throughout the examples
pub struct SampleLedger;

impl SampleLedger {
    /// +1000 Income, -200 Food, -50 Food, -100 Transportation
    pub async fn record<S: BlobStore>(
        service: &mut BudgetService<S>,
    ) -> Result<Vec<Transaction>> {
        let inputs = [
            form("Salary", "1000", "Income", "2024-01-01"),
            form("Groceries", "-200", "Food", "2024-01-03"),
            form("Snacks", "-50", "food", "2024-01-04"),
            form("Bus pass", "-100", "Transportation", "2024-01-05"),
        ];
        let mut recorded = Vec::new();
        for input in inputs {
            recorded.push(service.add_transaction(input).await?);
        }
        Ok(recorded)
    }
}

/// Memory store that can be told to reject writes to one key, to exercise
/// what happens when storage fails halfway through an operation.
#[derive(Clone, Default)]
pub struct FlakyStore {
    pub inner: MemoryBlobStore,
    failing_key: Arc<Mutex<Option<&'static str>>>,
}

impl FlakyStore {
    pub fn fail_writes_to(&self, key: &'static str) {
        *self.failing_key.lock().unwrap() = Some(key);
    }

    pub fn heal(&self) {
        *self.failing_key.lock().unwrap() = None;
    }
}

#[async_trait::async_trait]
impl BlobStore for FlakyStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, blob: &str) -> Result<()> {
        if *self.failing_key.lock().unwrap() == Some(key) {
            anyhow::bail!("disk full");
        }
        self.inner.set(key, blob).await
    }
}
