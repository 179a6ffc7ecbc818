use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Cents, MAX_AMOUNT_CENTS, within_amount_limit};

pub type TransactionId = Uuid;

/// A single income or expense entry in the ledger.
/// The sign of `amount_cents` is the only thing that tells income from expense.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Records persisted without an id are given a fresh one when loaded.
    #[serde(default = "Uuid::new_v4")]
    pub id: TransactionId,
    pub description: String,
    /// Positive for income, negative for expenses. Never zero.
    pub amount_cents: Cents,
    pub category: String,
    /// The calendar day the transaction is attributed to
    pub date: NaiveDate,
    /// When we recorded this transaction
    #[serde(default = "Utc::now")]
    pub recorded_at: DateTime<Utc>,
}

impl Transaction {
    pub fn new(
        description: impl Into<String>,
        amount_cents: Cents,
        category: impl Into<String>,
        date: NaiveDate,
    ) -> Result<Self, TransactionError> {
        let transaction = Self {
            id: Uuid::new_v4(),
            description: description.into(),
            amount_cents,
            category: category.into(),
            date,
            recorded_at: Utc::now(),
        };
        transaction.validate()?;
        Ok(transaction)
    }

    /// Check the record-level rules. Used for new entries and for records
    /// arriving from a snapshot.
    pub fn validate(&self) -> Result<(), TransactionError> {
        if self.description.trim().is_empty() {
            return Err(TransactionError::EmptyDescription);
        }
        if self.amount_cents == 0 {
            return Err(TransactionError::ZeroAmount);
        }
        if !within_amount_limit(self.amount_cents) {
            return Err(TransactionError::AmountOutOfRange(self.amount_cents));
        }
        Ok(())
    }

    pub fn is_income(&self) -> bool {
        self.amount_cents > 0
    }

    pub fn is_expense(&self) -> bool {
        self.amount_cents < 0
    }

    /// Absolute value of the amount.
    pub fn magnitude(&self) -> Cents {
        self.amount_cents.saturating_abs()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionError {
    EmptyDescription,
    ZeroAmount,
    AmountOutOfRange(Cents),
}

impl std::fmt::Display for TransactionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionError::EmptyDescription => write!(f, "description is empty"),
            TransactionError::ZeroAmount => write!(f, "amount must be non-zero"),
            TransactionError::AmountOutOfRange(cents) => write!(
                f,
                "amount {} exceeds the limit of {} cents",
                cents, MAX_AMOUNT_CENTS
            ),
        }
    }
}

impl std::error::Error for TransactionError {}
