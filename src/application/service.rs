use anyhow::Context;
use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::domain::{
    CategorySet, Cents, FALLBACK_CATEGORY, Goal, GoalId, GoalProgress, LedgerSummary,
    ParseCentsError, Transaction, TransactionId, parse_cents, reassign_category,
};
use crate::storage::{
    BlobStore, CATEGORIES_KEY, GOALS_KEY, MemoryBlobStore, SqliteBlobStore, TRANSACTIONS_KEY,
    load_json, save_json,
};

use super::{AppError, BudgetReport, ExpenseChart};

/// Application service owning the ledger, the category set and the savings goals.
/// This is the primary interface for any client (CLI, API, TUI, etc.).
///
/// State is loaded from the blob store once at construction. Every mutation
/// writes the whole affected collection back before the in-memory copy is
/// updated, so a failed write leaves both sides as they were. Mutations that
/// touch several collections put back the blobs already written when a
/// later write fails.
pub struct BudgetService<S: BlobStore> {
    store: S,
    transactions: Vec<Transaction>,
    categories: CategorySet,
    goals: Vec<Goal>,
}

/// Raw form input for a new transaction, exactly as the user typed it.
#[derive(Debug, Clone, Default)]
pub struct NewTransaction {
    pub description: String,
    pub amount: String,
    pub category: String,
    /// YYYY-MM-DD
    pub date: String,
}

/// Raw form input for a new savings goal.
#[derive(Debug, Clone, Default)]
pub struct NewGoal {
    pub name: String,
    pub target_amount: String,
    /// YYYY-MM-DD
    pub target_date: String,
    /// Defaults to zero when absent or blank
    pub initial_amount: Option<String>,
}

/// Result of deleting a category
pub struct CategoryDeletion {
    pub category: String,
    pub reassigned: usize,
}

/// A goal together with its progress figures
pub struct GoalStatus {
    pub goal: Goal,
    pub progress: GoalProgress,
}

impl BudgetService<SqliteBlobStore> {
    /// Initialize a new database at the given path and load it.
    pub async fn init(database_path: &str) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}?mode=rwc", database_path);
        let store = SqliteBlobStore::init(&db_url).await?;
        Self::load(store).await
    }

    /// Connect to an existing database.
    pub async fn connect(database_path: &str) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}", database_path);
        let store = SqliteBlobStore::connect(&db_url).await?;
        Self::load(store).await
    }
}

impl BudgetService<MemoryBlobStore> {
    /// A service over a fresh, empty in-memory store.
    pub async fn in_memory() -> Result<Self, AppError> {
        Self::load(MemoryBlobStore::new()).await
    }
}

impl<S: BlobStore> BudgetService<S> {
    /// Build the service from whatever is persisted in `store`.
    /// Keys that were never written are treated as empty collections
    /// (or the default category set).
    pub async fn load(store: S) -> Result<Self, AppError> {
        let mut transactions: Vec<Transaction> = load_json(&store, TRANSACTIONS_KEY)
            .await?
            .unwrap_or_default();

        let categories = match load_json::<Vec<String>, _>(&store, CATEGORIES_KEY).await? {
            Some(names) => {
                let (set, repaired) = CategorySet::from_names(names);
                if repaired {
                    warn!("Stored category list was repaired on load");
                }
                set
            }
            None => CategorySet::default(),
        };

        let moved = canonicalize_categories(&categories, &mut transactions);
        if moved > 0 {
            warn!(moved, "Stored transactions referenced unknown categories");
        }

        let goals: Vec<Goal> = load_json(&store, GOALS_KEY).await?.unwrap_or_default();

        debug!(
            transactions = transactions.len(),
            categories = categories.len(),
            goals = goals.len(),
            "loaded budget state"
        );

        Ok(Self {
            store,
            transactions,
            categories,
            goals,
        })
    }

    /// The underlying blob store.
    pub fn store(&self) -> &S {
        &self.store
    }

    // ========================
    // Transaction operations
    // ========================

    /// All transactions in insertion order.
    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn find_transaction(&self, id: TransactionId) -> Option<&Transaction> {
        self.transactions.iter().find(|t| t.id == id)
    }

    /// Check form input and build the transaction it describes, without storing it.
    pub fn validate_transaction(&self, input: &NewTransaction) -> Result<Transaction, AppError> {
        let description = required(&input.description, "description")?;
        let amount_cents = parse_amount(required(&input.amount, "amount")?)?;
        if amount_cents == 0 {
            return Err(AppError::InvalidAmount(
                "Amount must be non-zero".to_string(),
            ));
        }

        let category = required(&input.category, "category")?;
        let category = self
            .categories
            .resolve(category)
            .ok_or_else(|| AppError::UnknownCategory(category.to_string()))?;

        let date = parse_date(required(&input.date, "date")?)?;

        Ok(Transaction::new(description, amount_cents, category, date)?)
    }

    /// Validate and record a new transaction.
    pub async fn add_transaction(&mut self, input: NewTransaction) -> Result<Transaction, AppError> {
        let transaction = self.validate_transaction(&input)?;

        let mut next = self.transactions.clone();
        next.push(transaction.clone());
        save_json(&self.store, TRANSACTIONS_KEY, &next).await?;
        self.transactions = next;

        info!(
            id = %transaction.id,
            amount = transaction.amount_cents,
            category = %transaction.category,
            "recorded transaction"
        );
        Ok(transaction)
    }

    /// Remove the transaction with `id`. Returns `false` (and writes nothing)
    /// when no such transaction exists.
    pub async fn remove_transaction(&mut self, id: TransactionId) -> Result<bool, AppError> {
        if self.find_transaction(id).is_none() {
            debug!(%id, "remove: no such transaction");
            return Ok(false);
        }

        let next: Vec<Transaction> = self
            .transactions
            .iter()
            .filter(|t| t.id != id)
            .cloned()
            .collect();
        save_json(&self.store, TRANSACTIONS_KEY, &next).await?;
        self.transactions = next;

        info!(%id, "removed transaction");
        Ok(true)
    }

    /// Balance, income, expense and category breakdown for the current ledger.
    pub fn summary(&self) -> LedgerSummary {
        LedgerSummary::compute(&self.transactions)
    }

    /// Bar-chart data for expenses by category, or `None` with no expenses.
    pub fn expense_chart(&self) -> Option<ExpenseChart> {
        ExpenseChart::from_breakdown(&self.summary().categories)
    }

    /// Full budget report as of `generated_on`.
    pub fn report(&self, generated_on: NaiveDate) -> BudgetReport {
        BudgetReport::build(&self.transactions, generated_on)
    }

    // ========================
    // Category operations
    // ========================

    pub fn categories(&self) -> &CategorySet {
        &self.categories
    }

    /// Add a category and return its stored name.
    pub async fn add_category(&mut self, name: &str) -> Result<String, AppError> {
        let name = required(name, "category name")?;

        let mut next = self.categories.clone();
        next.insert(name)?;
        save_json(&self.store, CATEGORIES_KEY, &next).await?;
        self.categories = next;

        info!(category = name, "added category");
        Ok(name.to_string())
    }

    /// Delete a category and move its transactions to the fallback category.
    pub async fn delete_category(&mut self, name: &str) -> Result<CategoryDeletion, AppError> {
        let mut next_categories = self.categories.clone();
        let removed = next_categories.remove(name)?;

        let mut next_transactions = self.transactions.clone();
        let reassigned = reassign_category(&mut next_transactions, &removed, FALLBACK_CATEGORY);

        let mut staged = vec![stage(CATEGORIES_KEY, &next_categories)?];
        if reassigned > 0 {
            staged.push(stage(TRANSACTIONS_KEY, &next_transactions)?);
        }
        self.write_staged(&staged).await?;
        self.categories = next_categories;
        self.transactions = next_transactions;

        info!(category = %removed, reassigned, "deleted category");
        Ok(CategoryDeletion {
            category: removed,
            reassigned,
        })
    }

    // ========================
    // Goal operations
    // ========================

    pub fn goals(&self) -> &[Goal] {
        &self.goals
    }

    pub fn get_goal(&self, id: GoalId) -> Result<&Goal, AppError> {
        self.goals
            .iter()
            .find(|g| g.id == id)
            .ok_or(AppError::GoalNotFound(id))
    }

    /// Validate and store a new savings goal.
    pub async fn add_goal(&mut self, input: NewGoal) -> Result<Goal, AppError> {
        let name = required(&input.name, "goal name")?;
        let target_cents = parse_amount(required(&input.target_amount, "target amount")?)?;
        if target_cents <= 0 {
            return Err(AppError::InvalidAmount(
                "Target amount must be positive".to_string(),
            ));
        }
        let target_date = parse_date(required(&input.target_date, "target date")?)?;
        let initial_cents = match input.initial_amount.as_deref().map(str::trim) {
            Some(s) if !s.is_empty() => parse_amount(s)?,
            _ => 0,
        };
        if initial_cents < 0 {
            return Err(AppError::InvalidAmount(
                "Initial amount cannot be negative".to_string(),
            ));
        }

        let goal = Goal::new(name, target_cents, target_date, initial_cents)?;

        let mut next = self.goals.clone();
        next.push(goal.clone());
        save_json(&self.store, GOALS_KEY, &next).await?;
        self.goals = next;

        info!(id = %goal.id, name = %goal.name, "added goal");
        Ok(goal)
    }

    pub async fn delete_goal(&mut self, id: GoalId) -> Result<Goal, AppError> {
        let goal = self.get_goal(id)?.clone();

        let next: Vec<Goal> = self.goals.iter().filter(|g| g.id != id).cloned().collect();
        save_json(&self.store, GOALS_KEY, &next).await?;
        self.goals = next;

        info!(%id, "deleted goal");
        Ok(goal)
    }

    /// Overwrite the amount saved so far.
    pub async fn set_goal_amount(&mut self, id: GoalId, amount: &str) -> Result<Goal, AppError> {
        let amount_cents = parse_amount(required(amount, "amount")?)?;
        if amount_cents < 0 {
            return Err(AppError::InvalidAmount(
                "Saved amount cannot be negative".to_string(),
            ));
        }
        self.update_goal(id, |goal| {
            goal.current_cents = amount_cents;
            Ok(())
        })
        .await
    }

    /// Add a positive contribution to a goal.
    pub async fn contribute_to_goal(&mut self, id: GoalId, amount: &str) -> Result<Goal, AppError> {
        let amount_cents = parse_amount(required(amount, "amount")?)?;
        if amount_cents <= 0 {
            return Err(AppError::InvalidAmount(
                "Contribution must be positive".to_string(),
            ));
        }
        self.update_goal(id, |goal| Ok(goal.contribute(amount_cents)?))
            .await
    }

    /// Every goal with its progress as of `today`.
    pub fn goal_statuses(&self, today: NaiveDate) -> Vec<GoalStatus> {
        self.goals
            .iter()
            .map(|goal| GoalStatus {
                goal: goal.clone(),
                progress: goal.progress(today),
            })
            .collect()
    }

    async fn update_goal(
        &mut self,
        id: GoalId,
        apply: impl FnOnce(&mut Goal) -> Result<(), AppError>,
    ) -> Result<Goal, AppError> {
        let mut next = self.goals.clone();
        let goal = next
            .iter_mut()
            .find(|g| g.id == id)
            .ok_or(AppError::GoalNotFound(id))?;
        apply(goal)?;
        let updated = goal.clone();

        save_json(&self.store, GOALS_KEY, &next).await?;
        self.goals = next;

        info!(%id, current = updated.current_cents, "updated goal");
        Ok(updated)
    }

    // ========================
    // Bulk operations
    // ========================

    /// Replace every collection at once (used by snapshot import).
    /// Every record is validated before anything is written. Transactions
    /// pointing at categories missing from `category_names` are moved to the
    /// fallback category; the number moved is returned.
    pub async fn restore(
        &mut self,
        mut transactions: Vec<Transaction>,
        category_names: Vec<String>,
        goals: Vec<Goal>,
    ) -> Result<usize, AppError> {
        for transaction in &transactions {
            transaction.validate()?;
        }
        for goal in &goals {
            goal.validate()?;
        }

        let (categories, _) = CategorySet::from_names(category_names);
        let reassigned = canonicalize_categories(&categories, &mut transactions);

        let staged = [
            stage(TRANSACTIONS_KEY, &transactions)?,
            stage(CATEGORIES_KEY, &categories)?,
            stage(GOALS_KEY, &goals)?,
        ];
        self.write_staged(&staged).await?;

        info!(
            transactions = transactions.len(),
            categories = categories.len(),
            goals = goals.len(),
            reassigned,
            "restored budget state"
        );

        self.transactions = transactions;
        self.categories = categories;
        self.goals = goals;
        Ok(reassigned)
    }

    /// Write the staged blobs in order. If a write fails, the keys already
    /// written are put back to the committed in-memory state.
    async fn write_staged(&self, staged: &[Staged]) -> Result<(), AppError> {
        for (written, entry) in staged.iter().enumerate() {
            if let Err(err) = self.store.set(entry.key, &entry.blob).await {
                for done in &staged[..written] {
                    self.rewrite_committed(done.key).await;
                }
                return Err(err.into());
            }
        }
        Ok(())
    }

    async fn rewrite_committed(&self, key: &'static str) {
        let result = match key {
            TRANSACTIONS_KEY => save_json(&self.store, key, &self.transactions).await,
            CATEGORIES_KEY => save_json(&self.store, key, &self.categories).await,
            _ => save_json(&self.store, key, &self.goals).await,
        };
        if let Err(err) = result {
            warn!(key, error = %err, "Could not roll back blob after a failed write");
        }
    }
}

/// A serialized collection waiting to be written under `key`.
struct Staged {
    key: &'static str,
    blob: String,
}

fn stage<T: Serialize + ?Sized>(key: &'static str, value: &T) -> Result<Staged, AppError> {
    let blob = serde_json::to_string(value)
        .with_context(|| format!("Failed to serialize data for '{}'", key))?;
    Ok(Staged { key, blob })
}

/// Rewrite each transaction's category to its stored spelling in
/// `categories`, moving unknown ones to the fallback. Returns how many moved.
fn canonicalize_categories(categories: &CategorySet, transactions: &mut [Transaction]) -> usize {
    let mut moved = 0;
    for transaction in transactions {
        match categories.resolve(&transaction.category) {
            Some(name) => {
                if transaction.category != name {
                    transaction.category = name.to_string();
                }
            }
            None => {
                transaction.category = FALLBACK_CATEGORY.to_string();
                moved += 1;
            }
        }
    }
    moved
}

fn required<'a>(value: &'a str, field: &'static str) -> Result<&'a str, AppError> {
    let value = value.trim();
    if value.is_empty() {
        Err(AppError::MissingField(field))
    } else {
        Ok(value)
    }
}

fn parse_amount(input: &str) -> Result<Cents, AppError> {
    parse_cents(input).map_err(|e: ParseCentsError| {
        AppError::InvalidAmount(format!("'{}' ({}). Use '50.00' or '-50'", input, e))
    })
}

/// Parse a YYYY-MM-DD date.
pub fn parse_date(input: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d")
        .map_err(|_| AppError::InvalidDate(input.to_string()))
}
