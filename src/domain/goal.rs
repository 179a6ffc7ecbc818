use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Cents, MAX_AMOUNT_CENTS, within_amount_limit};

pub type GoalId = Uuid;

/// A savings goal: save `target_cents` by `target_date`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Goal {
    pub id: GoalId,
    pub name: String,
    pub target_cents: Cents,
    pub target_date: NaiveDate,
    /// Amount saved so far
    pub current_cents: Cents,
    pub created_at: DateTime<Utc>,
}

/// Derived progress figures for a goal at a given day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GoalProgress {
    pub percent_complete: f64,
    pub remaining: Cents,
    /// Whole days until the target date; zero or negative once it has passed
    pub days_left: i64,
    /// Amount to save per day to hit the target, `None` once the date has passed
    pub daily_needed: Option<Cents>,
}

impl Goal {
    pub fn new(
        name: impl Into<String>,
        target_cents: Cents,
        target_date: NaiveDate,
        initial_cents: Cents,
    ) -> Result<Self, GoalError> {
        let goal = Self {
            id: Uuid::new_v4(),
            name: name.into(),
            target_cents,
            target_date,
            current_cents: initial_cents,
            created_at: Utc::now(),
        };
        goal.validate()?;
        Ok(goal)
    }

    /// Check the record-level rules: a name, a positive target and a saved
    /// amount that is not negative, both amounts within the amount limit.
    pub fn validate(&self) -> Result<(), GoalError> {
        if self.name.trim().is_empty() {
            return Err(GoalError::EmptyName);
        }
        if self.target_cents <= 0 {
            return Err(GoalError::NonPositiveTarget);
        }
        if self.current_cents < 0 {
            return Err(GoalError::NegativeSaved);
        }
        for cents in [self.target_cents, self.current_cents] {
            if !within_amount_limit(cents) {
                return Err(GoalError::AmountOutOfRange(cents));
            }
        }
        Ok(())
    }

    /// Add `amount_cents` to the saved amount. The goal is left unchanged
    /// when the result would fall outside the amount limit.
    pub fn contribute(&mut self, amount_cents: Cents) -> Result<(), GoalError> {
        let total = self
            .current_cents
            .checked_add(amount_cents)
            .filter(|c| within_amount_limit(*c))
            .ok_or(GoalError::AmountOutOfRange(amount_cents))?;
        if total < 0 {
            return Err(GoalError::NegativeSaved);
        }
        self.current_cents = total;
        Ok(())
    }

    pub fn is_reached(&self) -> bool {
        self.current_cents >= self.target_cents
    }

    pub fn progress(&self, today: NaiveDate) -> GoalProgress {
        let remaining = self.target_cents.saturating_sub(self.current_cents);
        let days_left = (self.target_date - today).num_days();
        let daily_needed = if days_left > 0 {
            // Round up so saving the daily amount always reaches the target
            Some(remaining.max(0).saturating_add(days_left - 1) / days_left)
        } else {
            None
        };

        let percent_complete = if self.target_cents > 0 {
            self.current_cents as f64 / self.target_cents as f64 * 100.0
        } else {
            0.0
        };

        GoalProgress {
            percent_complete,
            remaining,
            days_left,
            daily_needed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GoalError {
    EmptyName,
    NonPositiveTarget,
    NegativeSaved,
    AmountOutOfRange(Cents),
}

impl std::fmt::Display for GoalError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GoalError::EmptyName => write!(f, "goal name is empty"),
            GoalError::NonPositiveTarget => write!(f, "target amount must be positive"),
            GoalError::NegativeSaved => write!(f, "saved amount cannot be negative"),
            GoalError::AmountOutOfRange(cents) => write!(
                f,
                "amount {} exceeds the limit of {} cents",
                cents, MAX_AMOUNT_CENTS
            ),
        }
    }
}

impl std::error::Error for GoalError {}
