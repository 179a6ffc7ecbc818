use thiserror::Error;

use crate::domain::{CategoryError, FALLBACK_CATEGORY, GoalError, GoalId, TransactionError};

#[derive(Error, Debug)]
pub enum AppError {
    // Validation: the write is blocked and nothing is stored.
    #[error("Please fill in the {0} field")]
    MissingField(&'static str),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Invalid date '{0}'. Use YYYY-MM-DD")]
    InvalidDate(String),

    #[error("Unknown category: {0}")]
    UnknownCategory(String),

    #[error("This category already exists: {0}")]
    CategoryExists(String),

    // Referential: the collections are left unchanged.
    #[error("You must have at least one category")]
    LastCategory,

    #[error("You can not delete the {name} category", name = FALLBACK_CATEGORY)]
    FallbackCategory,

    #[error("Category not found: {0}")]
    CategoryNotFound(String),

    #[error("Goal not found: {0}")]
    GoalNotFound(GoalId),

    #[error("Storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

impl From<CategoryError> for AppError {
    fn from(err: CategoryError) -> Self {
        match err {
            CategoryError::AlreadyExists(name) => AppError::CategoryExists(name),
            CategoryError::NotFound(name) => AppError::CategoryNotFound(name),
            CategoryError::LastCategory => AppError::LastCategory,
            CategoryError::Fallback => AppError::FallbackCategory,
        }
    }
}

impl From<TransactionError> for AppError {
    fn from(err: TransactionError) -> Self {
        match err {
            TransactionError::EmptyDescription => AppError::MissingField("description"),
            other => AppError::InvalidAmount(other.to_string()),
        }
    }
}

impl From<GoalError> for AppError {
    fn from(err: GoalError) -> Self {
        match err {
            GoalError::EmptyName => AppError::MissingField("goal name"),
            other => AppError::InvalidAmount(other.to_string()),
        }
    }
}

impl AppError {
    /// True for errors caused by user input rather than storage.
    pub fn is_user_error(&self) -> bool {
        !matches!(self, AppError::Storage(_))
    }
}
