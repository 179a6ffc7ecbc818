mod blob_store;

pub use blob_store::*;

/// SQL migration for the key/value blob table
pub const MIGRATION_001_INITIAL: &str = include_str!("migrations/001_initial.sql");

/// Storage key holding the serialized transaction list
pub const TRANSACTIONS_KEY: &str = "transactions";

/// Storage key holding the serialized category names
pub const CATEGORIES_KEY: &str = "categories";

/// Storage key holding the serialized savings goals
pub const GOALS_KEY: &str = "goals";
