//! `PostgreSQL` data layer for the Coinmine economy engine.
//!
//! [`PgLedgerStore`] implements the engine's
//! [`LedgerStore`](coinmine_economy::LedgerStore) on top of the table stores
//! below. Each engine operation becomes one database transaction.
//!
//! # Modules
//!
//! - [`postgres`] -- Connection pool, configuration and migrations
//! - [`user_store`] -- Player rows with version-guarded updates
//! - [`transaction_store`] -- Batch ledger inserts and history queries
//! - [`catalog_store`] -- Levels, shop items and item ownership
//! - [`pg_store`] -- The [`LedgerStore`](coinmine_economy::LedgerStore) implementation
//! - [`error`] -- Shared error types

pub mod catalog_store;
pub mod error;
pub mod pg_store;
pub mod postgres;
pub mod transaction_store;
pub mod user_store;

// Re-export primary types for convenience.
pub use catalog_store::{CatalogStore, LevelRow, ShopItemRow};
pub use error::DbError;
pub use pg_store::PgLedgerStore;
pub use postgres::{PostgresConfig, PostgresPool};
pub use transaction_store::{TransactionRow, TransactionStore};
pub use user_store::{UserRow, UserStore};
