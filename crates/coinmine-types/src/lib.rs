//! Shared type definitions for the Coinmine economy engine.
//!
//! This crate is the single source of truth for the types exchanged between
//! the engine, the store and the front ends. Types flow to `TypeScript` via
//! `ts-rs` for the chat mini-app.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers for users, items and ledger entries
//! - [`enums`] -- Ledger categories and error classification
//! - [`structs`] -- Persisted entities and read projections
//! - [`outcomes`] -- Structured results of engine operations

pub mod enums;
pub mod ids;
pub mod outcomes;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{ErrorKind, TransactionType};
pub use ids::{ItemId, TransactionId, UserId};
pub use outcomes::{BonusOutcome, LevelOutcome, MineOutcome, PurchaseOutcome, ReconciliationReport};
pub use structs::{
    LeaderboardEntry, LevelDefinition, STARTING_LEVEL, STARTING_MINING_POWER, ShopItem,
    Transaction, User, UserItem, UserProfile,
};
