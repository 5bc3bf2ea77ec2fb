//! Append-only coin ledger for the Coinmine economy.
//!
//! Every coin that enters or leaves a player's balance is recorded as a
//! [`Transaction`](coinmine_types::Transaction). Entries are never modified or
//! deleted; the sum of a player's entries must equal their stored balance.
//!
//! # Architecture
//!
//! - [`transaction`] -- The [`TransactionBuilder`] for validated entry construction.
//! - [`journal`] -- The [`Journal`]: entries staged by one engine operation.
//! - [`reconcile`] -- Balance reconciliation against the ledger.
//!
//! # Sign convention
//!
//! | Type | Sign |
//! |------|------|
//! | Mining | + |
//! | DailyBonus | + |
//! | LevelReward | + |
//! | Purchase | - |
//!
//! Callers always pass a positive magnitude; the builder applies the sign
//! for the entry's category.
//!
//! # Usage
//!
//! ```
//! use chrono::Utc;
//! use coinmine_ledger::Journal;
//! use coinmine_types::UserId;
//! use rust_decimal::Decimal;
//!
//! let user = UserId::new();
//! let mut journal = Journal::new(user, Utc::now());
//! journal.record_mining(Decimal::new(10, 0)).ok();
//! journal.record_purchase(Decimal::new(4, 0), "Pickaxe").ok();
//!
//! assert_eq!(journal.net_amount().ok(), Some(Decimal::new(6, 0)));
//! ```

pub mod journal;
pub mod reconcile;
pub mod transaction;

// Re-export primary types at crate root.
pub use journal::Journal;
pub use reconcile::reconcile;
pub use transaction::TransactionBuilder;

use rust_decimal::Decimal;

use coinmine_types::{TransactionId, TransactionType};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can occur when recording or summing ledger entries.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// Amount must be strictly positive.
    #[error("ledger entry amount must be non-zero")]
    ZeroAmount,

    /// Amount magnitudes must not be negative; the sign comes from the type.
    #[error("ledger entry amount must be positive, got {amount}")]
    NegativeAmount {
        /// The invalid amount.
        amount: Decimal,
    },

    /// A required field was not set on the builder.
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// A stored entry carries the wrong sign for its type.
    #[error("entry {id} of type {kind:?} has amount {amount} with the wrong sign")]
    SignMismatch {
        /// The offending entry.
        id: TransactionId,
        /// Its category.
        kind: TransactionType,
        /// Its recorded amount.
        amount: Decimal,
    },

    /// Summing amounts overflowed the decimal range.
    #[error("ledger arithmetic overflow while {0}")]
    Overflow(&'static str),
}
