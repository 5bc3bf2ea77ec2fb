//! Error types for the economy engine.
//!
//! [`EconomyError`] is the single failure type of every engine operation.
//! Its variants fall into three classes, reported by [`EconomyError::kind`]:
//!
//! - **Game rules** (`CooldownNotElapsed`, `AlreadyClaimed`,
//!   `InsufficientFunds`, `MaxQuantityReached`): expected outcomes whose
//!   message is shown to the player as-is.
//! - **Caller misuse** (`UserNotFound`, `ItemNotFound`, `InvalidArgument`).
//! - **Operational** (`PersistenceFailure`): nothing was committed, so the
//!   caller may retry.
//!
//! [`StoreError`] is the persistence interface's own error type.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use coinmine_ledger::LedgerError;
use coinmine_types::{ErrorKind, ItemId, UserId};

/// Errors reported by a [`LedgerStore`](crate::store::LedgerStore).
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The user row changed since it was read; nothing was written.
    #[error("user {0} was modified concurrently")]
    Conflict(UserId),

    /// The user row does not exist.
    #[error("user {0} does not exist")]
    UserMissing(UserId),

    /// Granting one more unit would exceed the item's ownership cap.
    #[error("item {0} is already at its ownership cap")]
    ItemCapReached(ItemId),

    /// A stored constraint (such as a non-negative balance) would be violated.
    #[error("constraint violated: {0}")]
    Constraint(String),

    /// The backend failed (connection, query, decoding).
    #[error("store backend error: {0}")]
    Backend(String),
}

impl StoreError {
    /// Whether re-reading and re-evaluating may succeed.
    pub const fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_) | Self::ItemCapReached(_))
    }
}

/// Errors returned by engine operations.
#[derive(Debug, thiserror::Error)]
pub enum EconomyError {
    /// The referenced user does not exist.
    #[error("user {0} not found")]
    UserNotFound(UserId),

    /// The referenced shop item does not exist.
    #[error("item {0} not found")]
    ItemNotFound(ItemId),

    /// Mining was attempted before the cooldown elapsed.
    #[error("Your drill is cooling down, try again in {remaining_secs}s")]
    CooldownNotElapsed {
        /// Whole seconds until mining is allowed again.
        remaining_secs: u64,
    },

    /// The daily bonus was already claimed in the current calendar day.
    #[error("Daily bonus already claimed today, come back after {next_claim_at}")]
    AlreadyClaimed {
        /// The instant the next claim window opens.
        next_claim_at: DateTime<Utc>,
    },

    /// The balance does not cover the price.
    #[error("Not enough coins: you have {balance}, the item costs {price}")]
    InsufficientFunds {
        /// Balance at the time of the attempt.
        balance: Decimal,
        /// Price of the item.
        price: Decimal,
    },

    /// The player already owns as many units as the item allows.
    #[error("You already own the maximum of {max_quantity} of this item")]
    MaxQuantityReached {
        /// The capped item.
        item_id: ItemId,
        /// Its per-player cap.
        max_quantity: u32,
    },

    /// The store failed; no partial state was committed.
    #[error("persistence failure: {0}")]
    PersistenceFailure(#[source] StoreError),

    /// The caller supplied an invalid argument.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A ledger entry could not be built.
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    /// Checked arithmetic overflowed.
    #[error("arithmetic overflow while {0}")]
    Overflow(&'static str),
}

impl EconomyError {
    /// The serializable classification of this error.
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::UserNotFound(_) => ErrorKind::UserNotFound,
            Self::ItemNotFound(_) => ErrorKind::ItemNotFound,
            Self::CooldownNotElapsed { .. } => ErrorKind::CooldownNotElapsed,
            Self::AlreadyClaimed { .. } => ErrorKind::AlreadyClaimed,
            Self::InsufficientFunds { .. } => ErrorKind::InsufficientFunds,
            Self::MaxQuantityReached { .. } => ErrorKind::MaxQuantityReached,
            Self::PersistenceFailure(_) => ErrorKind::PersistenceFailure,
            Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Self::Ledger(_) | Self::Overflow(_) => ErrorKind::Internal,
        }
    }

    /// Whether this is an expected game-rule outcome.
    pub const fn is_business_rule(&self) -> bool {
        self.kind().is_business_rule()
    }

    /// Whether the caller may retry the same request unchanged.
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::PersistenceFailure(_))
    }
}

impl From<StoreError> for EconomyError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UserMissing(id) => Self::UserNotFound(id),
            other => Self::PersistenceFailure(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn game_rule_errors_are_not_retryable() {
        let err = EconomyError::CooldownNotElapsed { remaining_secs: 30 };
        assert!(err.is_business_rule());
        assert!(!err.is_retryable());
        assert_eq!(err.to_string(), "Your drill is cooling down, try again in 30s");
    }

    #[test]
    fn persistence_failure_is_retryable() {
        let err = EconomyError::from(StoreError::Backend("connection reset".to_owned()));
        assert_eq!(err.kind(), ErrorKind::PersistenceFailure);
        assert!(err.is_retryable());
        assert!(!err.is_business_rule());
    }

    #[test]
    fn missing_user_maps_to_not_found() {
        let id = UserId::new();
        let err = EconomyError::from(StoreError::UserMissing(id));
        assert!(matches!(err, EconomyError::UserNotFound(found) if found == id));
    }

    #[test]
    fn internal_errors_classified() {
        assert_eq!(EconomyError::Overflow("adding").kind(), ErrorKind::Internal);
        assert_eq!(
            EconomyError::from(LedgerError::ZeroAmount).kind(),
            ErrorKind::Internal
        );
    }
}
