//! Enumeration types for the Coinmine economy.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Ledger entry categories
// ---------------------------------------------------------------------------

/// The category of an economy-affecting event recorded in the ledger.
///
/// The sign of the recorded amount is fixed by the category: every category
/// credits the player except [`TransactionType::Purchase`], which debits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum TransactionType {
    /// Coins accrued by a successful mining action.
    Mining,
    /// Coins granted by a daily bonus claim.
    DailyBonus,
    /// Coins granted on reaching a new level.
    LevelReward,
    /// Coins spent in the shop (negative amount).
    Purchase,
}

impl TransactionType {
    /// Every category, in declaration order.
    pub const ALL: [Self; 4] = [
        Self::Mining,
        Self::DailyBonus,
        Self::LevelReward,
        Self::Purchase,
    ];

    /// Whether entries of this category add coins to the balance.
    pub const fn is_credit(self) -> bool {
        !matches!(self, Self::Purchase)
    }
}

// ---------------------------------------------------------------------------
// Error classification
// ---------------------------------------------------------------------------

/// Serializable classification of an engine failure.
///
/// The transport layer switches on this value to decide how a failure is
/// shown; the engine's own error type maps onto it one-to-one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum ErrorKind {
    /// The referenced user does not exist.
    UserNotFound,
    /// The referenced shop item does not exist.
    ItemNotFound,
    /// Mining was attempted before the cooldown elapsed.
    CooldownNotElapsed,
    /// The daily bonus was already claimed in the current calendar day.
    AlreadyClaimed,
    /// The balance does not cover the item price.
    InsufficientFunds,
    /// The player already owns the maximum quantity of the item.
    MaxQuantityReached,
    /// The store failed to read or commit; safe to retry.
    PersistenceFailure,
    /// The caller supplied an invalid argument.
    InvalidArgument,
    /// An internal invariant was violated.
    Internal,
}

impl ErrorKind {
    /// Whether this kind is an expected game-rule outcome rather than a
    /// defect or misuse.
    pub const fn is_business_rule(self) -> bool {
        matches!(
            self,
            Self::CooldownNotElapsed
                | Self::AlreadyClaimed
                | Self::InsufficientFunds
                | Self::MaxQuantityReached
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_purchase_debits() {
        let debits: Vec<_> = TransactionType::ALL
            .into_iter()
            .filter(|t| !t.is_credit())
            .collect();
        assert_eq!(debits, vec![TransactionType::Purchase]);
    }

    #[test]
    fn transaction_type_serializes_snake_case() {
        let json = serde_json::to_string(&TransactionType::DailyBonus).ok();
        assert_eq!(json.as_deref(), Some("\"daily_bonus\""));
    }

    #[test]
    fn business_rule_kinds() {
        assert!(ErrorKind::AlreadyClaimed.is_business_rule());
        assert!(ErrorKind::InsufficientFunds.is_business_rule());
        assert!(!ErrorKind::UserNotFound.is_business_rule());
        assert!(!ErrorKind::PersistenceFailure.is_business_rule());
    }
}
