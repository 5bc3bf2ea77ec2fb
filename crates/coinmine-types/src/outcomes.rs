//! Structured results returned by the engine's operations.
//!
//! Each outcome carries a human-readable `message` for direct display plus
//! the operation-specific fields the front end renders.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::ids::{ItemId, UserId};

/// Result of applying an experience grant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct LevelOutcome {
    /// Whether at least one level was gained.
    pub leveled_up: bool,
    /// Level after the grant.
    pub new_level: u32,
    /// Cumulative experience after the grant.
    pub new_exp: u64,
    /// Coins granted for the levels reached (zero if none).
    #[ts(as = "String")]
    pub reward: Decimal,
    /// Threshold for the following level.
    pub next_level_exp: u64,
    /// Number of levels gained by this grant.
    pub levels_gained: u32,
}

/// Result of a successful mining action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct MineOutcome {
    /// Display summary.
    pub message: String,
    /// Coins credited by this action.
    #[ts(as = "String")]
    pub mined_coins: Decimal,
    /// Experience granted by this action.
    pub exp_gained: u64,
    /// Balance after mining and any level reward.
    #[ts(as = "String")]
    pub new_balance: Decimal,
    /// The leveling sub-step result.
    pub level: LevelOutcome,
}

/// Result of a successful daily bonus claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct BonusOutcome {
    /// Display summary.
    pub message: String,
    /// Coins credited by the bonus.
    #[ts(as = "String")]
    pub bonus: Decimal,
    /// Balance after the bonus and any level reward.
    #[ts(as = "String")]
    pub new_balance: Decimal,
    /// Streak after this claim.
    pub streak: u32,
    /// Whether the weekend multiplier applied.
    pub weekend: bool,
    /// The leveling sub-step result.
    pub level: LevelOutcome,
}

/// Result of a successful shop purchase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct PurchaseOutcome {
    /// Display summary.
    pub message: String,
    /// The purchased item.
    pub item_id: ItemId,
    /// Units of the item owned after the purchase.
    pub quantity: u32,
    /// Balance after the debit.
    #[ts(as = "String")]
    pub new_balance: Decimal,
    /// Mining power after the boost.
    #[ts(as = "String")]
    pub mining_power: Decimal,
}

/// Comparison of a player's stored balance with their ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ReconciliationReport {
    /// The reconciled player.
    pub user_id: UserId,
    /// Balance stored on the user row.
    #[ts(as = "String")]
    pub stored_balance: Decimal,
    /// Sum of all ledger entries for the player.
    #[ts(as = "String")]
    pub ledger_balance: Decimal,
    /// `stored_balance - ledger_balance`; zero when consistent.
    #[ts(as = "String")]
    pub drift: Decimal,
    /// Number of ledger entries summed.
    pub entries: usize,
    /// When the report was produced.
    pub checked_at: DateTime<Utc>,
}

impl ReconciliationReport {
    /// Whether the stored balance matches the ledger exactly.
    pub const fn is_consistent(&self) -> bool {
        self.drift.is_zero()
    }
}
