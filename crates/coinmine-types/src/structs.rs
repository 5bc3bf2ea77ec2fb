//! Core entity structs for the Coinmine economy.
//!
//! These mirror the persisted rows: players, the level table, the ledger,
//! the shop catalog and item ownership. Money is always [`Decimal`].

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::TransactionType;
use crate::ids::{ItemId, TransactionId, UserId};

/// Starting mining power of a freshly registered player.
pub const STARTING_MINING_POWER: Decimal = Decimal::ONE;

/// Level of a freshly registered player.
pub const STARTING_LEVEL: u32 = 1;

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

/// A player and their economy state.
///
/// Invariants maintained by the engine:
/// - `balance >= 0`
/// - `level` never decreases
/// - `experience < next_level_exp` unless the level table has no row for
///   `level + 1` (the level cap) or a single-step level-up left a pending
///   threshold
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct User {
    /// Internal identifier.
    pub id: UserId,
    /// Stable chat-platform identity.
    pub external_id: i64,
    /// Name shown on the leaderboard.
    pub display_name: String,
    /// Coins held. Never negative.
    #[ts(as = "String")]
    pub balance: Decimal,
    /// Coins accrued per minute of mining.
    #[ts(as = "String")]
    pub mining_power: Decimal,
    /// Current level, starting at 1.
    pub level: u32,
    /// Cumulative experience.
    pub experience: u64,
    /// Cumulative experience at which the next level is reached.
    pub next_level_exp: u64,
    /// Instant of the last successful mining action.
    pub last_mining: Option<DateTime<Utc>>,
    /// Instant of the last daily bonus claim.
    pub last_bonus_at: Option<DateTime<Utc>>,
    /// Consecutive calendar days with a claimed bonus.
    pub bonus_streak: u32,
    /// Optimistic concurrency version, bumped by every committed change.
    pub version: i64,
    /// Registration timestamp.
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Build a freshly registered player with default economy values.
    pub fn new_player(
        external_id: i64,
        display_name: String,
        next_level_exp: u64,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: UserId::new(),
            external_id,
            display_name,
            balance: Decimal::ZERO,
            mining_power: STARTING_MINING_POWER,
            level: STARTING_LEVEL,
            experience: 0,
            next_level_exp,
            last_mining: None,
            last_bonus_at: None,
            bonus_streak: 0,
            version: 0,
            created_at,
        }
    }
}

// ---------------------------------------------------------------------------
// Level table
// ---------------------------------------------------------------------------

/// Static reference row for one level.
///
/// `exp_required` is the cumulative experience needed to hold `level`;
/// `reward` is granted once when the player reaches it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct LevelDefinition {
    /// Level number.
    pub level: u32,
    /// Cumulative experience required to reach this level.
    pub exp_required: u64,
    /// Coins granted on reaching this level.
    #[ts(as = "String")]
    pub reward: Decimal,
}

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

/// An immutable ledger entry for one economy-affecting event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Transaction {
    /// Unique entry identifier.
    pub id: TransactionId,
    /// The player whose balance changed.
    pub user_id: UserId,
    /// Signed amount: positive credits, negative debits.
    #[ts(as = "String")]
    pub amount: Decimal,
    /// Event category.
    #[serde(rename = "type")]
    pub kind: TransactionType,
    /// Human-readable description.
    pub description: String,
    /// When the event happened.
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Shop
// ---------------------------------------------------------------------------

/// A catalog entry in the shop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ShopItem {
    /// Unique item identifier.
    pub id: ItemId,
    /// Stable short key used by seeds and commands.
    pub slug: String,
    /// Display name.
    pub name: String,
    /// Display description.
    pub description: String,
    /// Display icon (emoji or asset key).
    pub icon: String,
    /// Price in coins. Always positive.
    #[ts(as = "String")]
    pub price: Decimal,
    /// Mining power added per unit bought.
    #[ts(as = "String")]
    pub power_boost: Decimal,
    /// Per-player ownership cap; `None` means unbounded.
    pub max_quantity: Option<u32>,
}

/// How many units of an item a player owns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct UserItem {
    /// Owner.
    pub user_id: UserId,
    /// Owned item.
    pub item_id: ItemId,
    /// Units owned, never above the item's cap.
    pub quantity: u32,
}

// ---------------------------------------------------------------------------
// Read projections
// ---------------------------------------------------------------------------

/// One row of the leaderboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct LeaderboardEntry {
    /// Player identifier.
    pub id: UserId,
    /// Display name.
    pub display_name: String,
    /// Coins held.
    #[ts(as = "String")]
    pub balance: Decimal,
    /// Mining power.
    #[ts(as = "String")]
    pub mining_power: Decimal,
    /// Level.
    pub level: u32,
}

impl From<&User> for LeaderboardEntry {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            display_name: user.display_name.clone(),
            balance: user.balance,
            mining_power: user.mining_power,
            level: user.level,
        }
    }
}

/// A player's snapshot together with everything they own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct UserProfile {
    /// Current player state.
    pub user: User,
    /// Owned items with a non-zero quantity.
    pub items: Vec<UserItem>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_player_has_default_economy() {
        let user = User::new_player(42, "miner".to_owned(), 100, Utc::now());
        assert_eq!(user.balance, Decimal::ZERO);
        assert_eq!(user.mining_power, Decimal::ONE);
        assert_eq!(user.level, 1);
        assert_eq!(user.experience, 0);
        assert_eq!(user.next_level_exp, 100);
        assert!(user.last_mining.is_none());
        assert_eq!(user.bonus_streak, 0);
    }

    #[test]
    fn transaction_kind_serializes_as_type() {
        let tx = Transaction {
            id: TransactionId::new(),
            user_id: UserId::new(),
            amount: Decimal::new(-50, 0),
            kind: TransactionType::Purchase,
            description: "Bought pickaxe".to_owned(),
            created_at: Utc::now(),
        };
        let value = serde_json::to_value(&tx).ok();
        let kind = value.as_ref().and_then(|v| v.get("type")).cloned();
        assert_eq!(kind, Some(serde_json::json!("purchase")));
    }
}
