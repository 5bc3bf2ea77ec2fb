//! The persistence interface the engine depends on.
//!
//! Components never talk to a concrete database. They read snapshots through
//! [`LedgerStore`] and hand back a single [`UserChange`] per operation, which
//! the store commits atomically: the user row, the optional inventory grant
//! and every ledger entry land together or not at all.
//!
//! # Concurrency
//!
//! Every user row carries a `version`. [`LedgerStore::commit`] succeeds only
//! when the stored version still equals [`UserChange::expected_version`] and
//! bumps it on success. Two requests racing on the same user therefore cannot
//! both commit against the same snapshot; the loser gets
//! [`StoreError::Conflict`] and the engine re-evaluates against fresh state.

use std::collections::BTreeMap;
use std::future::Future;

use coinmine_ledger::Journal;
use coinmine_types::{
    ItemId, LeaderboardEntry, LevelDefinition, ShopItem, Transaction, User, UserId, UserItem,
};

use crate::error::StoreError;

// ---------------------------------------------------------------------------
// Level table
// ---------------------------------------------------------------------------

/// The level reference table, keyed by level number.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LevelTable {
    levels: BTreeMap<u32, LevelDefinition>,
}

impl LevelTable {
    /// Build a table from reference rows. Later duplicates win.
    pub fn new(definitions: impl IntoIterator<Item = LevelDefinition>) -> Self {
        Self {
            levels: definitions.into_iter().map(|d| (d.level, d)).collect(),
        }
    }

    /// Look up the row for `level`.
    pub fn get(&self, level: u32) -> Option<&LevelDefinition> {
        self.levels.get(&level)
    }
}

// ---------------------------------------------------------------------------
// Unit of work
// ---------------------------------------------------------------------------

/// One more unit of an item granted to the changed user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemGrant {
    /// The item granted.
    pub item_id: ItemId,
    /// The item's ownership cap, enforced again by the store.
    pub max_quantity: Option<u32>,
}

/// Everything one operation writes, committed as a single unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserChange {
    /// Version of the snapshot the change was computed from.
    pub expected_version: i64,
    /// The user's next state. Its `version` field is ignored; the store bumps
    /// the stored version.
    pub user: User,
    /// Inventory increment, for purchases.
    pub item_grant: Option<ItemGrant>,
    /// Ledger entries to append.
    pub transactions: Vec<Transaction>,
}

impl UserChange {
    /// Build a change from the snapshot it was computed against.
    pub fn new(previous: &User, next: User, journal: Journal) -> Self {
        Self {
            expected_version: previous.version,
            user: next,
            item_grant: None,
            transactions: journal.into_entries(),
        }
    }

    /// Attach an inventory grant.
    #[must_use]
    pub const fn with_item_grant(mut self, grant: ItemGrant) -> Self {
        self.item_grant = Some(grant);
        self
    }
}

// ---------------------------------------------------------------------------
// Store interface
// ---------------------------------------------------------------------------

/// Durable record of users, ledger entries, ownership and reference data.
///
/// Implementations must make [`commit`](LedgerStore::commit) atomic and
/// version-guarded; everything else is a plain read.
pub trait LedgerStore: Send + Sync {
    /// Return the user with `external_id`, creating it from `candidate` when
    /// absent. This is the registration collaborator; engine operations never
    /// call it.
    fn register_user(
        &self,
        candidate: User,
    ) -> impl Future<Output = Result<User, StoreError>> + Send;

    /// Read a user snapshot.
    fn fetch_user(
        &self,
        id: UserId,
    ) -> impl Future<Output = Result<Option<User>, StoreError>> + Send;

    /// Read a user snapshot by chat-platform identity.
    fn fetch_user_by_external_id(
        &self,
        external_id: i64,
    ) -> impl Future<Output = Result<Option<User>, StoreError>> + Send;

    /// Read the full level table.
    fn level_table(&self) -> impl Future<Output = Result<LevelTable, StoreError>> + Send;

    /// Read one catalog entry.
    fn fetch_item(
        &self,
        id: ItemId,
    ) -> impl Future<Output = Result<Option<ShopItem>, StoreError>> + Send;

    /// Read the whole catalog, cheapest first.
    fn catalog(&self) -> impl Future<Output = Result<Vec<ShopItem>, StoreError>> + Send;

    /// Units of `item` owned by `user` (zero when none).
    fn owned_quantity(
        &self,
        user: UserId,
        item: ItemId,
    ) -> impl Future<Output = Result<u32, StoreError>> + Send;

    /// Everything `user` owns.
    fn inventory(
        &self,
        user: UserId,
    ) -> impl Future<Output = Result<Vec<UserItem>, StoreError>> + Send;

    /// Atomically apply `change` if the user's version still matches.
    ///
    /// Errors: [`StoreError::Conflict`] on a version mismatch,
    /// [`StoreError::UserMissing`] if the row is gone,
    /// [`StoreError::ItemCapReached`] if the grant would exceed the cap.
    fn commit(&self, change: &UserChange) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Top players by balance, descending, ties by id ascending.
    fn top_players(
        &self,
        limit: u32,
    ) -> impl Future<Output = Result<Vec<LeaderboardEntry>, StoreError>> + Send;

    /// Ledger entries of `user`, newest first; `None` returns all of them.
    fn transactions(
        &self,
        user: UserId,
        limit: Option<u32>,
    ) -> impl Future<Output = Result<Vec<Transaction>, StoreError>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn def(level: u32, exp_required: u64) -> LevelDefinition {
        LevelDefinition {
            level,
            exp_required,
            reward: Decimal::ZERO,
        }
    }

    #[test]
    fn level_table_lookup() {
        let table = LevelTable::new([def(1, 0), def(3, 250), def(2, 100), def(2, 120)]);
        assert_eq!(table.get(2).map(|d| d.exp_required), Some(120));
        assert_eq!(table.get(3).map(|d| d.exp_required), Some(250));
        assert!(table.get(4).is_none());
    }

    #[test]
    fn change_records_expected_version() {
        let mut user = User::new_player(1, "a".to_owned(), 100, chrono::Utc::now());
        user.version = 7;
        let journal = Journal::new(user.id, chrono::Utc::now());
        let change = UserChange::new(&user, user.clone(), journal);
        assert_eq!(change.expected_version, 7);
        assert!(change.item_grant.is_none());
        assert!(change.transactions.is_empty());
    }
}
