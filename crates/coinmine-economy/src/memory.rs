//! In-process [`LedgerStore`] used by tests and local runs.
//!
//! All state sits behind one mutex, so every commit is trivially atomic. The
//! version check, the ownership cap and the non-negative balance constraint
//! are enforced the same way the database enforces them.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};

use rust_decimal::Decimal;

use coinmine_types::{
    ItemId, LeaderboardEntry, ShopItem, Transaction, User, UserId, UserItem,
};

use crate::config::EconomyConfig;
use crate::error::StoreError;
use crate::leaderboard;
use crate::store::{LedgerStore, LevelTable, UserChange};

#[derive(Debug, Default)]
struct State {
    users: HashMap<UserId, User>,
    levels: LevelTable,
    items: BTreeMap<ItemId, ShopItem>,
    owned: HashMap<(UserId, ItemId), u32>,
    transactions: Vec<Transaction>,
}

/// A [`LedgerStore`] held entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    /// Create a store with the given level table and no catalog.
    pub fn new(levels: LevelTable) -> Self {
        Self {
            state: Mutex::new(State {
                levels,
                ..State::default()
            }),
        }
    }

    /// Create a store seeded with the configured levels and shop.
    pub fn from_config(config: &EconomyConfig) -> Self {
        let store = Self::new(LevelTable::new(config.level_definitions()));
        for seed in &config.shop {
            store.add_item(seed.to_item());
        }
        store
    }

    /// Insert or replace a user row as-is.
    pub fn insert_user(&self, user: User) {
        self.lock().users.insert(user.id, user);
    }

    /// Insert or replace a catalog entry.
    pub fn add_item(&self, item: ShopItem) {
        self.lock().items.insert(item.id, item);
    }

    /// Look up a catalog entry by slug.
    pub fn item_by_slug(&self, slug: &str) -> Option<ShopItem> {
        self.lock().items.values().find(|i| i.slug == slug).cloned()
    }

    /// Every ledger entry, oldest first.
    pub fn all_transactions(&self) -> Vec<Transaction> {
        self.lock().transactions.clone()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl LedgerStore for MemoryStore {
    async fn register_user(&self, candidate: User) -> Result<User, StoreError> {
        let mut state = self.lock();
        if let Some(existing) = state
            .users
            .values()
            .find(|u| u.external_id == candidate.external_id)
        {
            return Ok(existing.clone());
        }
        state.users.insert(candidate.id, candidate.clone());
        Ok(candidate)
    }

    async fn fetch_user(&self, id: UserId) -> Result<Option<User>, StoreError> {
        Ok(self.lock().users.get(&id).cloned())
    }

    async fn fetch_user_by_external_id(&self, external_id: i64) -> Result<Option<User>, StoreError> {
        Ok(self
            .lock()
            .users
            .values()
            .find(|u| u.external_id == external_id)
            .cloned())
    }

    async fn level_table(&self) -> Result<LevelTable, StoreError> {
        Ok(self.lock().levels.clone())
    }

    async fn fetch_item(&self, id: ItemId) -> Result<Option<ShopItem>, StoreError> {
        Ok(self.lock().items.get(&id).cloned())
    }

    async fn catalog(&self) -> Result<Vec<ShopItem>, StoreError> {
        let mut items: Vec<ShopItem> = self.lock().items.values().cloned().collect();
        items.sort_by(|a, b| a.price.cmp(&b.price).then_with(|| a.slug.cmp(&b.slug)));
        Ok(items)
    }

    async fn owned_quantity(&self, user: UserId, item: ItemId) -> Result<u32, StoreError> {
        Ok(self.lock().owned.get(&(user, item)).copied().unwrap_or(0))
    }

    async fn inventory(&self, user: UserId) -> Result<Vec<UserItem>, StoreError> {
        let state = self.lock();
        let mut items: Vec<UserItem> = state
            .owned
            .iter()
            .filter(|((owner, _), _)| *owner == user)
            .map(|(&(user_id, item_id), &quantity)| UserItem {
                user_id,
                item_id,
                quantity,
            })
            .collect();
        items.sort_by_key(|i| i.item_id);
        Ok(items)
    }

    async fn commit(&self, change: &UserChange) -> Result<(), StoreError> {
        let mut state = self.lock();
        let id = change.user.id;

        let stored = state.users.get(&id).ok_or(StoreError::UserMissing(id))?;
        if stored.version != change.expected_version {
            return Err(StoreError::Conflict(id));
        }
        if change.user.balance < Decimal::ZERO {
            return Err(StoreError::Constraint(format!("balance of user {id} would be negative")));
        }
        let next_version = change
            .expected_version
            .checked_add(1)
            .ok_or_else(|| StoreError::Constraint(format!("version of user {id} overflowed")))?;

        if let Some(grant) = change.item_grant {
            let owned = state.owned.get(&(id, grant.item_id)).copied().unwrap_or(0);
            if grant.max_quantity.is_some_and(|max| owned >= max) {
                return Err(StoreError::ItemCapReached(grant.item_id));
            }
            let quantity = owned
                .checked_add(1)
                .ok_or_else(|| StoreError::Constraint("item quantity overflowed".to_owned()))?;
            state.owned.insert((id, grant.item_id), quantity);
        }

        let mut next = change.user.clone();
        next.version = next_version;
        state.users.insert(id, next);
        state.transactions.extend(change.transactions.iter().cloned());
        Ok(())
    }

    async fn top_players(&self, limit: u32) -> Result<Vec<LeaderboardEntry>, StoreError> {
        Ok(leaderboard::rank(self.lock().users.values(), limit))
    }

    async fn transactions(
        &self,
        user: UserId,
        limit: Option<u32>,
    ) -> Result<Vec<Transaction>, StoreError> {
        let take = limit.map_or(usize::MAX, |l| usize::try_from(l).unwrap_or(usize::MAX));
        Ok(self
            .lock()
            .transactions
            .iter()
            .rev()
            .filter(|t| t.user_id == user)
            .take(take)
            .cloned()
            .collect())
    }
}
