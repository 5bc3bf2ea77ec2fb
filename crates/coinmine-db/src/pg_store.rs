//! [`LedgerStore`] backed by `PostgreSQL`.
//!
//! A commit runs in one database transaction:
//!
//! ```text
//! BEGIN
//!   UPDATE users ... WHERE id = $1 AND version = $2   -- 0 rows: conflict or missing
//!   INSERT INTO user_items ... ON CONFLICT ... WHERE quantity < cap
//!   INSERT INTO transactions SELECT * FROM UNNEST(...)
//! COMMIT
//! ```
//!
//! Any failure drops the transaction, which rolls it back.

use sqlx::PgPool;

use coinmine_economy::{LedgerStore, LevelTable, StoreError, UserChange};
use coinmine_types::{
    ItemId, LeaderboardEntry, LevelDefinition, ShopItem, Transaction, User, UserId, UserItem,
};

use crate::catalog_store::CatalogStore;
use crate::error::DbError;
use crate::transaction_store::TransactionStore;
use crate::user_store::UserStore;

/// The engine's store over a `PostgreSQL` pool.
#[derive(Debug, Clone)]
pub struct PgLedgerStore {
    pool: PgPool,
}

impl PgLedgerStore {
    /// Wrap a connection pool.
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Seed the level table and shop catalog. Returns rows written as
    /// `(levels, items)`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if an upsert fails.
    pub async fn seed(
        &self,
        levels: &[LevelDefinition],
        items: &[ShopItem],
    ) -> Result<(u64, u64), DbError> {
        let catalog = CatalogStore::new(&self.pool);
        let levels_written = catalog.upsert_levels(levels).await?;
        let items_written = catalog.upsert_items(items).await?;
        tracing::info!(levels = levels_written, items = items_written, "Seeded reference data");
        Ok((levels_written, items_written))
    }

    /// Look up a catalog entry by slug.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the query fails.
    pub async fn item_by_slug(&self, slug: &str) -> Result<Option<ShopItem>, DbError> {
        CatalogStore::new(&self.pool).item_by_slug(slug).await
    }

    async fn commit_in_transaction(&self, change: &UserChange) -> Result<(), StoreError> {
        let id = change.user.id;
        let mut tx = self.pool.begin().await.map_err(DbError::from)?;

        if !UserStore::update_versioned(&mut *tx, &change.user, change.expected_version).await? {
            return if UserStore::exists(&mut *tx, id).await? {
                Err(StoreError::Conflict(id))
            } else {
                Err(StoreError::UserMissing(id))
            };
        }

        if let Some(grant) = &change.item_grant {
            if !CatalogStore::grant(&mut *tx, id, grant).await? {
                return Err(StoreError::ItemCapReached(grant.item_id));
            }
        }

        TransactionStore::insert_batch(&mut *tx, &change.transactions).await?;
        tx.commit().await.map_err(DbError::from)?;
        Ok(())
    }
}

impl LedgerStore for PgLedgerStore {
    async fn register_user(&self, candidate: User) -> Result<User, StoreError> {
        Ok(UserStore::new(&self.pool).insert_if_absent(&candidate).await?)
    }

    async fn fetch_user(&self, id: UserId) -> Result<Option<User>, StoreError> {
        Ok(UserStore::new(&self.pool).get(id).await?)
    }

    async fn fetch_user_by_external_id(&self, external_id: i64) -> Result<Option<User>, StoreError> {
        Ok(UserStore::new(&self.pool).get_by_external_id(external_id).await?)
    }

    async fn level_table(&self) -> Result<LevelTable, StoreError> {
        let levels = CatalogStore::new(&self.pool).levels().await?;
        Ok(LevelTable::new(levels))
    }

    async fn fetch_item(&self, id: ItemId) -> Result<Option<ShopItem>, StoreError> {
        Ok(CatalogStore::new(&self.pool).item(id).await?)
    }

    async fn catalog(&self) -> Result<Vec<ShopItem>, StoreError> {
        Ok(CatalogStore::new(&self.pool).items().await?)
    }

    async fn owned_quantity(&self, user: UserId, item: ItemId) -> Result<u32, StoreError> {
        Ok(CatalogStore::new(&self.pool).owned_quantity(user, item).await?)
    }

    async fn inventory(&self, user: UserId) -> Result<Vec<UserItem>, StoreError> {
        Ok(CatalogStore::new(&self.pool).inventory(user).await?)
    }

    async fn commit(&self, change: &UserChange) -> Result<(), StoreError> {
        let result = self.commit_in_transaction(change).await;
        match &result {
            Ok(()) => tracing::debug!(
                user_id = %change.user.id,
                entries = change.transactions.len(),
                "Committed user change"
            ),
            Err(err) if err.is_conflict() => {
                tracing::debug!(user_id = %change.user.id, error = %err, "Commit rejected");
            }
            Err(err) => tracing::warn!(user_id = %change.user.id, error = %err, "Commit failed"),
        }
        result
    }

    async fn top_players(&self, limit: u32) -> Result<Vec<LeaderboardEntry>, StoreError> {
        Ok(UserStore::new(&self.pool).top_by_balance(limit).await?)
    }

    async fn transactions(
        &self,
        user: UserId,
        limit: Option<u32>,
    ) -> Result<Vec<Transaction>, StoreError> {
        Ok(TransactionStore::new(&self.pool).for_user(user, limit).await?)
    }
}
