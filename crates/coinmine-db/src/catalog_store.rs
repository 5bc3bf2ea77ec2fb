//! Reference data (levels, shop catalog) and item ownership.
//!
//! Levels and shop items are seeded from `coinmine.yaml` with idempotent
//! upserts keyed by level number and item slug, so reseeding updates prices
//! and rewards without changing item ids.

use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use coinmine_economy::ItemGrant;
use coinmine_types::{ItemId, LevelDefinition, ShopItem, UserId, UserItem};

use crate::error::{DbError, out_of_range};

const ITEM_COLUMNS: &str = "id, slug, name, description, icon, price, power_boost, max_quantity";

/// Operations on `level_definitions`, `shop_items` and `user_items`.
pub struct CatalogStore<'a> {
    pool: &'a PgPool,
}

impl<'a> CatalogStore<'a> {
    /// Create a new catalog store bound to a connection pool.
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert or update level rows. Returns the number of rows written.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a value is out of range or the upsert fails.
    pub async fn upsert_levels(&self, levels: &[LevelDefinition]) -> Result<u64, DbError> {
        if levels.is_empty() {
            return Ok(0);
        }

        let mut numbers = Vec::with_capacity(levels.len());
        let mut thresholds = Vec::with_capacity(levels.len());
        let mut rewards = Vec::with_capacity(levels.len());
        for def in levels {
            numbers.push(i32::try_from(def.level).map_err(|e| out_of_range("level", e))?);
            thresholds.push(
                i64::try_from(def.exp_required).map_err(|e| out_of_range("exp_required", e))?,
            );
            rewards.push(def.reward);
        }

        let result = sqlx::query(
            r"INSERT INTO level_definitions (level, exp_required, reward)
              SELECT * FROM UNNEST($1::INTEGER[], $2::BIGINT[], $3::NUMERIC[])
              ON CONFLICT (level) DO UPDATE
              SET exp_required = EXCLUDED.exp_required, reward = EXCLUDED.reward",
        )
        .bind(&numbers)
        .bind(&thresholds)
        .bind(&rewards)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Insert or update shop items by slug. Returns the number of rows written.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a value is out of range or the upsert fails.
    pub async fn upsert_items(&self, items: &[ShopItem]) -> Result<u64, DbError> {
        if items.is_empty() {
            return Ok(0);
        }

        let len = items.len();
        let mut ids = Vec::with_capacity(len);
        let mut slugs = Vec::with_capacity(len);
        let mut names = Vec::with_capacity(len);
        let mut descriptions = Vec::with_capacity(len);
        let mut icons = Vec::with_capacity(len);
        let mut prices = Vec::with_capacity(len);
        let mut boosts = Vec::with_capacity(len);
        let mut caps: Vec<Option<i32>> = Vec::with_capacity(len);
        for item in items {
            ids.push(item.id.into_inner());
            slugs.push(item.slug.clone());
            names.push(item.name.clone());
            descriptions.push(item.description.clone());
            icons.push(item.icon.clone());
            prices.push(item.price);
            boosts.push(item.power_boost);
            caps.push(
                item.max_quantity
                    .map(i32::try_from)
                    .transpose()
                    .map_err(|e| out_of_range("max_quantity", e))?,
            );
        }

        let result = sqlx::query(
            r"INSERT INTO shop_items (id, slug, name, description, icon, price, power_boost, max_quantity)
              SELECT * FROM UNNEST($1::UUID[], $2::TEXT[], $3::TEXT[], $4::TEXT[], $5::TEXT[], $6::NUMERIC[], $7::NUMERIC[], $8::INTEGER[])
              ON CONFLICT (slug) DO UPDATE
              SET name = EXCLUDED.name, description = EXCLUDED.description, icon = EXCLUDED.icon,
                  price = EXCLUDED.price, power_boost = EXCLUDED.power_boost,
                  max_quantity = EXCLUDED.max_quantity",
        )
        .bind(&ids)
        .bind(&slugs)
        .bind(&names)
        .bind(&descriptions)
        .bind(&icons)
        .bind(&prices)
        .bind(&boosts)
        .bind(&caps)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Every level row, in level order.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the query fails or a row is out of range.
    pub async fn levels(&self) -> Result<Vec<LevelDefinition>, DbError> {
        let rows = sqlx::query_as::<_, LevelRow>(
            "SELECT level, exp_required, reward FROM level_definitions ORDER BY level",
        )
        .fetch_all(self.pool)
        .await?;
        rows.into_iter().map(LevelDefinition::try_from).collect()
    }

    /// The whole catalog, cheapest first.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the query fails or a row is out of range.
    pub async fn items(&self) -> Result<Vec<ShopItem>, DbError> {
        let rows = sqlx::query_as::<_, ShopItemRow>(&format!(
            "SELECT {ITEM_COLUMNS} FROM shop_items ORDER BY price, slug"
        ))
        .fetch_all(self.pool)
        .await?;
        rows.into_iter().map(ShopItem::try_from).collect()
    }

    /// One catalog entry by id.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the query fails or the row is out of range.
    pub async fn item(&self, id: ItemId) -> Result<Option<ShopItem>, DbError> {
        let row = sqlx::query_as::<_, ShopItemRow>(&format!(
            "SELECT {ITEM_COLUMNS} FROM shop_items WHERE id = $1"
        ))
        .bind(id.into_inner())
        .fetch_optional(self.pool)
        .await?;
        row.map(ShopItem::try_from).transpose()
    }

    /// One catalog entry by slug.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the query fails or the row is out of range.
    pub async fn item_by_slug(&self, slug: &str) -> Result<Option<ShopItem>, DbError> {
        let row = sqlx::query_as::<_, ShopItemRow>(&format!(
            "SELECT {ITEM_COLUMNS} FROM shop_items WHERE slug = $1"
        ))
        .bind(slug)
        .fetch_optional(self.pool)
        .await?;
        row.map(ShopItem::try_from).transpose()
    }

    /// Units of `item` owned by `user`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the query fails or the count is out of range.
    pub async fn owned_quantity(&self, user: UserId, item: ItemId) -> Result<u32, DbError> {
        let quantity: Option<i32> = sqlx::query_scalar(
            "SELECT quantity FROM user_items WHERE user_id = $1 AND item_id = $2",
        )
        .bind(user.into_inner())
        .bind(item.into_inner())
        .fetch_optional(self.pool)
        .await?;
        quantity
            .map_or(Ok(0), u32::try_from)
            .map_err(|e| out_of_range("user_items.quantity", e))
    }

    /// Everything `user` owns.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the query fails or a row is out of range.
    pub async fn inventory(&self, user: UserId) -> Result<Vec<UserItem>, DbError> {
        let rows = sqlx::query_as::<_, UserItemRow>(
            "SELECT user_id, item_id, quantity FROM user_items WHERE user_id = $1 ORDER BY item_id",
        )
        .bind(user.into_inner())
        .fetch_all(self.pool)
        .await?;
        rows.into_iter()
            .map(|row| -> Result<UserItem, DbError> {
                Ok(UserItem {
                    user_id: UserId::from(row.user_id),
                    item_id: ItemId::from(row.item_id),
                    quantity: u32::try_from(row.quantity)
                        .map_err(|e| out_of_range("user_items.quantity", e))?,
                })
            })
            .collect()
    }

    /// Add one unit of `grant.item_id` to `user` on `conn`, unless that
    /// would exceed the cap.
    ///
    /// Returns whether the unit was granted.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the cap is out of range or the upsert fails.
    pub async fn grant(conn: &mut PgConnection, user: UserId, grant: &ItemGrant) -> Result<bool, DbError> {
        let cap = grant
            .max_quantity
            .map(i32::try_from)
            .transpose()
            .map_err(|e| out_of_range("max_quantity", e))?;

        let result = sqlx::query(
            r"INSERT INTO user_items (user_id, item_id, quantity)
              VALUES ($1, $2, 1)
              ON CONFLICT (user_id, item_id) DO UPDATE
              SET quantity = user_items.quantity + 1
              WHERE $3::INTEGER IS NULL OR user_items.quantity < $3::INTEGER",
        )
        .bind(user.into_inner())
        .bind(grant.item_id.into_inner())
        .bind(cap)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}

/// A row from the `level_definitions` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LevelRow {
    /// Level number.
    pub level: i32,
    /// Cumulative experience required.
    pub exp_required: i64,
    /// Coins granted on reaching the level.
    pub reward: Decimal,
}

impl TryFrom<LevelRow> for LevelDefinition {
    type Error = DbError;

    fn try_from(row: LevelRow) -> Result<Self, Self::Error> {
        Ok(Self {
            level: u32::try_from(row.level).map_err(|e| out_of_range("level", e))?,
            exp_required: u64::try_from(row.exp_required)
                .map_err(|e| out_of_range("exp_required", e))?,
            reward: row.reward,
        })
    }
}

/// A row from the `shop_items` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ShopItemRow {
    /// Item UUID.
    pub id: Uuid,
    /// Stable slug.
    pub slug: String,
    /// Display name.
    pub name: String,
    /// Description.
    pub description: String,
    /// Icon.
    pub icon: String,
    /// Price in coins.
    pub price: Decimal,
    /// Mining power added per unit.
    pub power_boost: Decimal,
    /// Per-player cap.
    pub max_quantity: Option<i32>,
}

impl TryFrom<ShopItemRow> for ShopItem {
    type Error = DbError;

    fn try_from(row: ShopItemRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: ItemId::from(row.id),
            slug: row.slug,
            name: row.name,
            description: row.description,
            icon: row.icon,
            price: row.price,
            power_boost: row.power_boost,
            max_quantity: row
                .max_quantity
                .map(u32::try_from)
                .transpose()
                .map_err(|e| out_of_range("max_quantity", e))?,
        })
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct UserItemRow {
    user_id: Uuid,
    item_id: Uuid,
    quantity: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_cap_rejected() {
        let row = ShopItemRow {
            id: Uuid::now_v7(),
            slug: "drill".to_owned(),
            name: "Drill".to_owned(),
            description: String::new(),
            icon: String::new(),
            price: Decimal::from(500),
            power_boost: Decimal::from(5),
            max_quantity: Some(-3),
        };
        assert!(matches!(ShopItem::try_from(row), Err(DbError::Conversion(_))));
    }

    #[test]
    fn level_row_converts() {
        let row = LevelRow {
            level: 2,
            exp_required: 100,
            reward: Decimal::from(20),
        };
        let def = LevelDefinition::try_from(row).ok();
        assert_eq!(def.map(|d| (d.level, d.exp_required)), Some((2, 100)));
    }
}
