//! Player rows.
//!
//! Every write to an existing player goes through
//! [`UserStore::update_versioned`], which only matches the row while its
//! `version` still equals the version the change was computed from.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use coinmine_types::{LeaderboardEntry, User, UserId};

use crate::error::{DbError, out_of_range};

const USER_COLUMNS: &str = "id, external_id, display_name, balance, mining_power, level, experience, next_level_exp, last_mining, last_bonus_at, bonus_streak, version, created_at";

/// Operations on the `users` table.
pub struct UserStore<'a> {
    pool: &'a PgPool,
}

impl<'a> UserStore<'a> {
    /// Create a new user store bound to a connection pool.
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert `user` unless a row with the same `external_id` exists, then
    /// return whichever row is stored.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if a query fails.
    pub async fn insert_if_absent(&self, user: &User) -> Result<User, DbError> {
        let row = UserRow::try_from(user)?;
        sqlx::query(
            r"INSERT INTO users (id, external_id, display_name, balance, mining_power, level, experience, next_level_exp, last_mining, last_bonus_at, bonus_streak, version, created_at)
              VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
              ON CONFLICT (external_id) DO NOTHING",
        )
        .bind(row.id)
        .bind(row.external_id)
        .bind(&row.display_name)
        .bind(row.balance)
        .bind(row.mining_power)
        .bind(row.level)
        .bind(row.experience)
        .bind(row.next_level_exp)
        .bind(row.last_mining)
        .bind(row.last_bonus_at)
        .bind(row.bonus_streak)
        .bind(row.version)
        .bind(row.created_at)
        .execute(self.pool)
        .await?;

        self.get_by_external_id(user.external_id)
            .await?
            .ok_or_else(|| DbError::Conversion("registered user vanished".to_owned()))
    }

    /// Fetch a player by id.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the query fails or the row is out of range.
    pub async fn get(&self, id: UserId) -> Result<Option<User>, DbError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id.into_inner())
        .fetch_optional(self.pool)
        .await?;
        row.map(User::try_from).transpose()
    }

    /// Fetch a player by chat-platform identity.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the query fails or the row is out of range.
    pub async fn get_by_external_id(&self, external_id: i64) -> Result<Option<User>, DbError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE external_id = $1"
        ))
        .bind(external_id)
        .fetch_optional(self.pool)
        .await?;
        row.map(User::try_from).transpose()
    }

    /// The richest players: balance descending, ties by id ascending.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the query fails or a row is out of range.
    pub async fn top_by_balance(&self, limit: u32) -> Result<Vec<LeaderboardEntry>, DbError> {
        let rows = sqlx::query_as::<_, LeaderboardRow>(
            r"SELECT id, display_name, balance, mining_power, level
              FROM users
              ORDER BY balance DESC, id ASC
              LIMIT $1",
        )
        .bind(i64::from(limit))
        .fetch_all(self.pool)
        .await?;

        rows.into_iter()
            .map(|row| -> Result<LeaderboardEntry, DbError> {
                Ok(LeaderboardEntry {
                    id: UserId::from(row.id),
                    display_name: row.display_name,
                    balance: row.balance,
                    mining_power: row.mining_power,
                    level: u32::try_from(row.level).map_err(|e| out_of_range("users.level", e))?,
                })
            })
            .collect()
    }

    /// Overwrite the economy columns of `user` and bump its version, but only
    /// while the stored version equals `expected_version`.
    ///
    /// Returns whether the row matched.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the update fails, including a
    /// rejected `CHECK` constraint.
    pub async fn update_versioned(
        conn: &mut PgConnection,
        user: &User,
        expected_version: i64,
    ) -> Result<bool, DbError> {
        let row = UserRow::try_from(user)?;
        let result = sqlx::query(
            r"UPDATE users
              SET display_name = $3, balance = $4, mining_power = $5, level = $6,
                  experience = $7, next_level_exp = $8, last_mining = $9,
                  last_bonus_at = $10, bonus_streak = $11, version = version + 1
              WHERE id = $1 AND version = $2",
        )
        .bind(row.id)
        .bind(expected_version)
        .bind(&row.display_name)
        .bind(row.balance)
        .bind(row.mining_power)
        .bind(row.level)
        .bind(row.experience)
        .bind(row.next_level_exp)
        .bind(row.last_mining)
        .bind(row.last_bonus_at)
        .bind(row.bonus_streak)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Whether a player row exists.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails.
    pub async fn exists(conn: &mut PgConnection, id: UserId) -> Result<bool, DbError> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE id = $1)")
            .bind(id.into_inner())
            .fetch_one(&mut *conn)
            .await?;
        Ok(exists)
    }
}

/// A row from the `users` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRow {
    /// Player UUID.
    pub id: Uuid,
    /// Chat-platform identity.
    pub external_id: i64,
    /// Leaderboard name.
    pub display_name: String,
    /// Coins held.
    pub balance: Decimal,
    /// Coins per minute of mining.
    pub mining_power: Decimal,
    /// Current level.
    pub level: i32,
    /// Cumulative experience.
    pub experience: i64,
    /// Experience threshold of the next level.
    pub next_level_exp: i64,
    /// Last successful mining action.
    pub last_mining: Option<DateTime<Utc>>,
    /// Last daily bonus claim.
    pub last_bonus_at: Option<DateTime<Utc>>,
    /// Consecutive claim days.
    pub bonus_streak: i32,
    /// Optimistic concurrency version.
    pub version: i64,
    /// Registration timestamp.
    pub created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = DbError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: UserId::from(row.id),
            external_id: row.external_id,
            display_name: row.display_name,
            balance: row.balance,
            mining_power: row.mining_power,
            level: u32::try_from(row.level).map_err(|e| out_of_range("users.level", e))?,
            experience: u64::try_from(row.experience)
                .map_err(|e| out_of_range("users.experience", e))?,
            next_level_exp: u64::try_from(row.next_level_exp)
                .map_err(|e| out_of_range("users.next_level_exp", e))?,
            last_mining: row.last_mining,
            last_bonus_at: row.last_bonus_at,
            bonus_streak: u32::try_from(row.bonus_streak)
                .map_err(|e| out_of_range("users.bonus_streak", e))?,
            version: row.version,
            created_at: row.created_at,
        })
    }
}

impl TryFrom<&User> for UserRow {
    type Error = DbError;

    fn try_from(user: &User) -> Result<Self, Self::Error> {
        Ok(Self {
            id: user.id.into_inner(),
            external_id: user.external_id,
            display_name: user.display_name.clone(),
            balance: user.balance,
            mining_power: user.mining_power,
            level: i32::try_from(user.level).map_err(|e| out_of_range("level", e))?,
            experience: i64::try_from(user.experience).map_err(|e| out_of_range("experience", e))?,
            next_level_exp: i64::try_from(user.next_level_exp)
                .map_err(|e| out_of_range("next_level_exp", e))?,
            last_mining: user.last_mining,
            last_bonus_at: user.last_bonus_at,
            bonus_streak: i32::try_from(user.bonus_streak)
                .map_err(|e| out_of_range("bonus_streak", e))?,
            version: user.version,
            created_at: user.created_at,
        })
    }
}

/// A leaderboard projection of the `users` table.
#[derive(Debug, Clone, sqlx::FromRow)]
struct LeaderboardRow {
    id: Uuid,
    display_name: String,
    balance: Decimal,
    mining_power: Decimal,
    level: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_conversion_preserves_user() {
        let mut user = User::new_player(9, "ada".to_owned(), 100, Utc::now());
        user.experience = 42;
        user.bonus_streak = 3;
        user.version = 5;
        let row = UserRow::try_from(&user).ok();
        let back = row.and_then(|r| User::try_from(r).ok());
        assert_eq!(back, Some(user));
    }

    #[test]
    fn negative_level_rejected() {
        let user = User::new_player(9, "ada".to_owned(), 100, Utc::now());
        let mut row = UserRow::try_from(&user).ok();
        if let Some(row) = row.as_mut() {
            row.level = -1;
        }
        let result = row.map(User::try_from);
        assert!(matches!(result, Some(Err(DbError::Conversion(_)))));
    }

    #[test]
    fn oversized_experience_rejected() {
        let mut user = User::new_player(9, "ada".to_owned(), 100, Utc::now());
        user.experience = u64::MAX;
        assert!(UserRow::try_from(&user).is_err());
    }
}
