//! Ledger persistence for player transactions.
//!
//! Entries are append-only. They are inserted inside the same database
//! transaction as the player row they explain, in one multi-row UNNEST
//! statement per commit.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use coinmine_types::{Transaction, TransactionId, TransactionType, UserId};

use crate::error::DbError;

/// Operations on the `transactions` table.
pub struct TransactionStore<'a> {
    pool: &'a PgPool,
}

impl<'a> TransactionStore<'a> {
    /// Create a new transaction store bound to a connection pool.
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert `entries` on `conn` with a single UNNEST statement.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the insert fails.
    pub async fn insert_batch(conn: &mut PgConnection, entries: &[Transaction]) -> Result<(), DbError> {
        if entries.is_empty() {
            return Ok(());
        }

        let len = entries.len();
        let mut ids = Vec::with_capacity(len);
        let mut user_ids = Vec::with_capacity(len);
        let mut amounts = Vec::with_capacity(len);
        let mut kinds = Vec::with_capacity(len);
        let mut descriptions = Vec::with_capacity(len);
        let mut timestamps = Vec::with_capacity(len);

        for entry in entries {
            ids.push(entry.id.into_inner());
            user_ids.push(entry.user_id.into_inner());
            amounts.push(entry.amount);
            kinds.push(transaction_type_to_db(entry.kind).to_owned());
            descriptions.push(entry.description.clone());
            timestamps.push(entry.created_at);
        }

        sqlx::query(
            r"INSERT INTO transactions (id, user_id, amount, type, description, created_at)
              SELECT * FROM UNNEST($1::UUID[], $2::UUID[], $3::NUMERIC[], $4::transaction_type[], $5::TEXT[], $6::TIMESTAMPTZ[])",
        )
        .bind(&ids)
        .bind(&user_ids)
        .bind(&amounts)
        .bind(&kinds)
        .bind(&descriptions)
        .bind(&timestamps)
        .execute(&mut *conn)
        .await?;

        tracing::debug!(count = len, "Inserted transactions (batch UNNEST)");
        Ok(())
    }

    /// A player's entries, newest first. `None` returns all of them.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the query fails or a row cannot be decoded.
    pub async fn for_user(&self, user: UserId, limit: Option<u32>) -> Result<Vec<Transaction>, DbError> {
        let rows = sqlx::query_as::<_, TransactionRow>(
            r"SELECT id, user_id, amount, type::TEXT AS kind, description, created_at
              FROM transactions
              WHERE user_id = $1
              ORDER BY created_at DESC, id DESC
              LIMIT $2",
        )
        .bind(user.into_inner())
        .bind(limit.map(i64::from))
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(Transaction::try_from).collect()
    }
}

/// A row from the `transactions` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TransactionRow {
    /// Entry UUID.
    pub id: Uuid,
    /// Owning player.
    pub user_id: Uuid,
    /// Signed amount.
    pub amount: Decimal,
    /// Category as a string (cast from the `PostgreSQL` enum).
    pub kind: String,
    /// Human-readable description.
    pub description: String,
    /// When the entry was committed.
    pub created_at: DateTime<Utc>,
}

impl TryFrom<TransactionRow> for Transaction {
    type Error = DbError;

    fn try_from(row: TransactionRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: TransactionId::from(row.id),
            user_id: UserId::from(row.user_id),
            amount: row.amount,
            kind: transaction_type_from_db(&row.kind)?,
            description: row.description,
            created_at: row.created_at,
        })
    }
}

/// Convert a [`TransactionType`] to its `PostgreSQL` enum string.
const fn transaction_type_to_db(kind: TransactionType) -> &'static str {
    match kind {
        TransactionType::Mining => "mining",
        TransactionType::DailyBonus => "daily_bonus",
        TransactionType::LevelReward => "level_reward",
        TransactionType::Purchase => "purchase",
    }
}

/// Parse a `PostgreSQL` enum string into a [`TransactionType`].
fn transaction_type_from_db(value: &str) -> Result<TransactionType, DbError> {
    TransactionType::ALL
        .into_iter()
        .find(|kind| transaction_type_to_db(*kind) == value)
        .ok_or_else(|| DbError::Conversion(format!("unknown transaction type {value}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_type_round_trips_through_its_db_name() {
        for kind in TransactionType::ALL {
            assert_eq!(
                transaction_type_from_db(transaction_type_to_db(kind)).ok(),
                Some(kind)
            );
        }
    }

    #[test]
    fn unknown_type_rejected() {
        assert!(matches!(
            transaction_type_from_db("refund"),
            Err(DbError::Conversion(_))
        ));
    }
}
