//! Entries staged by a single engine operation.
//!
//! A [`Journal`] collects the ledger entries produced while one operation
//! computes a player's next state. The whole journal is committed together
//! with the user row, so either every entry lands or none does.
//!
//! # Design
//!
//! - **Append-only**: entries are never modified or removed once staged.
//! - **Single player**: a journal belongs to exactly one user.
//! - **Single instant**: all entries share the operation's timestamp.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use coinmine_types::{Transaction, TransactionType, UserId};

use crate::{LedgerError, TransactionBuilder};

/// Ledger entries staged for one user by one operation.
#[derive(Debug, Clone)]
pub struct Journal {
    user_id: UserId,
    at: DateTime<Utc>,
    entries: Vec<Transaction>,
}

impl Journal {
    /// Create an empty journal for `user_id` stamped at `at`.
    pub const fn new(user_id: UserId, at: DateTime<Utc>) -> Self {
        Self {
            user_id,
            at,
            entries: Vec::new(),
        }
    }

    /// Return the number of staged entries.
    pub const fn len(&self) -> usize {
        self.entries.len()
    }

    /// Return whether nothing has been staged.
    pub const fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Stage an entry of any category.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError`] if the entry fails validation.
    pub fn record(
        &mut self,
        kind: TransactionType,
        magnitude: Decimal,
        description: String,
    ) -> Result<&Transaction, LedgerError> {
        let entry = TransactionBuilder::new(self.user_id, kind)
            .amount(magnitude)
            .description(description)
            .at(self.at)
            .build()?;
        self.entries.push(entry);
        self.entries
            .last()
            .ok_or(LedgerError::MissingField("staged entry"))
    }

    /// Stage the coins accrued by a mining action.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError`] if the entry fails validation.
    pub fn record_mining(&mut self, coins: Decimal) -> Result<&Transaction, LedgerError> {
        self.record(TransactionType::Mining, coins, format!("Mined {coins} coins"))
    }

    /// Stage a daily bonus credit.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError`] if the entry fails validation.
    pub fn record_daily_bonus(
        &mut self,
        coins: Decimal,
        streak: u32,
    ) -> Result<&Transaction, LedgerError> {
        self.record(
            TransactionType::DailyBonus,
            coins,
            format!("Daily bonus (day {streak} streak)"),
        )
    }

    /// Stage the reward for reaching `level`.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError`] if the entry fails validation.
    pub fn record_level_reward(
        &mut self,
        coins: Decimal,
        level: u32,
    ) -> Result<&Transaction, LedgerError> {
        self.record(
            TransactionType::LevelReward,
            coins,
            format!("Reached level {level}"),
        )
    }

    /// Stage a shop purchase debit. `price` is the positive item price.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError`] if the entry fails validation.
    pub fn record_purchase(
        &mut self,
        price: Decimal,
        item_name: &str,
    ) -> Result<&Transaction, LedgerError> {
        self.record(
            TransactionType::Purchase,
            price,
            format!("Bought {item_name}"),
        )
    }

    /// Sum of all staged signed amounts.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Overflow`] if the sum leaves the decimal range.
    pub fn net_amount(&self) -> Result<Decimal, LedgerError> {
        self.entries.iter().try_fold(Decimal::ZERO, |acc, e| {
            acc.checked_add(e.amount)
                .ok_or(LedgerError::Overflow("summing staged entries"))
        })
    }

    /// Return all staged entries, in insertion order.
    pub fn entries(&self) -> &[Transaction] {
        &self.entries
    }

    /// Consume the journal and return its entries.
    pub fn into_entries(self) -> Vec<Transaction> {
        self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn journal() -> Journal {
        Journal::new(UserId::new(), Utc::now())
    }

    #[test]
    fn new_journal_is_empty() {
        let j = journal();
        assert!(j.is_empty());
        assert_eq!(j.len(), 0);
        assert_eq!(j.net_amount().ok(), Some(Decimal::ZERO));
    }

    #[test]
    fn entries_share_user_and_timestamp() {
        let user = UserId::new();
        let at = Utc::now();
        let mut j = Journal::new(user, at);
        j.record_mining(Decimal::new(10, 0)).ok();
        j.record_level_reward(Decimal::new(20, 0), 2).ok();

        assert_eq!(j.len(), 2);
        assert!(j.entries().iter().all(|e| e.user_id == user && e.created_at == at));
    }

    #[test]
    fn net_amount_applies_signs() {
        let mut j = journal();
        j.record_daily_bonus(Decimal::new(100, 0), 1).ok();
        j.record_purchase(Decimal::new(30, 0), "Helmet").ok();
        assert_eq!(j.net_amount().ok(), Some(Decimal::new(70, 0)));
    }

    #[test]
    fn invalid_entry_is_not_staged() {
        let mut j = journal();
        let result = j.record_level_reward(Decimal::ZERO, 3);
        assert!(result.is_err());
        assert!(j.is_empty());
    }

    #[test]
    fn descriptions_are_readable() {
        let mut j = journal();
        j.record_purchase(Decimal::new(30, 0), "Helmet").ok();
        j.record_level_reward(Decimal::new(5, 0), 4).ok();
        let descriptions: Vec<&str> = j.entries().iter().map(|e| e.description.as_str()).collect();
        assert_eq!(descriptions, vec!["Bought Helmet", "Reached level 4"]);
    }
}
