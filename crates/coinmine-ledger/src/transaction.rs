//! Transaction builder and validation for the coin ledger.
//!
//! Provides a [`TransactionBuilder`] that enforces the sign convention:
//! callers supply a positive magnitude and the builder signs it according to
//! the [`TransactionType`].

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use coinmine_types::{Transaction, TransactionId, TransactionType, UserId};

use crate::LedgerError;

/// Builder for constructing validated [`Transaction`] values.
///
/// # Examples
///
/// ```
/// use coinmine_ledger::TransactionBuilder;
/// use coinmine_types::{TransactionType, UserId};
/// use rust_decimal::Decimal;
///
/// let entry = TransactionBuilder::new(UserId::new(), TransactionType::Purchase)
///     .amount(Decimal::new(50, 0))
///     .description("Bought Drill".to_owned())
///     .build();
///
/// assert_eq!(entry.ok().map(|e| e.amount), Some(Decimal::new(-50, 0)));
/// ```
#[derive(Debug)]
pub struct TransactionBuilder {
    user_id: UserId,
    kind: TransactionType,
    amount: Option<Decimal>,
    description: Option<String>,
    created_at: Option<DateTime<Utc>>,
}

impl TransactionBuilder {
    /// Start building a ledger entry for the given player and category.
    pub const fn new(user_id: UserId, kind: TransactionType) -> Self {
        Self {
            user_id,
            kind,
            amount: None,
            description: None,
            created_at: None,
        }
    }

    /// Set the unsigned magnitude of the entry.
    #[must_use]
    pub const fn amount(mut self, magnitude: Decimal) -> Self {
        self.amount = Some(magnitude);
        self
    }

    /// Set the human-readable description.
    #[must_use]
    pub fn description(mut self, description: String) -> Self {
        self.description = Some(description);
        self
    }

    /// Set the event timestamp. Defaults to the current time.
    #[must_use]
    pub const fn at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }

    /// Validate inputs and produce a signed [`Transaction`].
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::ZeroAmount`] if the magnitude is zero.
    /// Returns [`LedgerError::NegativeAmount`] if the magnitude is negative.
    /// Returns [`LedgerError::MissingField`] if the amount or description is
    /// not set.
    pub fn build(self) -> Result<Transaction, LedgerError> {
        let magnitude = self.amount.ok_or(LedgerError::MissingField("amount"))?;
        let description = self
            .description
            .ok_or(LedgerError::MissingField("description"))?;

        if magnitude.is_zero() {
            return Err(LedgerError::ZeroAmount);
        }
        if magnitude.is_sign_negative() {
            return Err(LedgerError::NegativeAmount { amount: magnitude });
        }

        let amount = if self.kind.is_credit() {
            magnitude
        } else {
            -magnitude
        };

        Ok(Transaction {
            id: TransactionId::new(),
            user_id: self.user_id,
            amount,
            kind: self.kind,
            description,
            created_at: self.created_at.unwrap_or_else(Utc::now),
        })
    }
}

/// Whether a stored amount carries the sign its category requires.
pub fn has_valid_sign(kind: TransactionType, amount: Decimal) -> bool {
    if amount.is_zero() {
        return false;
    }
    kind.is_credit() != amount.is_sign_negative()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credit_types_keep_positive_sign() {
        for kind in [
            TransactionType::Mining,
            TransactionType::DailyBonus,
            TransactionType::LevelReward,
        ] {
            let entry = TransactionBuilder::new(UserId::new(), kind)
                .amount(Decimal::new(125, 1))
                .description("credit".to_owned())
                .build();
            assert_eq!(entry.ok().map(|e| e.amount), Some(Decimal::new(125, 1)));
        }
    }

    #[test]
    fn purchase_is_negated() {
        let entry = TransactionBuilder::new(UserId::new(), TransactionType::Purchase)
            .amount(Decimal::new(50, 0))
            .description("Bought Drill".to_owned())
            .build();
        assert_eq!(entry.ok().map(|e| e.amount), Some(Decimal::new(-50, 0)));
    }

    #[test]
    fn zero_amount_rejected() {
        let result = TransactionBuilder::new(UserId::new(), TransactionType::Mining)
            .amount(Decimal::ZERO)
            .description("nothing".to_owned())
            .build();
        assert!(matches!(result, Err(LedgerError::ZeroAmount)));
    }

    #[test]
    fn negative_magnitude_rejected() {
        let result = TransactionBuilder::new(UserId::new(), TransactionType::Purchase)
            .amount(Decimal::new(-5, 0))
            .description("refund?".to_owned())
            .build();
        assert!(matches!(result, Err(LedgerError::NegativeAmount { .. })));
    }

    #[test]
    fn missing_description_rejected() {
        let result = TransactionBuilder::new(UserId::new(), TransactionType::Mining)
            .amount(Decimal::ONE)
            .build();
        assert!(matches!(
            result,
            Err(LedgerError::MissingField("description"))
        ));
    }

    #[test]
    fn explicit_timestamp_is_kept() {
        let at = DateTime::from_timestamp(1_700_000_000, 0).unwrap_or_default();
        let entry = TransactionBuilder::new(UserId::new(), TransactionType::DailyBonus)
            .amount(Decimal::ONE_HUNDRED)
            .description("bonus".to_owned())
            .at(at)
            .build();
        assert_eq!(entry.ok().map(|e| e.created_at), Some(at));
    }

    #[test]
    fn sign_validation() {
        assert!(has_valid_sign(TransactionType::Mining, Decimal::ONE));
        assert!(!has_valid_sign(TransactionType::Mining, Decimal::NEGATIVE_ONE));
        assert!(has_valid_sign(TransactionType::Purchase, Decimal::NEGATIVE_ONE));
        assert!(!has_valid_sign(TransactionType::LevelReward, Decimal::ZERO));
    }
}
