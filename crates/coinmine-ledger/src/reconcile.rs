//! Balance reconciliation against the ledger.
//!
//! A player's stored balance must equal the sum of their ledger entries,
//! since every balance change is journaled in the same commit as the user
//! row. Reconciliation recomputes that sum and reports any drift, which
//! indicates an out-of-band write or data corruption.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use coinmine_types::{ReconciliationReport, Transaction, UserId};

use crate::LedgerError;
use crate::transaction::has_valid_sign;

/// Compare `stored_balance` with the sum of `entries` for `user_id`.
///
/// Entries belonging to other players are ignored.
///
/// # Errors
///
/// Returns [`LedgerError::SignMismatch`] if an entry's sign contradicts its
/// category, or [`LedgerError::Overflow`] if the sum leaves the decimal range.
pub fn reconcile(
    user_id: UserId,
    stored_balance: Decimal,
    entries: &[Transaction],
    checked_at: DateTime<Utc>,
) -> Result<ReconciliationReport, LedgerError> {
    let mut ledger_balance = Decimal::ZERO;
    let mut counted: usize = 0;

    for entry in entries.iter().filter(|e| e.user_id == user_id) {
        if !has_valid_sign(entry.kind, entry.amount) {
            return Err(LedgerError::SignMismatch {
                id: entry.id,
                kind: entry.kind,
                amount: entry.amount,
            });
        }
        ledger_balance = ledger_balance
            .checked_add(entry.amount)
            .ok_or(LedgerError::Overflow("summing ledger entries"))?;
        counted = counted.saturating_add(1);
    }

    let drift = stored_balance
        .checked_sub(ledger_balance)
        .ok_or(LedgerError::Overflow("computing drift"))?;

    if !drift.is_zero() {
        tracing::warn!(
            %user_id,
            %stored_balance,
            %ledger_balance,
            %drift,
            "Balance drifted from ledger"
        );
    }

    Ok(ReconciliationReport {
        user_id,
        stored_balance,
        ledger_balance,
        drift,
        entries: counted,
        checked_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Journal;
    use coinmine_types::{TransactionId, TransactionType};

    fn staged(user: UserId) -> Vec<Transaction> {
        let mut j = Journal::new(user, Utc::now());
        j.record_mining(Decimal::new(60, 0)).ok();
        j.record_daily_bonus(Decimal::new(100, 0), 1).ok();
        j.record_purchase(Decimal::new(50, 0), "Drill").ok();
        j.into_entries()
    }

    #[test]
    fn consistent_balance_has_no_drift() {
        let user = UserId::new();
        let report = reconcile(user, Decimal::new(110, 0), &staged(user), Utc::now());
        let report = report.ok();
        assert_eq!(report.as_ref().map(|r| r.entries), Some(3));
        assert_eq!(report.as_ref().map(ReconciliationReport::is_consistent), Some(true));
    }

    #[test]
    fn drift_is_reported() {
        let user = UserId::new();
        let report = reconcile(user, Decimal::new(150, 0), &staged(user), Utc::now()).ok();
        assert_eq!(report.map(|r| r.drift), Some(Decimal::new(40, 0)));
    }

    #[test]
    fn other_players_entries_are_ignored() {
        let user = UserId::new();
        let mut entries = staged(user);
        entries.extend(staged(UserId::new()));
        let report = reconcile(user, Decimal::new(110, 0), &entries, Utc::now()).ok();
        assert_eq!(report.map(|r| r.entries), Some(3));
    }

    #[test]
    fn wrong_sign_is_rejected() {
        let user = UserId::new();
        let bad = Transaction {
            id: TransactionId::new(),
            user_id: user,
            amount: Decimal::new(50, 0),
            kind: TransactionType::Purchase,
            description: "Bought Drill".to_owned(),
            created_at: Utc::now(),
        };
        let result = reconcile(user, Decimal::new(50, 0), &[bad], Utc::now());
        assert!(matches!(result, Err(LedgerError::SignMismatch { .. })));
    }
}
