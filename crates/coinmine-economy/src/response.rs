//! The result envelope handed to front ends.
//!
//! Front ends render `message` verbatim. Game-rule refusals arrive with
//! `success: false`, their player-facing explanation and an [`ErrorKind`]
//! the front end can branch on.

use serde::Serialize;

use coinmine_types::{
    BonusOutcome, ErrorKind, LeaderboardEntry, LevelOutcome, MineOutcome, PurchaseOutcome,
    ReconciliationReport, ShopItem, Transaction, User, UserProfile,
};

use crate::error::EconomyError;

/// Text shown to the player when an operation succeeds.
pub trait Summary {
    /// One-line description of the result.
    fn summary(&self) -> String;
}

/// Uniform success/failure envelope for every operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperationResponse<T> {
    /// Whether the operation committed (or, for reads, succeeded).
    pub success: bool,
    /// Player-facing text.
    pub message: String,
    /// Failure classification; absent on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<ErrorKind>,
    /// The structured result; absent on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Summary> OperationResponse<T> {
    /// Wrap an operation result.
    pub fn from_result(result: Result<T, EconomyError>) -> Self {
        match result {
            Ok(data) => Self {
                success: true,
                message: data.summary(),
                kind: None,
                data: Some(data),
            },
            Err(err) => Self::failure(&err),
        }
    }
}

impl<T> OperationResponse<T> {
    /// A failed response for `err`.
    ///
    /// Internal failures are reported generically; their detail belongs in
    /// the logs.
    pub fn failure(err: &EconomyError) -> Self {
        let message = match err.kind() {
            ErrorKind::Internal => "Something went wrong, please try again later".to_owned(),
            ErrorKind::PersistenceFailure => {
                "The mine is busy right now, please try again".to_owned()
            }
            _ => err.to_string(),
        };
        Self {
            success: false,
            message,
            kind: Some(err.kind()),
            data: None,
        }
    }
}

impl Summary for MineOutcome {
    fn summary(&self) -> String {
        self.message.clone()
    }
}

impl Summary for BonusOutcome {
    fn summary(&self) -> String {
        self.message.clone()
    }
}

impl Summary for PurchaseOutcome {
    fn summary(&self) -> String {
        self.message.clone()
    }
}

impl Summary for LevelOutcome {
    fn summary(&self) -> String {
        if self.leveled_up {
            format!("Level up! You are now level {}", self.new_level)
        } else {
            format!("{} / {} exp", self.new_exp, self.next_level_exp)
        }
    }
}

impl Summary for User {
    fn summary(&self) -> String {
        format!(
            "{}: level {}, {} coins",
            self.display_name,
            self.level,
            self.balance.normalize()
        )
    }
}

impl Summary for UserProfile {
    fn summary(&self) -> String {
        format!(
            "{} with {} item kinds, mining {} coins/min",
            self.user.summary(),
            self.items.len(),
            self.user.mining_power.normalize()
        )
    }
}

impl Summary for Vec<LeaderboardEntry> {
    fn summary(&self) -> String {
        format!("Top {} miners", self.len())
    }
}

impl Summary for Vec<Transaction> {
    fn summary(&self) -> String {
        format!("{} transactions", self.len())
    }
}

impl Summary for Vec<ShopItem> {
    fn summary(&self) -> String {
        format!("{} items for sale", self.len())
    }
}

impl Summary for ReconciliationReport {
    fn summary(&self) -> String {
        if self.is_consistent() {
            format!("Balance matches {} ledger entries", self.entries)
        } else {
            format!("Balance drifted from the ledger by {}", self.drift.normalize())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use rust_decimal::Decimal;

    fn level() -> LevelOutcome {
        LevelOutcome {
            leveled_up: false,
            new_level: 1,
            new_exp: 10,
            reward: Decimal::ZERO,
            next_level_exp: 100,
            levels_gained: 0,
        }
    }

    #[test]
    fn success_carries_data() {
        let response = OperationResponse::from_result(Ok(level()));
        assert!(response.success);
        assert!(response.kind.is_none());
        assert_eq!(response.message, "10 / 100 exp");
        assert_eq!(response.data, Some(level()));
    }

    #[test]
    fn refusal_carries_kind_and_message() {
        let response: OperationResponse<MineOutcome> =
            OperationResponse::from_result(Err(EconomyError::CooldownNotElapsed {
                remaining_secs: 12,
            }));
        assert!(!response.success);
        assert_eq!(response.kind, Some(ErrorKind::CooldownNotElapsed));
        assert_eq!(response.message, "Your drill is cooling down, try again in 12s");
        assert!(response.data.is_none());
    }

    #[test]
    fn persistence_detail_not_leaked() {
        let err = EconomyError::from(StoreError::Backend("password rejected".to_owned()));
        let response: OperationResponse<MineOutcome> = OperationResponse::failure(&err);
        assert_eq!(response.kind, Some(ErrorKind::PersistenceFailure));
        assert!(!response.message.contains("password"));
    }

    #[test]
    fn serializes_without_empty_fields() {
        let response = OperationResponse::from_result(Ok(level()));
        let json = serde_json::to_value(&response).ok();
        assert_eq!(json.as_ref().and_then(|v| v.get("success")), Some(&serde_json::Value::Bool(true)));
        assert!(json.as_ref().and_then(|v| v.get("kind")).is_none());
    }
}
