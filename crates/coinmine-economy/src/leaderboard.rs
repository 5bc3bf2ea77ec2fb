//! Leaderboard ranking.
//!
//! Players are ordered by balance, richest first. Ties are broken by user id
//! ascending so the order is stable across calls.

use std::cmp::Ordering;

use coinmine_types::{LeaderboardEntry, User};

use crate::error::EconomyError;

/// Number of rows returned when the caller does not ask for a size.
pub const DEFAULT_LIMIT: u32 = 10;

/// Largest page served; larger requests are clamped.
pub const MAX_LIMIT: u32 = 100;

/// Validate a requested page size, clamping it to [`MAX_LIMIT`].
///
/// # Errors
///
/// Returns [`EconomyError::InvalidArgument`] for zero.
pub fn effective_limit(limit: u32) -> Result<u32, EconomyError> {
    if limit == 0 {
        return Err(EconomyError::InvalidArgument(
            "leaderboard limit must be a positive integer".to_owned(),
        ));
    }
    Ok(limit.min(MAX_LIMIT))
}

/// Leaderboard order: balance descending, then id ascending.
pub fn compare(a: &User, b: &User) -> Ordering {
    b.balance.cmp(&a.balance).then_with(|| a.id.cmp(&b.id))
}

/// Rank `users` and keep the first `limit`.
pub fn rank<'a>(users: impl IntoIterator<Item = &'a User>, limit: u32) -> Vec<LeaderboardEntry> {
    let mut ranked: Vec<&User> = users.into_iter().collect();
    ranked.sort_by(|a, b| compare(a, b));
    ranked
        .into_iter()
        .take(usize::try_from(limit).unwrap_or(usize::MAX))
        .map(LeaderboardEntry::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal::Decimal;

    fn player(name: &str, balance: i64) -> User {
        let mut user = User::new_player(1, name.to_owned(), 100, Utc::now());
        user.balance = Decimal::from(balance);
        user
    }

    #[test]
    fn zero_limit_rejected() {
        assert!(matches!(
            effective_limit(0),
            Err(EconomyError::InvalidArgument(_))
        ));
    }

    #[test]
    fn large_limit_clamped() {
        assert_eq!(effective_limit(5_000).ok(), Some(MAX_LIMIT));
        assert_eq!(effective_limit(DEFAULT_LIMIT).ok(), Some(10));
    }

    #[test]
    fn ranks_by_balance_descending() {
        let users = [player("low", 5), player("high", 500), player("mid", 50)];
        let names: Vec<String> = rank(&users, 10)
            .into_iter()
            .map(|e| e.display_name)
            .collect();
        assert_eq!(names, vec!["high", "mid", "low"]);
    }

    #[test]
    fn ties_broken_by_id() {
        let a = player("a", 100);
        let b = player("b", 100);
        let expected = if a.id < b.id { "a" } else { "b" };
        let ranked = rank([&b, &a], 1);
        assert_eq!(ranked.first().map(|e| e.display_name.as_str()), Some(expected));
    }

    #[test]
    fn limit_truncates() {
        let users: Vec<User> = (0..20).map(|i| player("p", i)).collect();
        assert_eq!(rank(&users, 3).len(), 3);
    }
}
