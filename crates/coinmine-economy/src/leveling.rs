//! Experience and level progression.
//!
//! Experience is cumulative and never reset. A player at level `n` reaches
//! level `n + 1` once experience meets `next_level_exp`, provided the level
//! table defines level `n + 1`; its reward is credited in the same change.
//! The new threshold is the `exp_required` of level `n + 2`, or the old
//! threshold times `fallback_growth_factor` when the table ends there.
//!
//! Without a row for `n + 1` the player is at the level cap: experience keeps
//! accumulating and no level-up happens.
//!
//! Under [`LevelUpPolicy::SingleStep`] a grant resolves at most one level, so
//! experience may still sit above the new threshold afterwards; the next
//! grant resolves the next level. [`LevelUpPolicy::UntilSettled`] keeps going
//! until experience is below the threshold or the cap is hit.

use rust_decimal::Decimal;

use coinmine_ledger::Journal;
use coinmine_types::{LevelOutcome, User};

use crate::config::{LevelUpPolicy, LevelingConfig};
use crate::error::EconomyError;
use crate::store::LevelTable;

/// Grant `amount` experience to `user`, resolving level-ups and staging
/// their rewards in `journal`.
///
/// # Errors
///
/// Returns [`EconomyError::Overflow`] if experience, thresholds or balance
/// overflow, or [`EconomyError::Ledger`] if a reward entry cannot be staged.
pub fn apply_experience(
    user: &mut User,
    amount: u64,
    table: &LevelTable,
    config: &LevelingConfig,
    journal: &mut Journal,
) -> Result<LevelOutcome, EconomyError> {
    user.experience = user
        .experience
        .checked_add(amount)
        .ok_or(EconomyError::Overflow("adding experience"))?;

    let mut reward_total = Decimal::ZERO;
    let mut levels_gained: u32 = 0;

    while user.experience >= user.next_level_exp {
        let Some(target) = user.level.checked_add(1) else {
            break;
        };
        let Some(reached) = table.get(target) else {
            break;
        };

        let next_threshold = match target.checked_add(1).and_then(|after| table.get(after)) {
            Some(after) => after.exp_required,
            None => user
                .next_level_exp
                .checked_mul(config.fallback_growth_factor)
                .ok_or(EconomyError::Overflow("growing the level threshold"))?,
        };

        user.level = target;
        user.next_level_exp = next_threshold;
        if reached.reward > Decimal::ZERO {
            user.balance = user
                .balance
                .checked_add(reached.reward)
                .ok_or(EconomyError::Overflow("crediting the level reward"))?;
            reward_total = reward_total
                .checked_add(reached.reward)
                .ok_or(EconomyError::Overflow("summing level rewards"))?;
            journal.record_level_reward(reached.reward, target)?;
        }
        levels_gained = levels_gained.saturating_add(1);

        tracing::debug!(user_id = %user.id, level = target, reward = %reached.reward, "Level reached");

        if config.policy == LevelUpPolicy::SingleStep {
            break;
        }
    }

    Ok(LevelOutcome {
        leveled_up: levels_gained > 0,
        new_level: user.level,
        new_exp: user.experience,
        reward: reward_total,
        next_level_exp: user.next_level_exp,
        levels_gained,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use coinmine_types::LevelDefinition;

    fn table() -> LevelTable {
        LevelTable::new([
            LevelDefinition {
                level: 1,
                exp_required: 0,
                reward: Decimal::ZERO,
            },
            LevelDefinition {
                level: 2,
                exp_required: 100,
                reward: Decimal::from(20),
            },
            LevelDefinition {
                level: 3,
                exp_required: 250,
                reward: Decimal::from(50),
            },
        ])
    }

    fn player(level: u32, experience: u64, next_level_exp: u64) -> User {
        let mut user = User::new_player(1, "p".to_owned(), next_level_exp, Utc::now());
        user.level = level;
        user.experience = experience;
        user
    }

    fn grant(user: &mut User, amount: u64, policy: LevelUpPolicy) -> (LevelOutcome, Journal) {
        let mut journal = Journal::new(user.id, Utc::now());
        let config = LevelingConfig {
            policy,
            ..LevelingConfig::default()
        };
        let outcome = apply_experience(user, amount, &table(), &config, &mut journal);
        assert!(outcome.is_ok(), "grant failed: {outcome:?}");
        let outcome = outcome.unwrap_or_else(|_| LevelOutcome {
            leveled_up: false,
            new_level: 0,
            new_exp: 0,
            reward: Decimal::ZERO,
            next_level_exp: 0,
            levels_gained: 0,
        });
        (outcome, journal)
    }

    #[test]
    fn below_threshold_only_adds_experience() {
        let mut user = player(1, 10, 100);
        let (outcome, journal) = grant(&mut user, 5, LevelUpPolicy::SingleStep);
        assert!(!outcome.leveled_up);
        assert_eq!(outcome.new_exp, 15);
        assert_eq!(outcome.next_level_exp, 100);
        assert_eq!(outcome.reward, Decimal::ZERO);
        assert!(journal.is_empty());
    }

    #[test]
    fn crossing_threshold_levels_up_with_reward() {
        let mut user = player(1, 95, 100);
        let (outcome, journal) = grant(&mut user, 10, LevelUpPolicy::SingleStep);
        assert!(outcome.leveled_up);
        assert_eq!(outcome.new_level, 2);
        assert_eq!(outcome.new_exp, 105);
        assert_eq!(outcome.reward, Decimal::from(20));
        assert_eq!(outcome.next_level_exp, 250);
        assert_eq!(user.balance, Decimal::from(20));
        assert_eq!(journal.net_amount().ok(), Some(Decimal::from(20)));
    }

    #[test]
    fn single_step_resolves_one_level_only() {
        let mut user = player(1, 0, 100);
        let (outcome, _) = grant(&mut user, 300, LevelUpPolicy::SingleStep);
        assert_eq!(outcome.new_level, 2);
        assert_eq!(outcome.levels_gained, 1);
        assert_eq!(outcome.next_level_exp, 250);
        assert!(outcome.new_exp >= outcome.next_level_exp);

        // The pending level resolves on the next grant, even a zero one.
        let (outcome, _) = grant(&mut user, 0, LevelUpPolicy::SingleStep);
        assert_eq!(outcome.new_level, 3);
        assert!(outcome.leveled_up);
    }

    #[test]
    fn until_settled_resolves_every_threshold() {
        let mut user = player(1, 0, 100);
        let (outcome, journal) = grant(&mut user, 300, LevelUpPolicy::UntilSettled);
        assert_eq!(outcome.new_level, 3);
        assert_eq!(outcome.levels_gained, 2);
        assert_eq!(outcome.reward, Decimal::from(70));
        assert_eq!(journal.len(), 2);
        // Level 4 is undefined, so the threshold doubles.
        assert_eq!(outcome.next_level_exp, 500);
        assert!(outcome.new_exp < outcome.next_level_exp);
    }

    #[test]
    fn last_defined_level_doubles_threshold() {
        let mut user = player(2, 240, 250);
        let (outcome, _) = grant(&mut user, 10, LevelUpPolicy::SingleStep);
        assert_eq!(outcome.new_level, 3);
        assert_eq!(outcome.next_level_exp, 500);
    }

    #[test]
    fn level_cap_accumulates_without_level_up() {
        let mut user = player(3, 490, 500);
        let (outcome, journal) = grant(&mut user, 50, LevelUpPolicy::UntilSettled);
        assert!(!outcome.leveled_up);
        assert_eq!(outcome.new_level, 3);
        assert_eq!(outcome.new_exp, 540);
        assert_eq!(outcome.next_level_exp, 500);
        assert!(journal.is_empty());
    }

    #[test]
    fn level_never_decreases() {
        let mut user = player(2, 100, 250);
        let before = user.level;
        let (outcome, _) = grant(&mut user, 1, LevelUpPolicy::SingleStep);
        assert!(outcome.new_level >= before);
    }
}
