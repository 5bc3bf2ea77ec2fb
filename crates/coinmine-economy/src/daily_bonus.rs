//! Daily bonus eligibility, streaks and reward sizing.
//!
//! Claim windows are calendar days in a configured time zone, not rolling
//! 24-hour periods: a claim at 23:59 and another at 00:01 the next day are
//! both allowed. The streak grows by one when the previous claim fell on the
//! previous calendar day and restarts at one otherwise.
//!
//! Two reward formulas are available (see [`BonusStrategy`]); the streak
//! formula is the default and the only one that applies the weekend
//! multiplier.

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, Utc, Weekday};
use rust_decimal::Decimal;

use coinmine_ledger::Journal;
use coinmine_types::User;

use crate::config::{BonusStrategy, DailyBonusConfig};
use crate::error::EconomyError;
use crate::mining::COIN_SCALE;

/// What a permitted claim yields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BonusAward {
    /// Coins to credit.
    pub bonus: Decimal,
    /// Streak after this claim.
    pub streak: u32,
    /// Whether the weekend multiplier was applied.
    pub weekend: bool,
}

/// The calendar day of `at` in `tz`.
pub fn calendar_day(at: DateTime<Utc>, tz: FixedOffset) -> NaiveDate {
    at.with_timezone(&tz).date_naive()
}

/// The instant the calendar day after `day` begins in `tz`.
///
/// # Errors
///
/// Returns [`EconomyError::Overflow`] at the end of the representable range.
pub fn start_of_next_day(day: NaiveDate, tz: FixedOffset) -> Result<DateTime<Utc>, EconomyError> {
    day.succ_opt()
        .and_then(|next| next.and_hms_opt(0, 0, 0))
        .and_then(|midnight| midnight.and_local_timezone(tz).single())
        .map(|local| local.with_timezone(&Utc))
        .ok_or(EconomyError::Overflow("computing the next claim window"))
}

/// Check eligibility and size the bonus for a claim at `now`.
///
/// # Errors
///
/// Returns [`EconomyError::AlreadyClaimed`] when the last claim falls on the
/// same calendar day as `now` (or later, under clock skew), or
/// [`EconomyError::Overflow`] if the reward cannot be represented.
pub fn evaluate(
    user: &User,
    now: DateTime<Utc>,
    config: &DailyBonusConfig,
    tz: FixedOffset,
) -> Result<BonusAward, EconomyError> {
    let today = calendar_day(now, tz);
    let last_day = user.last_bonus_at.map(|at| calendar_day(at, tz));

    if last_day.is_some_and(|last| last >= today) {
        return Err(EconomyError::AlreadyClaimed {
            next_claim_at: start_of_next_day(today, tz)?,
        });
    }

    let streak = if last_day.is_some() && last_day == today.pred_opt() {
        user.bonus_streak.saturating_add(1)
    } else {
        1
    };
    let weekend = matches!(today.weekday(), Weekday::Sat | Weekday::Sun);

    let (bonus, weekend_applied) = match config.strategy {
        BonusStrategy::Streak => {
            let bonus = streak_bonus(streak, weekend, config)?;
            (bonus, weekend)
        }
        BonusStrategy::Level => (level_bonus(user.level, config)?, false),
    };

    Ok(BonusAward {
        bonus: bonus.round_dp(COIN_SCALE),
        streak,
        weekend: weekend_applied,
    })
}

/// `streak_base * (1 + (streak - 1) * streak_step)`, times the weekend
/// multiplier on Saturday and Sunday.
fn streak_bonus(
    streak: u32,
    weekend: bool,
    config: &DailyBonusConfig,
) -> Result<Decimal, EconomyError> {
    let counted = config.streak_cap.map_or(streak, |cap| streak.min(cap));
    let extra_days = Decimal::from(counted.saturating_sub(1));
    let multiplier = extra_days
        .checked_mul(config.streak_step)
        .and_then(|growth| growth.checked_add(Decimal::ONE))
        .ok_or(EconomyError::Overflow("computing the streak multiplier"))?;
    let mut bonus = config
        .streak_base
        .checked_mul(multiplier)
        .ok_or(EconomyError::Overflow("computing the streak bonus"))?;
    if weekend {
        bonus = bonus
            .checked_mul(config.weekend_multiplier)
            .ok_or(EconomyError::Overflow("applying the weekend multiplier"))?;
    }
    Ok(bonus)
}

/// `level_base + level * level_rate`.
fn level_bonus(level: u32, config: &DailyBonusConfig) -> Result<Decimal, EconomyError> {
    Decimal::from(level)
        .checked_mul(config.level_rate)
        .and_then(|scaled| scaled.checked_add(config.level_base))
        .ok_or(EconomyError::Overflow("computing the level bonus"))
}

/// Apply a claim to `user`, staging its ledger entry.
///
/// # Errors
///
/// Returns [`EconomyError::Overflow`] if the balance overflows, or
/// [`EconomyError::Ledger`] if the entry cannot be staged.
pub fn apply(
    user: &mut User,
    award: &BonusAward,
    now: DateTime<Utc>,
    journal: &mut Journal,
) -> Result<(), EconomyError> {
    user.balance = user
        .balance
        .checked_add(award.bonus)
        .ok_or(EconomyError::Overflow("crediting the daily bonus"))?;
    user.last_bonus_at = Some(now);
    user.bonus_streak = award.streak;
    if award.bonus > Decimal::ZERO {
        journal.record_daily_bonus(award.bonus, award.streak)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Offset, TimeDelta, TimeZone};

    fn utc() -> FixedOffset {
        Utc.fix()
    }

    /// Wednesday 2026-10-14 at the given UTC time.
    fn wednesday(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 14, hour, minute, 0)
            .single()
            .unwrap_or_default()
    }

    fn claimant(last_bonus_at: Option<DateTime<Utc>>, streak: u32) -> User {
        let mut user = User::new_player(1, "c".to_owned(), 100, Utc::now());
        user.last_bonus_at = last_bonus_at;
        user.bonus_streak = streak;
        user
    }

    #[test]
    fn first_claim_starts_streak() {
        let user = claimant(None, 0);
        let award = evaluate(&user, wednesday(12, 0), &DailyBonusConfig::default(), utc()).ok();
        assert_eq!(
            award,
            Some(BonusAward {
                bonus: Decimal::from(100),
                streak: 1,
                weekend: false,
            })
        );
    }

    #[test]
    fn same_day_claim_rejected() {
        let user = claimant(Some(wednesday(0, 5)), 1);
        let result = evaluate(&user, wednesday(23, 59), &DailyBonusConfig::default(), utc());
        let next = Utc.with_ymd_and_hms(2026, 10, 15, 0, 0, 0).single();
        assert!(matches!(
            result,
            Err(EconomyError::AlreadyClaimed { next_claim_at }) if Some(next_claim_at) == next
        ));
    }

    #[test]
    fn consecutive_day_extends_streak() {
        let user = claimant(Some(wednesday(23, 59) - TimeDelta::days(1)), 3);
        let award = evaluate(&user, wednesday(0, 1), &DailyBonusConfig::default(), utc()).ok();
        assert_eq!(award.map(|a| a.streak), Some(4));
        // 100 * (1 + 3 * 0.10)
        assert_eq!(award.map(|a| a.bonus), Some(Decimal::from(130)));
    }

    #[test]
    fn gap_resets_streak() {
        let user = claimant(Some(wednesday(12, 0) - TimeDelta::days(2)), 9);
        let award = evaluate(&user, wednesday(12, 0), &DailyBonusConfig::default(), utc()).ok();
        assert_eq!(award.map(|a| a.streak), Some(1));
        assert_eq!(award.map(|a| a.bonus), Some(Decimal::from(100)));
    }

    #[test]
    fn weekend_doubles_streak_bonus() {
        let saturday = wednesday(12, 0) + TimeDelta::days(3);
        let user = claimant(Some(saturday - TimeDelta::days(1)), 1);
        let award = evaluate(&user, saturday, &DailyBonusConfig::default(), utc()).ok();
        assert_eq!(award.map(|a| a.weekend), Some(true));
        // 100 * 1.1 * 2
        assert_eq!(award.map(|a| a.bonus), Some(Decimal::from(220)));
    }

    #[test]
    fn streak_cap_limits_multiplier() {
        let config = DailyBonusConfig {
            streak_cap: Some(3),
            ..DailyBonusConfig::default()
        };
        let user = claimant(Some(wednesday(12, 0) - TimeDelta::days(1)), 10);
        let award = evaluate(&user, wednesday(12, 0), &config, utc()).ok();
        assert_eq!(award.map(|a| a.streak), Some(11));
        assert_eq!(award.map(|a| a.bonus), Some(Decimal::from(120)));
    }

    #[test]
    fn level_strategy_scales_with_level() {
        let config = DailyBonusConfig {
            strategy: BonusStrategy::Level,
            ..DailyBonusConfig::default()
        };
        let mut user = claimant(None, 0);
        user.level = 4;
        let saturday = wednesday(12, 0) + TimeDelta::days(3);
        let award = evaluate(&user, saturday, &config, utc()).ok();
        // 50 + 4 * 10, no weekend multiplier
        assert_eq!(award.map(|a| a.bonus), Some(Decimal::from(90)));
        assert_eq!(award.map(|a| a.weekend), Some(false));
    }

    #[test]
    fn calendar_day_follows_time_zone() {
        // 22:30 UTC Wednesday is already Thursday at UTC+3.
        let tz = FixedOffset::east_opt(3 * 3600).unwrap_or_else(utc);
        let user = claimant(Some(wednesday(12, 0)), 1);
        let award = evaluate(&user, wednesday(22, 30), &DailyBonusConfig::default(), tz).ok();
        assert_eq!(award.map(|a| a.streak), Some(2));

        // The same pair of instants is one day in UTC.
        let result = evaluate(&user, wednesday(22, 30), &DailyBonusConfig::default(), utc());
        assert!(matches!(result, Err(EconomyError::AlreadyClaimed { .. })));
    }

    #[test]
    fn apply_updates_streak_state() {
        let now = wednesday(9, 0);
        let mut user = claimant(None, 0);
        let mut journal = Journal::new(user.id, now);
        let award = BonusAward {
            bonus: Decimal::from(100),
            streak: 1,
            weekend: false,
        };
        assert!(apply(&mut user, &award, now, &mut journal).is_ok());
        assert_eq!(user.balance, Decimal::from(100));
        assert_eq!(user.last_bonus_at, Some(now));
        assert_eq!(user.bonus_streak, 1);
        assert_eq!(journal.len(), 1);
    }
}
