//! Mining accrual: converts elapsed time and mining power into coins.
//!
//! A mining action is allowed once the cooldown has passed since the last
//! successful one. It credits `mining_power` coins per elapsed minute, with
//! the elapsed time capped so that an idle player collects at most
//! `max_accrual_minutes` worth. A player who never mined collects the full
//! capped window.
//!
//! Experience is granted at `exp_per_coin` per coin, floored.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use coinmine_ledger::Journal;
use coinmine_types::User;

use crate::config::MiningConfig;
use crate::error::EconomyError;

/// Decimal places kept on credited coins.
pub const COIN_SCALE: u32 = 4;

const MILLIS_PER_SECOND: u64 = 1_000;
const MILLIS_PER_MINUTE: u64 = 60_000;

/// What a permitted mining action yields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MiningYield {
    /// Coins to credit.
    pub mined_coins: Decimal,
    /// Experience to grant.
    pub exp_gained: u64,
}

/// Check the cooldown and compute what mining at `now` yields.
///
/// # Errors
///
/// Returns [`EconomyError::CooldownNotElapsed`] with the whole seconds left
/// (rounded up) when the cooldown has not passed, or
/// [`EconomyError::Overflow`] if the yield cannot be represented.
pub fn accrue(
    user: &User,
    now: DateTime<Utc>,
    config: &MiningConfig,
) -> Result<MiningYield, EconomyError> {
    let cap_ms = config
        .max_accrual_minutes
        .checked_mul(MILLIS_PER_MINUTE)
        .ok_or(EconomyError::Overflow("computing the accrual cap"))?;

    let accrued_ms = match user.last_mining {
        None => cap_ms,
        Some(last) => {
            // A last_mining in the future (clock skew) counts as zero elapsed.
            let elapsed_ms = u64::try_from(now.signed_duration_since(last).num_milliseconds())
                .unwrap_or(0);
            let cooldown_ms = config
                .cooldown_secs
                .checked_mul(MILLIS_PER_SECOND)
                .ok_or(EconomyError::Overflow("computing the cooldown"))?;
            if elapsed_ms < cooldown_ms {
                let remaining_ms = cooldown_ms.saturating_sub(elapsed_ms);
                return Err(EconomyError::CooldownNotElapsed {
                    remaining_secs: remaining_ms.div_ceil(MILLIS_PER_SECOND),
                });
            }
            elapsed_ms.min(cap_ms)
        }
    };

    let minutes = Decimal::from(accrued_ms)
        .checked_div(Decimal::from(MILLIS_PER_MINUTE))
        .ok_or(EconomyError::Overflow("converting elapsed time"))?;
    let mined_coins = user
        .mining_power
        .checked_mul(minutes)
        .ok_or(EconomyError::Overflow("computing mined coins"))?
        .round_dp(COIN_SCALE);

    let exp_gained = mined_coins
        .checked_mul(config.exp_per_coin)
        .ok_or(EconomyError::Overflow("computing mining experience"))?
        .floor()
        .to_u64()
        .ok_or(EconomyError::Overflow("converting mining experience"))?;

    Ok(MiningYield {
        mined_coins,
        exp_gained,
    })
}

/// Apply a mining yield to `user`, staging its ledger entry.
///
/// # Errors
///
/// Returns [`EconomyError::Overflow`] if the balance overflows, or
/// [`EconomyError::Ledger`] if the entry cannot be staged.
pub fn apply(
    user: &mut User,
    mined: &MiningYield,
    now: DateTime<Utc>,
    journal: &mut Journal,
) -> Result<(), EconomyError> {
    user.balance = user
        .balance
        .checked_add(mined.mined_coins)
        .ok_or(EconomyError::Overflow("crediting mined coins"))?;
    user.last_mining = Some(now);
    if !mined.mined_coins.is_zero() {
        journal.record_mining(mined.mined_coins)?;
    }
    Ok(())
}
