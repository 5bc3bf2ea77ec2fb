//! The economy engine: every player-facing operation.
//!
//! Each operation follows the same shape:
//!
//! 1. Read a snapshot of the player (and any reference data it needs).
//! 2. Evaluate the game rules against the snapshot at the injected clock's
//!    "now", producing the next player state and a [`Journal`] of ledger
//!    entries. Nothing is written yet.
//! 3. Commit the whole result as one [`UserChange`].
//!
//! Leveling runs inside step 2 for the operations that grant experience, so
//! a level-up reward lands in the same commit as the coins that caused it.
//!
//! If the commit loses a race ([`StoreError::Conflict`]) the operation starts
//! over from step 1 against fresh state, up to
//! `engine.max_conflict_retries` times. Re-evaluation is what turns two
//! concurrent mining requests into one success and one cooldown refusal.
//!
//! [`StoreError::Conflict`]: crate::error::StoreError::Conflict

use std::sync::Arc;

use chrono::FixedOffset;
use tracing::{debug, error, info, warn};

use coinmine_ledger::Journal;
use coinmine_types::{
    BonusOutcome, ItemId, LeaderboardEntry, LevelOutcome, MineOutcome, PurchaseOutcome,
    ReconciliationReport, ShopItem, Transaction, User, UserId, UserProfile, STARTING_LEVEL,
};

use crate::clock::Clock;
use crate::config::{ConfigError, EconomyConfig};
use crate::error::EconomyError;
use crate::store::{LedgerStore, UserChange};
use crate::{daily_bonus, leaderboard, leveling, mining, shop};

/// The progression and economy engine over a [`LedgerStore`].
#[derive(Debug)]
pub struct Economy<S> {
    store: S,
    clock: Arc<dyn Clock>,
    config: EconomyConfig,
    tz: FixedOffset,
}

impl<S: LedgerStore> Economy<S> {
    /// Build an engine after validating `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the configuration is out of range.
    pub fn new(store: S, clock: Arc<dyn Clock>, config: EconomyConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let tz = config.daily_bonus.time_zone()?;
        Ok(Self {
            store,
            clock,
            config,
            tz,
        })
    }

    /// The underlying store.
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// The active configuration.
    pub const fn config(&self) -> &EconomyConfig {
        &self.config
    }

    // -----------------------------------------------------------------------
    // Registration and reads
    // -----------------------------------------------------------------------

    /// Return the player with `external_id`, registering it if needed.
    ///
    /// A new player starts at level 1 with the starting mining power and a
    /// threshold taken from the level table's second row.
    pub async fn ensure_user(&self, external_id: i64, display_name: &str) -> Result<User, EconomyError> {
        let name = display_name.trim();
        if name.is_empty() {
            return Err(EconomyError::InvalidArgument(
                "display name must not be empty".to_owned(),
            ));
        }

        let table = self.store.level_table().await?;
        let next_level_exp = STARTING_LEVEL
            .checked_add(1)
            .and_then(|second| table.get(second))
            .map_or(self.config.leveling.starting_next_level_exp, |d| d.exp_required);
        let candidate = User::new_player(external_id, name.to_owned(), next_level_exp, self.clock.now());

        let user = self.store.register_user(candidate).await?;
        info!(user_id = %user.id, external_id, "Player ready");
        Ok(user)
    }

    /// Look up a player by chat-platform identity.
    pub async fn find_user(&self, external_id: i64) -> Result<Option<User>, EconomyError> {
        Ok(self.store.fetch_user_by_external_id(external_id).await?)
    }

    /// A player with everything they own.
    pub async fn profile(&self, user_id: UserId) -> Result<UserProfile, EconomyError> {
        let user = self.load_user(user_id).await?;
        let items = self.store.inventory(user_id).await?;
        Ok(UserProfile { user, items })
    }

    /// A player's ledger entries, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`EconomyError::InvalidArgument`] for a zero limit.
    pub async fn history(
        &self,
        user_id: UserId,
        limit: Option<u32>,
    ) -> Result<Vec<Transaction>, EconomyError> {
        if limit == Some(0) {
            return Err(EconomyError::InvalidArgument(
                "history limit must be a positive integer".to_owned(),
            ));
        }
        self.load_user(user_id).await?;
        Ok(self.store.transactions(user_id, limit).await?)
    }

    /// The shop catalog, cheapest first.
    pub async fn catalog(&self) -> Result<Vec<ShopItem>, EconomyError> {
        Ok(self.store.catalog().await?)
    }

    /// The richest players, at most `limit` of them (capped at
    /// [`leaderboard::MAX_LIMIT`]).
    ///
    /// # Errors
    ///
    /// Returns [`EconomyError::InvalidArgument`] for a zero limit.
    pub async fn top_players(&self, limit: u32) -> Result<Vec<LeaderboardEntry>, EconomyError> {
        let limit = leaderboard::effective_limit(limit)?;
        Ok(self.store.top_players(limit).await?)
    }

    /// Compare a player's stored balance with the sum of their ledger.
    pub async fn reconcile(&self, user_id: UserId) -> Result<ReconciliationReport, EconomyError> {
        let user = self.load_user(user_id).await?;
        let entries = self.store.transactions(user_id, None).await?;
        let report = coinmine_ledger::reconcile(user_id, user.balance, &entries, self.clock.now())?;
        Ok(report)
    }

    // -----------------------------------------------------------------------
    // Operations
    // -----------------------------------------------------------------------

    /// Collect the coins accrued since the last mining action.
    pub async fn mine(&self, user_id: UserId) -> Result<MineOutcome, EconomyError> {
        let result = self.mine_with_retry(user_id).await;
        log_outcome("mine", user_id, &result);
        result
    }

    async fn mine_with_retry(&self, user_id: UserId) -> Result<MineOutcome, EconomyError> {
        let table = self.store.level_table().await?;
        let mut attempt: u32 = 0;
        loop {
            let user = self.load_user(user_id).await?;
            let now = self.clock.now();
            let mined = mining::accrue(&user, now, &self.config.mining)?;

            let mut next = user.clone();
            let mut journal = Journal::new(user_id, now);
            mining::apply(&mut next, &mined, now, &mut journal)?;
            let level = leveling::apply_experience(
                &mut next,
                mined.exp_gained,
                &table,
                &self.config.leveling,
                &mut journal,
            )?;
            let new_balance = next.balance;

            if self.try_commit(&UserChange::new(&user, next, journal), &mut attempt).await? {
                return Ok(MineOutcome {
                    message: format!(
                        "You mined {} coins and earned {} exp.{}",
                        mined.mined_coins.normalize(),
                        mined.exp_gained,
                        level_up_note(&level)
                    ),
                    mined_coins: mined.mined_coins,
                    exp_gained: mined.exp_gained,
                    new_balance,
                    level,
                });
            }
        }
    }

    /// Grant experience outside mining and bonus flows.
    ///
    /// Nothing is written when the grant changes nothing.
    pub async fn add_experience(&self, user_id: UserId, amount: u64) -> Result<LevelOutcome, EconomyError> {
        let result = self.add_experience_with_retry(user_id, amount).await;
        log_outcome("add_experience", user_id, &result);
        result
    }

    async fn add_experience_with_retry(
        &self,
        user_id: UserId,
        amount: u64,
    ) -> Result<LevelOutcome, EconomyError> {
        let table = self.store.level_table().await?;
        let mut attempt: u32 = 0;
        loop {
            let user = self.load_user(user_id).await?;
            let mut next = user.clone();
            let mut journal = Journal::new(user_id, self.clock.now());
            let outcome = leveling::apply_experience(
                &mut next,
                amount,
                &table,
                &self.config.leveling,
                &mut journal,
            )?;
            if next == user {
                return Ok(outcome);
            }
            if self.try_commit(&UserChange::new(&user, next, journal), &mut attempt).await? {
                return Ok(outcome);
            }
        }
    }

    /// Claim today's daily bonus.
    pub async fn claim_daily_bonus(&self, user_id: UserId) -> Result<BonusOutcome, EconomyError> {
        let result = self.claim_with_retry(user_id).await;
        log_outcome("claim_daily_bonus", user_id, &result);
        result
    }

    async fn claim_with_retry(&self, user_id: UserId) -> Result<BonusOutcome, EconomyError> {
        let table = self.store.level_table().await?;
        let mut attempt: u32 = 0;
        loop {
            let user = self.load_user(user_id).await?;
            let now = self.clock.now();
            let award = daily_bonus::evaluate(&user, now, &self.config.daily_bonus, self.tz)?;

            let mut next = user.clone();
            let mut journal = Journal::new(user_id, now);
            daily_bonus::apply(&mut next, &award, now, &mut journal)?;
            let level = leveling::apply_experience(
                &mut next,
                self.config.daily_bonus.experience,
                &table,
                &self.config.leveling,
                &mut journal,
            )?;
            let new_balance = next.balance;

            if self.try_commit(&UserChange::new(&user, next, journal), &mut attempt).await? {
                let weekend = if award.weekend { " Weekend bonus applied!" } else { "" };
                return Ok(BonusOutcome {
                    message: format!(
                        "Daily bonus claimed: {} coins (day {} streak).{weekend}{}",
                        award.bonus.normalize(),
                        award.streak,
                        level_up_note(&level)
                    ),
                    bonus: award.bonus,
                    new_balance,
                    streak: award.streak,
                    weekend: award.weekend,
                    level,
                });
            }
        }
    }

    /// Buy one unit of a shop item.
    pub async fn purchase(&self, user_id: UserId, item_id: ItemId) -> Result<PurchaseOutcome, EconomyError> {
        let result = self.purchase_with_retry(user_id, item_id).await;
        log_outcome("purchase", user_id, &result);
        result
    }

    async fn purchase_with_retry(
        &self,
        user_id: UserId,
        item_id: ItemId,
    ) -> Result<PurchaseOutcome, EconomyError> {
        let mut attempt: u32 = 0;
        loop {
            let user = self.load_user(user_id).await?;
            let item = self
                .store
                .fetch_item(item_id)
                .await?
                .ok_or(EconomyError::ItemNotFound(item_id))?;
            let owned = self.store.owned_quantity(user_id, item_id).await?;
            shop::check(&user, &item, owned)?;

            let mut next = user.clone();
            let mut journal = Journal::new(user_id, self.clock.now());
            let grant = shop::apply(&mut next, &item, &mut journal)?;
            let new_balance = next.balance;
            let mining_power = next.mining_power;

            let change = UserChange::new(&user, next, journal).with_item_grant(grant);
            if self.try_commit(&change, &mut attempt).await? {
                return Ok(PurchaseOutcome {
                    message: format!(
                        "You bought {}. Mining power is now {}.",
                        item.name,
                        mining_power.normalize()
                    ),
                    item_id,
                    quantity: owned.saturating_add(1),
                    new_balance,
                    mining_power,
                });
            }
        }
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    async fn load_user(&self, user_id: UserId) -> Result<User, EconomyError> {
        self.store
            .fetch_user(user_id)
            .await?
            .ok_or(EconomyError::UserNotFound(user_id))
    }

    /// Commit `change`. `Ok(false)` means the snapshot went stale and the
    /// caller should re-evaluate.
    async fn try_commit(&self, change: &UserChange, attempt: &mut u32) -> Result<bool, EconomyError> {
        match self.store.commit(change).await {
            Ok(()) => Ok(true),
            Err(err) if err.is_conflict() && *attempt < self.config.engine.max_conflict_retries => {
                *attempt = attempt.saturating_add(1);
                debug!(
                    user_id = %change.user.id,
                    attempt = *attempt,
                    error = %err,
                    "Stale snapshot, re-evaluating"
                );
                Ok(false)
            }
            Err(err) => Err(err.into()),
        }
    }
}

fn level_up_note(level: &LevelOutcome) -> String {
    if !level.leveled_up {
        return String::new();
    }
    if level.reward.is_zero() {
        format!(" Level up! You are now level {}.", level.new_level)
    } else {
        format!(
            " Level up! You are now level {} and earned {} coins.",
            level.new_level,
            level.reward.normalize()
        )
    }
}

fn log_outcome<T>(operation: &'static str, user_id: UserId, result: &Result<T, EconomyError>) {
    match result {
        Ok(_) => info!(operation, %user_id, "Operation committed"),
        Err(err) if err.is_business_rule() => {
            debug!(operation, %user_id, kind = ?err.kind(), reason = %err, "Operation refused");
        }
        Err(err @ EconomyError::PersistenceFailure(_)) => {
            error!(operation, %user_id, error = %err, "Operation failed, nothing committed");
        }
        Err(err) => warn!(operation, %user_id, error = %err, "Operation rejected"),
    }
}
