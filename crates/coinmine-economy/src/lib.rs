//! Progression and economy engine for Coinmine.
//!
//! Players mine coins over time, gain experience and levels, claim a daily
//! bonus and spend coins in a shop that boosts their mining power. The
//! [`Economy`] engine evaluates these rules against snapshots read through a
//! [`LedgerStore`] and commits each operation as a single version-guarded
//! [`UserChange`](store::UserChange).
//!
//! # Modules
//!
//! - [`clock`] -- Injected time source ([`SystemClock`], [`ManualClock`]).
//! - [`config`] -- `coinmine.yaml` loading into strongly-typed structs.
//! - [`daily_bonus`] -- Calendar-day eligibility, streaks and bonus sizing.
//! - [`engine`] -- The [`Economy`] operations and their retry loop.
//! - [`error`] -- [`EconomyError`] and [`StoreError`].
//! - [`leaderboard`] -- Ranking order and page limits.
//! - [`leveling`] -- Experience thresholds and level rewards.
//! - [`memory`] -- [`MemoryStore`], an in-process store.
//! - [`mining`] -- Cooldown and accrual.
//! - [`response`] -- [`OperationResponse`] envelope for front ends.
//! - [`shop`] -- Purchase preconditions and effects.
//! - [`store`] -- The [`LedgerStore`] persistence interface.

pub mod clock;
pub mod config;
pub mod daily_bonus;
pub mod engine;
pub mod error;
pub mod leaderboard;
pub mod leveling;
pub mod memory;
pub mod mining;
pub mod response;
pub mod shop;
pub mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ConfigError, EconomyConfig};
pub use engine::Economy;
pub use error::{EconomyError, StoreError};
pub use memory::MemoryStore;
pub use response::{OperationResponse, Summary};
pub use store::{ItemGrant, LedgerStore, LevelTable, UserChange};
