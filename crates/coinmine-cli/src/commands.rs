//! Player and read commands, executed against the engine.
//!
//! Every command prints one JSON [`OperationResponse`]. A refused game rule
//! (cooldown, already claimed, not enough coins) is a normal response with
//! `success: false`, not a process failure.

use serde::Serialize;

use coinmine_db::PgLedgerStore;
use coinmine_economy::{Economy, EconomyError, OperationResponse, Summary};
use coinmine_types::UserId;

use crate::error::CliError;

/// A command that runs through the engine.
#[derive(Debug, Clone, PartialEq, Eq, clap::Subcommand)]
pub enum PlayerCommand {
    /// Register a player (idempotent on the external id)
    Register {
        /// Chat-platform identity
        external_id: i64,
        /// Name shown on the leaderboard
        display_name: String,
    },

    /// Collect mined coins
    Mine {
        /// Chat-platform identity
        external_id: i64,
    },

    /// Claim the daily bonus
    Bonus {
        /// Chat-platform identity
        external_id: i64,
    },

    /// Buy one unit of a shop item
    Buy {
        /// Chat-platform identity
        external_id: i64,
        /// Item slug, e.g. `pickaxe`
        slug: String,
    },

    /// Grant experience directly
    Exp {
        /// Chat-platform identity
        external_id: i64,
        /// Experience points to grant
        amount: u64,
    },

    /// Show the leaderboard
    Top {
        /// Number of players to show (at most 100)
        #[arg(short, long, default_value_t = coinmine_economy::leaderboard::DEFAULT_LIMIT)]
        limit: u32,
    },

    /// Show a player's profile and inventory
    Profile {
        /// Chat-platform identity
        external_id: i64,
    },

    /// Show a player's ledger, newest first
    History {
        /// Chat-platform identity
        external_id: i64,
        /// Number of entries to show
        #[arg(short, long)]
        limit: Option<u32>,
    },

    /// List the shop catalog
    Shop,

    /// Check a player's balance against their ledger
    Reconcile {
        /// Chat-platform identity
        external_id: i64,
    },
}

/// Run `command` and render its response as pretty JSON.
///
/// # Errors
///
/// Returns [`CliError`] if the player or item cannot be resolved or the
/// output cannot be rendered.
pub async fn execute(
    command: PlayerCommand,
    economy: &Economy<PgLedgerStore>,
) -> Result<String, CliError> {
    match command {
        PlayerCommand::Register {
            external_id,
            display_name,
        } => render(economy.ensure_user(external_id, &display_name).await),
        PlayerCommand::Mine { external_id } => {
            let id = resolve_player(economy, external_id).await?;
            render(economy.mine(id).await)
        }
        PlayerCommand::Bonus { external_id } => {
            let id = resolve_player(economy, external_id).await?;
            render(economy.claim_daily_bonus(id).await)
        }
        PlayerCommand::Buy { external_id, slug } => {
            let id = resolve_player(economy, external_id).await?;
            let item = economy
                .store()
                .item_by_slug(&slug)
                .await?
                .ok_or(CliError::UnknownItem(slug))?;
            render(economy.purchase(id, item.id).await)
        }
        PlayerCommand::Exp {
            external_id,
            amount,
        } => {
            let id = resolve_player(economy, external_id).await?;
            render(economy.add_experience(id, amount).await)
        }
        PlayerCommand::Top { limit } => render(economy.top_players(limit).await),
        PlayerCommand::Profile { external_id } => {
            let id = resolve_player(economy, external_id).await?;
            render(economy.profile(id).await)
        }
        PlayerCommand::History { external_id, limit } => {
            let id = resolve_player(economy, external_id).await?;
            render(economy.history(id, limit).await)
        }
        PlayerCommand::Shop => render(economy.catalog().await),
        PlayerCommand::Reconcile { external_id } => {
            let id = resolve_player(economy, external_id).await?;
            render(economy.reconcile(id).await)
        }
    }
}

async fn resolve_player(economy: &Economy<PgLedgerStore>, external_id: i64) -> Result<UserId, CliError> {
    economy
        .find_user(external_id)
        .await?
        .map(|user| user.id)
        .ok_or(CliError::UnknownPlayer(external_id))
}

fn render<T: Summary + Serialize>(result: Result<T, EconomyError>) -> Result<String, CliError> {
    let response = OperationResponse::from_result(result);
    Ok(serde_json::to_string_pretty(&response)?)
}
