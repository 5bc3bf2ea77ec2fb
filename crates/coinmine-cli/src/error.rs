//! Error types for the `coinmine` binary.
//!
//! Game-rule refusals are not errors here: they are printed as a failed
//! [`OperationResponse`](coinmine_economy::OperationResponse). [`CliError`]
//! covers everything that stops the command itself.

/// Top-level error for the `coinmine` binary.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: coinmine_economy::ConfigError,
    },

    /// The database could not be reached or migrated.
    #[error("database error: {source}")]
    Db {
        /// The underlying data layer error.
        #[from]
        source: coinmine_db::DbError,
    },

    /// An engine read failed outside the response envelope.
    #[error("engine error: {source}")]
    Economy {
        /// The underlying engine error.
        #[from]
        source: coinmine_economy::EconomyError,
    },

    /// No player is registered under the given chat identity.
    #[error("no player with external id {0}; run `coinmine register` first")]
    UnknownPlayer(i64),

    /// No shop item has the given slug.
    #[error("no shop item with slug {0:?}")]
    UnknownItem(String),

    /// Output could not be rendered.
    #[error("output error: {source}")]
    Output {
        /// The underlying JSON error.
        #[from]
        source: serde_json::Error,
    },
}
