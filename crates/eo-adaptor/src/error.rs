use thiserror::Error;

use eo_sql::SqlError;

/// Driver/IO and lifecycle failures at the adaptor boundary (§7's
/// "Driver/I-O" and "Lifecycle" kinds). Configuration- and integrity-kind
/// errors are reported by the layers above this crate (`eo-channel`,
/// `eo-database`), which have the fetch-specification/entity context those
/// variants need; this crate only ever sees a statement and, at most, the
/// connection itself.
#[derive(Debug, Error)]
pub enum AdaptorError {
    #[error("could not acquire an adaptor channel: {0}")]
    ChannelUnavailable(String),

    #[error("failed to build SQL expression: {0}")]
    Sql(#[from] SqlError),

    #[error("SQL execution failed for statement {statement:?}: {source}")]
    Execution {
        statement: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("no transaction is in progress on this channel")]
    NoTransactionInProgress,

    #[error("a transaction is already in progress on this channel")]
    TransactionAlreadyInProgress,

    #[error("channel pool slot is occupied")]
    PoolSlotOccupied,
}

impl AdaptorError {
    pub fn execution(statement: impl Into<String>, source: impl Into<anyhow::Error>) -> Self {
        AdaptorError::Execution {
            statement: statement.into(),
            source: source.into(),
        }
    }
}
