use thiserror::Error;

use eo_adaptor::AdaptorError;
use eo_channel::ChannelError;
use eo_object::ObjectError;
use eo_sql::SqlError;

/// Configuration-, integrity-, and lifecycle-kind failures the
/// `Database`/`DataSource` facade raises itself (§7), plus the lower-layer
/// errors it only ever re-wraps with facade-level context.
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("fetch specification names no entity")]
    MissingEntityName,

    #[error("model has no entity named {0:?}")]
    UnknownEntity(String),

    #[error("entity {0:?} has no primary key; cannot compute a global identifier for it")]
    MissingPrimaryKey(String),

    #[error("find-by fetch against {entity:?} returned {count} results, expected at most one")]
    FindByReturnedMultipleResults { entity: String, count: usize },

    #[error("count fetch against {0:?} returned no rows")]
    CountFetchReturnedNoRows(String),

    #[error(transparent)]
    Channel(#[from] ChannelError),

    #[error(transparent)]
    Object(#[from] ObjectError),

    #[error(transparent)]
    Sql(#[from] SqlError),

    #[error(transparent)]
    Adaptor(#[from] AdaptorError),
}
