use thiserror::Error;

use eo_adaptor::AdaptorError;
use eo_object::ObjectError;
use eo_sql::SqlError;

/// Configuration- and integrity-kind failures that belong to fetch
/// orchestration itself (§7), plus the adaptor/SQL-builder errors this
/// crate only ever re-wraps with the fetch specification/entity context
/// that produced them.
#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("fetch specification names no entity")]
    MissingEntityName,

    #[error("model has no entity named {0:?}")]
    UnknownEntity(String),

    #[error("entity {entity:?} has no relationship named {relationship:?}")]
    UnknownRelationship { entity: String, relationship: String },

    #[error("relationship {entity}.{relationship} has no joins to prefetch through")]
    RelationshipHasNoJoins { entity: String, relationship: String },

    #[error("relationship {entity}.{relationship} has no resolved destination entity; was connect_relationships() called on this model?")]
    UnresolvedDestination { entity: String, relationship: String },

    #[error("prefetch join value for entity {0:?} is not an integer or text key")]
    UnsupportedPrefetchKeyType(String),

    #[error("a fetch is already in progress on this channel")]
    FetchAlreadyInProgress,

    #[error("channel has already been released")]
    ChannelReleased,

    #[error(transparent)]
    Sql(#[from] SqlError),

    #[error(transparent)]
    Adaptor(#[from] AdaptorError),

    #[error(transparent)]
    Object(#[from] ObjectError),
}
