use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ObjectError {
    #[error("attribute {0:?} is not known to this object's entity")]
    UnknownAttribute(String),

    #[error("object has no entity and cannot compute a global identifier")]
    NoEntity,

    #[error("object is missing one or more primary-key values; cannot compute a global identifier")]
    IncompleteGlobalId,

    #[error("validation failed: {0}")]
    ValidationFailed(String),

    #[error("object has no snapshot to revert to")]
    NoSnapshot,
}
