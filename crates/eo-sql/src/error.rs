use std::collections::HashSet;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SqlError {
    #[error("entity {entity:?} has no attribute named {attribute:?}")]
    UnknownAttribute { entity: String, attribute: String },

    #[error("entity {entity:?} has no relationship named {relationship:?}")]
    UnknownRelationship { entity: String, relationship: String },

    #[error("key path {0:?} is empty")]
    EmptyKeyPath(String),

    #[error("fetch specification has no entity name")]
    MissingEntityName,

    #[error("qualifier has unresolved binding variables: {0:?}")]
    UnresolvedBindings(Vec<String>),

    #[error("row has no values to write for entity {0:?}")]
    EmptyRow(String),

    #[error("key comparisons are not supported across a relationship key path: {0:?}")]
    KeyComparisonAcrossRelationship(String),
}

impl SqlError {
    pub fn unresolved_bindings(keys: HashSet<String>) -> Self {
        let mut keys: Vec<String> = keys.into_iter().collect();
        keys.sort();
        SqlError::UnresolvedBindings(keys)
    }
}
