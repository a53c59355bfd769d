use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    #[error("entity {entity:?} has no attribute named {attribute:?}")]
    UnknownAttribute { entity: String, attribute: String },

    #[error("entity {entity:?} declares primary key attribute {attribute:?} which does not exist")]
    UnknownPrimaryKeyAttribute { entity: String, attribute: String },

    #[error("entity {entity:?} has more than one relationship named {relationship:?}")]
    DuplicateRelationshipName { entity: String, relationship: String },

    #[error("entity {entity:?} has more than one attribute named {attribute:?}")]
    DuplicateAttributeName { entity: String, attribute: String },

    #[error("entity name {0:?} is not unique within the model")]
    DuplicateEntityName(String),

    #[error("relationship {entity}.{relationship:?} names destination entity {destination:?}, which is not present in the model")]
    UnknownDestinationEntity {
        entity: String,
        relationship: String,
        destination: String,
    },

    #[error("relationship {entity}.{relationship:?} has a join whose source attribute {attribute:?} does not exist on {entity:?}")]
    UnresolvedJoinSourceAttribute {
        entity: String,
        relationship: String,
        attribute: String,
    },

    #[error("relationship {entity}.{relationship:?} has a join whose destination attribute {attribute:?} does not exist on {destination:?}")]
    UnresolvedJoinDestinationAttribute {
        entity: String,
        relationship: String,
        destination: String,
        attribute: String,
    },

    #[error("no entity named {0:?} in this model")]
    NoSuchEntity(String),
}
