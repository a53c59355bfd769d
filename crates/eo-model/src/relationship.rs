use std::sync::{Arc, RwLock};

use crate::entity::Entity;
use crate::join::Join;

/// What happens to the destination side of a to-one relationship when the
/// source object is deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteRule {
    Nullify,
    Cascade,
    Deny,
    NoAction,
    ApplyDefault,
}

/// A named link between two entities, realized by one or more [`Join`]s.
///
/// The relationship's *source* entity is always the entity it was obtained
/// from (`Entity::relationship`); there is no stored back-reference to it,
/// since one is redundant with how relationships are always reached. The
/// *destination* entity is genuinely looked up by name and is therefore
/// cached here once resolved, behind a lock so that `Model::
/// connect_relationships` can populate it without requiring `&mut Entity`
/// everywhere. `Model::disconnect_relationships` clears it back to `None`,
/// which is what breaks the `Arc` reference cycle between two entities that
/// relate to each other (see `eo-model`'s crate docs).
#[derive(Debug)]
pub struct Relationship {
    name: String,
    destination_entity_name: Option<String>,
    destination_entity: RwLock<Option<Arc<Entity>>>,
    joins: Vec<Join>,
    is_to_many: bool,
    delete_rule: DeleteRule,
    constraint_name: Option<String>,
}

impl Clone for Relationship {
    fn clone(&self) -> Self {
        let destination = self
            .destination_entity
            .read()
            .expect("relationship lock poisoned")
            .clone();
        Relationship {
            name: self.name.clone(),
            destination_entity_name: self.destination_entity_name.clone(),
            destination_entity: RwLock::new(destination),
            joins: self.joins.clone(),
            is_to_many: self.is_to_many,
            delete_rule: self.delete_rule,
            constraint_name: self.constraint_name.clone(),
        }
    }
}

impl Relationship {
    pub fn new(name: impl Into<String>, is_to_many: bool) -> Self {
        Relationship {
            name: name.into(),
            destination_entity_name: None,
            destination_entity: RwLock::new(None),
            joins: Vec::new(),
            is_to_many,
            delete_rule: DeleteRule::Nullify,
            constraint_name: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn destination_entity_name(&self) -> Option<&str> {
        self.destination_entity_name.as_deref()
    }

    pub fn with_destination_entity_name(mut self, name: impl Into<String>) -> Self {
        self.destination_entity_name = Some(name.into());
        self
    }

    /// The resolved destination entity, if `Model::connect_relationships`
    /// has run (and `disconnect_relationships` has not run since).
    pub fn destination_entity(&self) -> Option<Arc<Entity>> {
        self.destination_entity
            .read()
            .expect("relationship lock poisoned")
            .clone()
    }

    pub(crate) fn set_destination_entity(&self, entity: Option<Arc<Entity>>) {
        *self.destination_entity.write().expect("relationship lock poisoned") = entity;
    }

    pub fn joins(&self) -> &[Join] {
        &self.joins
    }

    pub fn with_joins(mut self, joins: Vec<Join>) -> Self {
        self.joins = joins;
        self
    }

    pub fn is_to_many(&self) -> bool {
        self.is_to_many
    }

    pub fn delete_rule(&self) -> DeleteRule {
        self.delete_rule
    }

    pub fn with_delete_rule(mut self, rule: DeleteRule) -> Self {
        self.delete_rule = rule;
        self
    }

    pub fn constraint_name(&self) -> Option<&str> {
        self.constraint_name.as_deref()
    }

    pub fn with_constraint_name(mut self, name: impl Into<String>) -> Self {
        self.constraint_name = Some(name.into());
        self
    }

    /// A to-one, non-empty-join relationship is a foreign-key relationship
    /// (§3 invariant).
    pub fn is_foreign_key_relationship(&self) -> bool {
        !self.is_to_many && !self.joins.is_empty()
    }
}
