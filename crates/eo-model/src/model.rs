use std::sync::Arc;

use indexmap::IndexMap;

use crate::entity::Entity;
use crate::error::ModelError;

/// Opaque identifier distinguishing one `Model` instance from another,
/// primarily useful for cache invalidation in layers above this crate (a
/// connected channel or pool can compare tags to notice a model swap without
/// holding a strong reference to the old one).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModelTag(u64);

impl ModelTag {
    pub fn new(value: u64) -> Self {
        ModelTag(value)
    }
}

/// A complete collection of [`Entity`] descriptions, with relationships
/// resolved against each other.
///
/// `Model` itself holds entities behind `Arc` so that resolved relationship
/// back-references ([`crate::relationship::Relationship::destination_entity`])
/// can share ownership without cloning the whole `Entity`. Constructing a
/// `Model` through [`Model::new`] automatically resolves those references via
/// [`Model::connect_relationships`]; dropping a `Model` does not automatically
/// disconnect them, so any code that intends to discard a model and reuse its
/// entities independently must call [`Model::disconnect_relationships`]
/// first, or the `Arc` cycle between mutually-relating entities keeps both
/// alive indefinitely.
#[derive(Debug)]
pub struct Model {
    tag: ModelTag,
    entities: IndexMap<String, Arc<Entity>>,
}

impl Model {
    /// Builds a model from a flat list of entities, validates entity-name
    /// uniqueness and relationship destinations, and resolves relationships.
    pub fn new(entities: Vec<Entity>, tag: ModelTag) -> Result<Self, ModelError> {
        let mut by_name = IndexMap::with_capacity(entities.len());
        for entity in entities {
            if by_name.insert(entity.name().to_string(), Arc::new(entity)).is_some() {
                return Err(ModelError::DuplicateEntityName(
                    by_name.keys().last().cloned().unwrap_or_default(),
                ));
            }
        }

        let model = Model { tag, entities: by_name };
        model.validate_relationship_destinations()?;
        model.connect_relationships();
        Ok(model)
    }

    pub fn tag(&self) -> ModelTag {
        self.tag
    }

    pub fn entity(&self, name: &str) -> Option<&Arc<Entity>> {
        self.entities.get(name)
    }

    pub fn entity_or_err(&self, name: &str) -> Result<&Arc<Entity>, ModelError> {
        self.entity(name).ok_or_else(|| ModelError::NoSuchEntity(name.to_string()))
    }

    pub fn entities(&self) -> impl Iterator<Item = &Arc<Entity>> {
        self.entities.values()
    }

    /// All entities sharing a backing table, keyed by `external_name` (the
    /// `[entityGroup:]` lookup of §4.2, used by DDL generation to collapse
    /// an inheritance hierarchy back onto one `CREATE TABLE`).
    ///
    /// `Entity::table_name_or_name` already falls back from `external_name`
    /// to the entity's own `name`, so a lookup by `external_name` matches
    /// entities that set it explicitly and, when none do, the lone entity
    /// whose bare name equals it.
    pub fn entity_group(&self, external_name: &str) -> Vec<&Arc<Entity>> {
        self.entities.values().filter(|e| e.table_name_or_name() == external_name).collect()
    }

    /// Resolves an entity by its mapped class name (the class-name half of
    /// `entityForObject`; the static-type half has no equivalent in a
    /// strongly-typed target, since a `DatabaseObject` impl already carries
    /// its `Entity` directly — see §9).
    pub fn entity_for_class_name(&self, class_name: &str) -> Option<&Arc<Entity>> {
        self.entities.values().find(|e| e.class_name() == Some(class_name))
    }

    fn validate_relationship_destinations(&self) -> Result<(), ModelError> {
        for entity in self.entities.values() {
            for relationship in entity.relationships() {
                if let Some(destination_name) = relationship.destination_entity_name() {
                    if !self.entities.contains_key(destination_name) {
                        return Err(ModelError::UnknownDestinationEntity {
                            entity: entity.name().to_string(),
                            relationship: relationship.name().to_string(),
                            destination: destination_name.to_string(),
                        });
                    }
                }
            }
        }
        Ok(())
    }

    /// Resolves every relationship's `destination_entity` cache to the
    /// matching `Arc<Entity>` in this model. Idempotent; safe to call again
    /// after [`Model::disconnect_relationships`] to re-establish the cycle.
    pub fn connect_relationships(&self) {
        for entity in self.entities.values() {
            for relationship in entity.relationships() {
                let resolved = relationship
                    .destination_entity_name()
                    .and_then(|name| self.entities.get(name))
                    .cloned();
                relationship.set_destination_entity(resolved);
            }
        }
    }

    /// Clears every relationship's cached `destination_entity`, breaking the
    /// `Arc` reference cycle between entities that relate to each other so
    /// this model (and its entities) can actually be dropped.
    pub fn disconnect_relationships(&self) {
        for entity in self.entities.values() {
            for relationship in entity.relationships() {
                relationship.set_destination_entity(None);
            }
        }
    }

    /// Combines `self` with `other`, with `other`'s entities overriding
    /// same-named entities in `self` (the pattern-model merge described in
    /// §3: prototype entities are replaced wholesale by concrete overrides
    /// sharing their name, not merged field-by-field). Relationships are
    /// re-resolved against the combined entity set.
    pub fn merge(&self, other: &Model, tag: ModelTag) -> Result<Model, ModelError> {
        let mut combined: IndexMap<String, Entity> = IndexMap::new();
        for entity in self.entities.values() {
            combined.insert(entity.name().to_string(), (**entity).clone());
        }
        for entity in other.entities.values() {
            combined.insert(entity.name().to_string(), (**entity).clone());
        }
        Model::new(combined.into_values().collect(), tag)
    }
}
