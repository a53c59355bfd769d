//! [`DatabaseOperation`]: the object-level unit of work `Database::save`/
//! `Database::delete` build and `Database::perform_database_operations`
//! executes (§4.6). Each operation carries enough to both synthesize its
//! SQL (the expanded [`AdaptorOperation`] list) and, once that SQL has run,
//! fold the result back into the originating object (`apply_generated_keys`).

use std::sync::Arc;

use eo_adaptor::{AdaptorOperation, AdaptorOperator};
use eo_model::{Entity, GlobalId, Snapshot};
use eo_object::{DatabaseObject, SnapshotHolding};
use eo_qualifier::{Operator, Qualifier};

use crate::error::DatabaseError;

/// One object's pending insert/update/delete, plus the dialect-agnostic
/// [`AdaptorOperation`] sequence it expands into.
///
/// Borrows its object for the operation's whole lifetime: `apply_generated_keys`
/// needs to write back into it once the expanded operations have executed,
/// through the same `&mut T` a caller already holds to have built this in
/// the first place.
pub struct DatabaseOperation<'a, T: DatabaseObject + SnapshotHolding> {
    object: &'a mut T,
    entity: Arc<Entity>,
    operator: AdaptorOperator,
    pre_image: Option<Snapshot>,
    post_image: Snapshot,
    adaptor_operations: Vec<AdaptorOperation>,
}

impl<'a, T: DatabaseObject + SnapshotHolding> DatabaseOperation<'a, T> {
    /// Builds an insert or update operation from `object`'s current state,
    /// dispatching on `is_new_object` the way `save` does (§4.6).
    pub fn for_save(object: &'a mut T) -> Result<Self, DatabaseError> {
        if object.is_new_object() {
            Self::for_insert(object)
        } else {
            Self::for_update(object)
        }
    }

    pub fn for_insert(object: &'a mut T) -> Result<Self, DatabaseError> {
        object.validate_for_insert()?;
        let entity = object.entity().clone();
        let mut row = Snapshot::new();
        for attribute in entity.attributes() {
            if attribute.is_auto_increment() && object.value_for_key(attribute.name()).is_none() {
                continue;
            }
            row.set(attribute.name().to_string(), object.value_for_key(attribute.name()));
        }
        let adaptor_operation = AdaptorOperation::new(entity.clone(), AdaptorOperator::Insert).with_row(row.clone());
        Ok(DatabaseOperation {
            object,
            entity,
            operator: AdaptorOperator::Insert,
            pre_image: None,
            post_image: row,
            adaptor_operations: vec![adaptor_operation],
        })
    }

    pub fn for_update(object: &'a mut T) -> Result<Self, DatabaseError> {
        object.validate_for_update()?;
        let entity = object.entity().clone();
        let global_id = object.global_id().ok_or_else(|| DatabaseError::MissingPrimaryKey(entity.name().to_string()))?;
        let pre_image = object.snapshot();
        let changes = object.changes_from_snapshot();

        if changes.is_empty() {
            return Ok(DatabaseOperation {
                object,
                entity,
                operator: AdaptorOperator::None,
                pre_image,
                post_image: Snapshot::new(),
                adaptor_operations: Vec::new(),
            });
        }

        let qualifier = primary_key_qualifier(&global_id);
        let adaptor_operation = AdaptorOperation::new(entity.clone(), AdaptorOperator::Update).with_row(changes.clone()).with_qualifier(qualifier);
        Ok(DatabaseOperation {
            object,
            entity,
            operator: AdaptorOperator::Update,
            pre_image,
            post_image: changes,
            adaptor_operations: vec![adaptor_operation],
        })
    }

    pub fn for_delete(object: &'a mut T) -> Result<Self, DatabaseError> {
        object.validate_for_delete()?;
        let entity = object.entity().clone();
        let global_id = object.global_id().ok_or_else(|| DatabaseError::MissingPrimaryKey(entity.name().to_string()))?;
        let pre_image = object.snapshot();
        let qualifier = primary_key_qualifier(&global_id);
        let adaptor_operation = AdaptorOperation::new(entity.clone(), AdaptorOperator::Delete).with_qualifier(qualifier);
        Ok(DatabaseOperation {
            object,
            entity,
            operator: AdaptorOperator::Delete,
            pre_image,
            post_image: Snapshot::new(),
            adaptor_operations: vec![adaptor_operation],
        })
    }

    pub fn entity(&self) -> &Arc<Entity> {
        &self.entity
    }

    pub fn operator(&self) -> AdaptorOperator {
        self.operator
    }

    pub fn pre_image(&self) -> Option<&Snapshot> {
        self.pre_image.as_ref()
    }

    pub fn post_image(&self) -> &Snapshot {
        &self.post_image
    }

    pub fn adaptor_operations(&self) -> &[AdaptorOperation] {
        &self.adaptor_operations
    }

    /// Whether this operation expands to any adaptor-level work at all. An
    /// update with no changes since the last snapshot expands to nothing
    /// (§4.6 doesn't name this case explicitly, but issuing a no-op UPDATE
    /// would be indistinguishable from a successful one to the caller while
    /// wasting a round trip).
    pub fn is_noop(&self) -> bool {
        self.adaptor_operations.is_empty()
    }

    /// Folds a completed insert's generated primary-key values back into the
    /// originating object through its normal accessor contract, so
    /// `will_change` fires the same way a direct caller-driven write would,
    /// then marks the object no longer new (§4.6's post-insert hook).
    ///
    /// Called for every insert once its adaptor operation has executed,
    /// whether or not the adaptor actually returned any generated columns.
    pub fn apply_generated_keys(&mut self, result_row: Option<&Snapshot>) -> Result<(), DatabaseError> {
        if let Some(result_row) = result_row {
            for (name, value) in result_row.iter() {
                self.object.take_value_for_key(name, value.cloned())?;
            }
        }
        self.object.set_is_new_object(false);
        self.object.take_snapshot();
        Ok(())
    }

    /// Refreshes the held snapshot baseline after a successful, non-insert
    /// write so a later `changes_from_snapshot` diffs against the row as it
    /// now stands in storage.
    pub fn take_snapshot(&mut self) {
        self.object.take_snapshot();
    }
}

pub(crate) fn primary_key_qualifier(global_id: &GlobalId) -> Qualifier {
    Qualifier::and(global_id.keys().into_iter().map(|(name, value)| Qualifier::key_value(name, Operator::Equal, value)))
}
