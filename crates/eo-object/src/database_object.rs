use std::sync::Arc;

use eo_model::{Entity, GlobalId};
use eo_value::Value;

use crate::error::ObjectError;

/// The string-keyed accessor contract every mapped object implements.
///
/// Covers reading/writing attribute values by name, the `willRead`/
/// `willChange` notification hooks, and the insert/update/delete/save
/// validation points. None of this is async: accessor and validation work is
/// in-memory bookkeeping, with the suspension points living in `eo-adaptor`
/// and `eo-channel` instead.
pub trait DatabaseObject {
    /// The entity describing this object's shape. Used to derive its
    /// [`GlobalId`] and to validate attribute names passed to
    /// [`DatabaseObject::take_value_for_key`].
    fn entity(&self) -> &Arc<Entity>;

    /// Reads the current value for `key`. `None` means either the key is
    /// unknown to this object or its value is SQL `NULL`; callers that need
    /// to distinguish should consult `entity().attribute(key)` first.
    fn value_for_key(&self, key: &str) -> Option<Value>;

    /// Writes `value` for `key`, firing [`DatabaseObject::will_change`]
    /// first. Errors if `key` does not name an attribute on this object's
    /// entity.
    fn take_value_for_key(&mut self, key: &str, value: Option<Value>) -> Result<(), ObjectError>;

    /// Called immediately before any attribute of this object is read as
    /// part of a fetch. Default no-op; override to lazily fault in data.
    fn will_read(&self) {}

    /// Called once, right after a freshly materialized object has its
    /// snapshot applied and before it is handed to the caller or registered
    /// with a tracking context (§4.5's row-materialization step 3). Default
    /// no-op; override to fault in derived state that depends on the fetch
    /// having completed. Not called again on a uniquing hit (an object
    /// refreshed from a second fetch of the same row keeps running).
    fn awake_from_fetch(&mut self) {}

    /// Called immediately before any attribute of this object is mutated.
    /// Default no-op; override to fire observer notifications.
    fn will_change(&mut self) {}

    fn is_new_object(&self) -> bool;

    fn set_is_new_object(&mut self, is_new: bool);

    /// This object's identity, derived from its entity's primary-key
    /// attributes. `None` if the entity has no primary key or any key value
    /// is currently missing (e.g. an unsaved new object before insert).
    fn global_id(&self) -> Option<GlobalId> {
        let mut snapshot = eo_model::Snapshot::new();
        for pk_name in self.entity().primary_key_attribute_names() {
            snapshot.set(pk_name.clone(), self.value_for_key(pk_name));
        }
        self.entity().global_id_for_row(&snapshot)
    }

    fn validate_for_insert(&self) -> Result<(), ObjectError> {
        Ok(())
    }

    fn validate_for_update(&self) -> Result<(), ObjectError> {
        Ok(())
    }

    fn validate_for_delete(&self) -> Result<(), ObjectError> {
        Ok(())
    }

    /// Called for both inserts and updates before the corresponding
    /// validation method; the default dispatches on [`DatabaseObject::
    /// is_new_object`].
    fn validate_for_save(&self) -> Result<(), ObjectError> {
        if self.is_new_object() {
            self.validate_for_insert()
        } else {
            self.validate_for_update()
        }
    }
}

/// Extension for objects that additionally retain a [`eo_model::Snapshot`] of
/// their values as of the last fetch or save, supporting revert and
/// change-diffing without a second round-trip to storage.
pub trait SnapshotHolding: DatabaseObject {
    /// A copy of the held snapshot, if one has been taken. Returned by value
    /// rather than by reference so implementors may hold it behind a lock
    /// (needed to refresh a record in place while shared via `Arc`) without
    /// exposing a guard through this trait.
    fn snapshot(&self) -> Option<eo_model::Snapshot>;

    /// Replaces the held snapshot with the object's current values, as taken
    /// right after a successful fetch or save.
    fn take_snapshot(&mut self);

    /// Restores every attribute to its snapshot value. Errors if no snapshot
    /// has been taken yet.
    fn revert_to_snapshot(&mut self) -> Result<(), ObjectError>;

    /// Attribute names/values that differ between the object's current
    /// values and its snapshot. Empty if nothing changed since the snapshot
    /// was taken, or if there is no snapshot.
    fn changes_from_snapshot(&self) -> eo_model::Snapshot {
        let Some(snapshot) = self.snapshot() else {
            return eo_model::Snapshot::new();
        };
        let mut current = eo_model::Snapshot::new();
        for attribute in self.entity().attributes() {
            current.set(attribute.name().to_string(), self.value_for_key(attribute.name()));
        }
        current.changes_from(&snapshot)
    }
}
