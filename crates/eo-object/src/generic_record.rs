use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use eo_model::{Entity, Snapshot};
use eo_value::Value;

use crate::database_object::{DatabaseObject, SnapshotHolding};
use crate::error::ObjectError;

/// A [`DatabaseObject`] backed by a plain value bag rather than compiled-in
/// accessors, for callers without (or not wanting) a typed record struct per
/// entity.
///
/// Values, snapshot, and new-object state live behind `RwLock` rather than as
/// plain fields so that a channel holding this record only through `Arc`
/// (the shape `TrackingContext` hands back once an object is registered) can
/// still refresh it in place from a later fetch of the same row, via
/// [`GenericRecord::refresh_from_row`], without needing a second unique
/// owner.
#[derive(Debug)]
pub struct GenericRecord {
    entity: Arc<Entity>,
    values: RwLock<Snapshot>,
    snapshot: RwLock<Option<Snapshot>>,
    is_new: RwLock<bool>,
    related: RwLock<HashMap<String, Vec<Arc<GenericRecord>>>>,
}

impl Clone for GenericRecord {
    fn clone(&self) -> Self {
        GenericRecord {
            entity: self.entity.clone(),
            values: RwLock::new(self.values.read().expect("generic record lock poisoned").clone()),
            snapshot: RwLock::new(self.snapshot.read().expect("generic record lock poisoned").clone()),
            is_new: RwLock::new(*self.is_new.read().expect("generic record lock poisoned")),
            related: RwLock::new(self.related.read().expect("generic record lock poisoned").clone()),
        }
    }
}

impl GenericRecord {
    pub fn new(entity: Arc<Entity>) -> Self {
        GenericRecord {
            entity,
            values: RwLock::new(Snapshot::new()),
            snapshot: RwLock::new(None),
            is_new: RwLock::new(true),
            related: RwLock::new(HashMap::new()),
        }
    }

    /// Builds a record from a fully-populated row, as freshly fetched from
    /// storage: not new, and its snapshot is taken immediately.
    pub fn from_fetched_row(entity: Arc<Entity>, row: Snapshot) -> Self {
        let record = GenericRecord {
            entity,
            values: RwLock::new(row),
            snapshot: RwLock::new(None),
            is_new: RwLock::new(false),
            related: RwLock::new(HashMap::new()),
        };
        record.take_snapshot();
        record
    }

    /// Overwrites this record's values and snapshot with `row`, callable
    /// through a shared reference so a channel can refresh an object that is
    /// already registered in a [`crate::TrackingContext`] and therefore only
    /// reachable as `Arc<GenericRecord>`. Does not touch `is_new` or any
    /// attached relationships.
    pub fn refresh_from_row(&self, row: &Snapshot) {
        *self.values.write().expect("generic record lock poisoned") = row.clone();
        *self.snapshot.write().expect("generic record lock poisoned") = Some(row.clone());
    }

    pub(crate) fn related_store(&self) -> &RwLock<HashMap<String, Vec<Arc<GenericRecord>>>> {
        &self.related
    }
}

impl DatabaseObject for GenericRecord {
    fn entity(&self) -> &Arc<Entity> {
        &self.entity
    }

    fn value_for_key(&self, key: &str) -> Option<Value> {
        self.values.read().expect("generic record lock poisoned").get(key).flatten().cloned()
    }

    fn take_value_for_key(&mut self, key: &str, value: Option<Value>) -> Result<(), ObjectError> {
        if self.entity.attribute(key).is_none() {
            return Err(ObjectError::UnknownAttribute(key.to_string()));
        }
        self.will_change();
        self.values.get_mut().expect("generic record lock poisoned").set(key.to_string(), value);
        Ok(())
    }

    fn is_new_object(&self) -> bool {
        *self.is_new.read().expect("generic record lock poisoned")
    }

    fn set_is_new_object(&mut self, is_new: bool) {
        *self.is_new.get_mut().expect("generic record lock poisoned") = is_new;
    }
}

impl SnapshotHolding for GenericRecord {
    fn snapshot(&self) -> Option<Snapshot> {
        self.snapshot.read().expect("generic record lock poisoned").clone()
    }

    fn take_snapshot(&mut self) {
        let current = self.values.get_mut().expect("generic record lock poisoned").clone();
        *self.snapshot.get_mut().expect("generic record lock poisoned") = Some(current);
    }

    fn revert_to_snapshot(&mut self) -> Result<(), ObjectError> {
        let snapshot = self.snapshot.get_mut().expect("generic record lock poisoned").clone().ok_or(ObjectError::NoSnapshot)?;
        self.will_change();
        *self.values.get_mut().expect("generic record lock poisoned") = snapshot;
        Ok(())
    }
}
