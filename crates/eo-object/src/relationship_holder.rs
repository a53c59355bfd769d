use std::sync::Arc;

use crate::generic_record::GenericRecord;

/// Extension for objects that can hold the results of a to-many relationship
/// prefetch in memory, keyed by relationship name.
///
/// Prefetch only ever populates relationships between two [`GenericRecord`]s
/// (both sides of any relationship resolved through a [`eo_model::Model`]
/// share this same concrete type), so this is implemented directly on
/// `GenericRecord` rather than added to [`crate::DatabaseObject`] as a
/// general contract.
pub trait RelationshipHolder {
    /// Attaches `related` as the full to-many result set for `relationship_name`,
    /// replacing anything previously attached under that name.
    fn attach_to_many(&self, relationship_name: &str, related: Vec<Arc<GenericRecord>>);

    /// The previously attached to-many result set for `relationship_name`, if
    /// any prefetch has populated it.
    fn related_to_many(&self, relationship_name: &str) -> Option<Vec<Arc<GenericRecord>>>;
}

impl RelationshipHolder for GenericRecord {
    fn attach_to_many(&self, relationship_name: &str, related: Vec<Arc<GenericRecord>>) {
        self.related_store().write().expect("relationship lock poisoned").insert(relationship_name.to_string(), related);
    }

    fn related_to_many(&self, relationship_name: &str) -> Option<Vec<Arc<GenericRecord>>> {
        self.related_store().read().expect("relationship lock poisoned").get(relationship_name).cloned()
    }
}
