//! Row-to-object materialization (§4.5): turn one adaptor [`Row`] into a
//! tracked [`GenericRecord`], uniquing against a [`TrackingContext`] when one
//! is in scope.

use std::sync::Arc;

use eo_adaptor::Row;
use eo_model::Entity;
use eo_object::{DatabaseObject, GenericRecord, TrackingContext};

/// Materializes `row` against `entity`. If `tracking_context` already holds
/// an object for the row's global ID, that instance is refreshed in place
/// and returned (object uniquing, §8 scenario 3); otherwise a fresh record
/// is built, its `awake_from_fetch` hook fires, and — if a tracking context
/// is present — it is registered under its global ID.
///
/// A row with no resolvable global ID (missing or incomplete primary key,
/// e.g. a `COUNT(*)` projection or a deliberately partial attribute list) is
/// never tracked: it is simply wrapped fresh every time.
pub fn materialize_row(
    entity: &Arc<Entity>,
    row: Row,
    tracking_context: Option<&mut TrackingContext<GenericRecord>>,
) -> Arc<GenericRecord> {
    let snapshot = row.into_snapshot();
    let global_id = entity.global_id_for_row(&snapshot);

    match (global_id, tracking_context) {
        (Some(global_id), Some(tracking_context)) => {
            if let Some(existing) = tracking_context.lookup(&global_id) {
                existing.refresh_from_row(&snapshot);
                return existing;
            }
            let mut fresh = GenericRecord::from_fetched_row(entity.clone(), snapshot);
            fresh.awake_from_fetch();
            tracking_context.register(global_id, Arc::new(fresh))
        }
        _ => {
            let mut fresh = GenericRecord::from_fetched_row(entity.clone(), snapshot);
            fresh.awake_from_fetch();
            Arc::new(fresh)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eo_model::{Attribute, ModelTag, Snapshot, ValueType};
    use eo_model::Model;
    use eo_value::Value;

    fn person() -> Arc<Entity> {
        let entity = Entity::builder("Person")
            .attribute(Attribute::new("id", ValueType::Int).required())
            .attribute(Attribute::new("name", ValueType::Text))
            .primary_key(vec!["id"])
            .build()
            .unwrap();
        let model = Model::new(vec![entity], ModelTag::new(1)).unwrap();
        model.entity("Person").unwrap().clone()
    }

    fn row(id: i64, name: &str) -> Row {
        Row::new(
            vec!["id".into(), "name".into()],
            vec![Some(Value::Int(id)), Some(Value::Text(name.into()))],
        )
    }

    #[test]
    fn two_fetches_of_the_same_row_return_the_same_instance() {
        let entity = person();
        let mut tracking = TrackingContext::new();

        let first = materialize_row(&entity, row(1, "Ada"), Some(&mut tracking));
        let second = materialize_row(&entity, row(1, "Ada Lovelace"), Some(&mut tracking));

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.value_for_key("name"), Some(Value::Text("Ada Lovelace".into())));
    }

    #[test]
    fn without_tracking_context_each_row_is_a_fresh_object() {
        let entity = person();
        let first = materialize_row(&entity, row(1, "Ada"), None);
        let second = materialize_row(&entity, row(1, "Ada"), None);
        assert!(!Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn row_without_a_resolvable_global_id_is_never_tracked() {
        let entity = person();
        let mut tracking = TrackingContext::new();
        let partial = Row::new(vec!["name".into()], vec![Some(Value::Text("Ada".into()))]);
        materialize_row(&entity, partial, Some(&mut tracking));
        assert!(tracking.is_empty());
    }

    #[test]
    fn unused_import_guard() {
        let _ = Snapshot::new();
    }
}
