//! [`Database`]: the facade described in §4.6 — fetch/find reads go through
//! [`eo_channel::DatabaseChannel`], writes are driven directly against a
//! borrowed [`eo_adaptor::AdaptorChannel`] since a save/delete batch's
//! transaction always commits on success, the opposite of a prefetch read's
//! always-rollback discipline.

use std::sync::Arc;

use eo_adaptor::{Adaptor, AdaptorOperator};
use eo_channel::DatabaseChannel;
use eo_fetch::FetchSpecification;
use eo_model::{Attribute, GlobalId, Model};
use eo_object::{DatabaseObject, GenericRecord, SnapshotHolding, TrackingContext};
use eo_qualifier::Qualifier;
use tracing::warn;

use crate::error::DatabaseError;
use crate::operation::{primary_key_qualifier, DatabaseOperation};

/// The single handle application code holds: wraps an [`Adaptor`] and
/// exposes the read/write operations of §4.6. Cheap to clone (an `Arc`
/// underneath); every method opens and releases its own channel rather than
/// holding one across calls, matching the acquire-use-release discipline of
/// §5.
pub struct Database {
    adaptor: Arc<dyn Adaptor>,
}

impl Database {
    pub fn new(adaptor: Arc<dyn Adaptor>) -> Self {
        Database { adaptor }
    }

    pub fn model(&self) -> &Arc<Model> {
        self.adaptor.model()
    }

    /// `fetchObjects(fs)`: collects every materialized object into a `Vec`.
    pub async fn fetch_objects(
        &self,
        fetch_specification: &FetchSpecification,
        mut tracking_context: Option<&mut TrackingContext<GenericRecord>>,
    ) -> Result<Vec<Arc<GenericRecord>>, DatabaseError> {
        let mut objects = Vec::new();
        self.fetch_objects_with(fetch_specification, tracking_context.as_deref_mut(), |object| objects.push(object)).await?;
        Ok(objects)
    }

    /// `fetchObjects(fs, yield)`: hands each materialized object to `sink` as
    /// it is produced rather than collecting them first.
    pub async fn fetch_objects_with(
        &self,
        fetch_specification: &FetchSpecification,
        tracking_context: Option<&mut TrackingContext<GenericRecord>>,
        mut sink: impl FnMut(Arc<GenericRecord>),
    ) -> Result<(), DatabaseError> {
        let mut channel = DatabaseChannel::open(self.adaptor.clone()).await?;
        channel.select_objects_with_fetch_specification(self.model(), fetch_specification, tracking_context).await?;
        while let Some(object) = channel.next_object() {
            sink(object);
        }
        channel.release().await;
        Ok(())
    }

    /// `fetchGlobalIDs(fs)`: rewrites `fetch_specification` to project only
    /// primary-key columns, disables prefetching, and skips object
    /// materialization entirely (raw rows decode directly to `GlobalId`).
    pub async fn fetch_global_ids(&self, fetch_specification: &FetchSpecification) -> Result<Vec<GlobalId>, DatabaseError> {
        let entity_name = fetch_specification.entity_name().ok_or(DatabaseError::MissingEntityName)?;
        let entity = self.model().entity(entity_name).ok_or_else(|| DatabaseError::UnknownEntity(entity_name.to_string()))?.clone();
        if entity.primary_key_attribute_names().is_empty() {
            return Err(DatabaseError::MissingPrimaryKey(entity_name.to_string()));
        }

        let gid_spec = fetch_specification
            .for_global_id_fetch(entity.primary_key_attribute_names().to_vec())
            .with_fetches_raw_rows(true);

        let mut channel = DatabaseChannel::open(self.adaptor.clone()).await?;
        channel.select_objects_with_fetch_specification(self.model(), &gid_spec, None).await?;

        let mut ids = Vec::new();
        while let Some(row) = channel.next_row() {
            if let Some(global_id) = entity.global_id_for_row(&row.into_snapshot()) {
                ids.push(global_id);
            }
        }
        channel.release().await;
        Ok(ids)
    }

    /// `fetchCount(fs)`: rewrites to the `COUNT(*)` pseudo-attribute, drops
    /// sort orderings, limits to one row. The pseudo-attribute isn't a real
    /// entity attribute, so this bypasses `DatabaseChannel` (which resolves
    /// fetch attribute names against the entity) and talks to a borrowed
    /// adaptor channel directly.
    pub async fn fetch_count(&self, fetch_specification: &FetchSpecification) -> Result<i64, DatabaseError> {
        let entity_name = fetch_specification.entity_name().ok_or(DatabaseError::MissingEntityName)?;
        let entity = self.model().entity(entity_name).ok_or_else(|| DatabaseError::UnknownEntity(entity_name.to_string()))?;

        let count_spec = fetch_specification.for_count_fetch("count");
        let count_attribute = Attribute::count_pseudo_attribute();
        let expression = self
            .adaptor
            .expression_factory()
            .select_expression(std::slice::from_ref(&count_attribute), false, &count_spec, entity)?;

        let mut channel = self.adaptor.open_channel_from_pool().await?;
        let rows = channel.evaluate_query_expression(&expression).await;
        self.adaptor.release_channel(channel).await;

        let row = rows?.into_iter().next().ok_or_else(|| DatabaseError::CountFetchReturnedNoRows(entity_name.to_string()))?;
        Ok(row.value_for("count").flatten().and_then(|value| value.as_i64()).unwrap_or(0))
    }

    /// `findBy(id)`: a limit-2 fetch by primary key, failing if more than
    /// one row matches (which would mean the primary key is not actually
    /// unique in storage).
    pub async fn find_by_id(
        &self,
        entity_name: &str,
        id: &GlobalId,
        tracking_context: Option<&mut TrackingContext<GenericRecord>>,
    ) -> Result<Option<Arc<GenericRecord>>, DatabaseError> {
        let fetch_specification = FetchSpecification::for_entity_named(entity_name).with_qualifier(primary_key_qualifier(id)).with_limit(2);
        self.find_by_fetch_specification(&fetch_specification, tracking_context).await
    }

    /// `findBy(qualifier)`: a limit-2 fetch by an arbitrary qualifier, failing
    /// if more than one row matches.
    pub async fn find_by_qualifier(
        &self,
        entity_name: &str,
        qualifier: Qualifier,
        tracking_context: Option<&mut TrackingContext<GenericRecord>>,
    ) -> Result<Option<Arc<GenericRecord>>, DatabaseError> {
        let fetch_specification = FetchSpecification::for_entity_named(entity_name).with_qualifier(qualifier).with_limit(2);
        self.find_by_fetch_specification(&fetch_specification, tracking_context).await
    }

    async fn find_by_fetch_specification(
        &self,
        fetch_specification: &FetchSpecification,
        tracking_context: Option<&mut TrackingContext<GenericRecord>>,
    ) -> Result<Option<Arc<GenericRecord>>, DatabaseError> {
        let mut objects = self.fetch_objects(fetch_specification, tracking_context).await?;
        match objects.len() {
            0 => Ok(None),
            1 => Ok(objects.pop()),
            count => Err(DatabaseError::FindByReturnedMultipleResults {
                entity: fetch_specification.entity_name().unwrap_or_default().to_string(),
                count,
            }),
        }
    }

    /// `save(object)`: chooses INSERT or UPDATE from `is_new_object` and
    /// runs it as a single-operation batch.
    pub async fn save<T: DatabaseObject + SnapshotHolding>(&self, object: &mut T) -> Result<(), DatabaseError> {
        let mut operation = DatabaseOperation::for_save(object)?;
        self.perform_database_operations(std::slice::from_mut(&mut operation)).await
    }

    /// `delete(object)`: deletes by the object's primary-key qualifier.
    pub async fn delete<T: DatabaseObject + SnapshotHolding>(&self, object: &mut T) -> Result<(), DatabaseError> {
        let mut operation = DatabaseOperation::for_delete(object)?;
        self.perform_database_operations(std::slice::from_mut(&mut operation)).await
    }

    /// Executes every operation's expanded adaptor-level work in one
    /// transaction, ordered `(entity name, operator ordinal)` across the
    /// whole batch (§4.6), committing on success and rolling back on the
    /// first failure. Each operation's `apply_generated_keys`/snapshot
    /// refresh runs only after the transaction has committed, so a rolled
    /// back batch never leaves an object's in-memory state ahead of storage.
    pub async fn perform_database_operations<T: DatabaseObject + SnapshotHolding>(
        &self,
        operations: &mut [DatabaseOperation<'_, T>],
    ) -> Result<(), DatabaseError> {
        let mut indexed: Vec<(usize, eo_adaptor::AdaptorOperation)> = operations
            .iter()
            .enumerate()
            .flat_map(|(index, operation)| operation.adaptor_operations().iter().cloned().map(move |op| (index, op)))
            .collect();
        indexed.sort_by(|(_, a), (_, b)| a.entity().name().cmp(b.entity().name()).then_with(|| a.operator().cmp(&b.operator())));

        if indexed.is_empty() {
            return Ok(());
        }

        let mut channel = self.adaptor.open_channel_from_pool().await?;
        channel.begin().await?;

        let factory = self.adaptor.expression_factory();
        let mut insert_results: Vec<(usize, Option<eo_model::Snapshot>)> = Vec::new();

        let outcome: Result<(), DatabaseError> = async {
            for (index, adaptor_operation) in &indexed {
                let result = channel.perform_adaptor_operation(factory, adaptor_operation).await?;
                if adaptor_operation.operator() == AdaptorOperator::Insert {
                    insert_results.push((*index, result.result_row));
                }
            }
            Ok(())
        }
        .await;

        match outcome {
            Ok(()) => {
                channel.commit().await?;
                self.adaptor.release_channel(channel).await;
                for (index, result_row) in insert_results {
                    operations[index].apply_generated_keys(result_row.as_ref())?;
                }
                for operation in operations.iter_mut() {
                    if operation.operator() == AdaptorOperator::Update {
                        operation.take_snapshot();
                    }
                }
                Ok(())
            }
            Err(error) => {
                if let Err(rollback_error) = channel.rollback().await {
                    warn!(%rollback_error, "failed to roll back failed database operation batch");
                }
                self.adaptor.release_channel(channel).await;
                Err(error)
            }
        }
    }
}
