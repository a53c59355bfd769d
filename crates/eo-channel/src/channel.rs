//! [`DatabaseChannel`]: the fetch orchestrator described in §4.5 — drives
//! one [`AdaptorChannel`] through a primary SELECT, relationship prefetch,
//! and row-by-row materialization, handing results back lazily via
//! [`DatabaseChannel::next_object`]/[`DatabaseChannel::next_row`].

use std::collections::VecDeque;
use std::sync::Arc;

use eo_adaptor::{Adaptor, AdaptorChannel};
use eo_fetch::FetchSpecification;
use eo_model::Model;
use eo_object::{GenericRecord, TrackingContext};
use tracing::{debug, warn};

use crate::error::ChannelError;
use crate::materialize::materialize_row;
use crate::prefetch::prefetch_key_paths;

/// What a completed fetch produced: either tracked objects (the default) or
/// untouched rows (`fetch_specification.fetches_raw_rows()`, which skips
/// materialization and tracking entirely — §4.5's raw-rows branch).
enum FetchResult {
    Objects(VecDeque<Arc<GenericRecord>>),
    RawRows(VecDeque<eo_adaptor::Row>),
}

/// One logical fetch/save session over a single [`AdaptorChannel`].
///
/// A channel either opens its own underlying adaptor channel (and, for a
/// fetch with prefetches, its own transaction — §4.5 requires prefetch
/// levels to see a consistent snapshot) or borrows one handed to it by a
/// caller already holding a transaction open. `owns_channel`/
/// `owns_transaction` track which is which, so [`DatabaseChannel::
/// cancel_fetch`] and `Drop` know whether rolling back or releasing is this
/// channel's responsibility or its caller's.
pub struct DatabaseChannel {
    adaptor: Arc<dyn Adaptor>,
    adaptor_channel: Option<Box<dyn AdaptorChannel>>,
    owns_channel: bool,
    owns_transaction: bool,
    result: Option<FetchResult>,
}

impl DatabaseChannel {
    /// Opens a fresh channel from `adaptor`'s pool, owned by this
    /// `DatabaseChannel` for its whole lifetime.
    pub async fn open(adaptor: Arc<dyn Adaptor>) -> Result<Self, ChannelError> {
        let adaptor_channel = adaptor.open_channel_from_pool().await?;
        Ok(DatabaseChannel {
            adaptor,
            adaptor_channel: Some(adaptor_channel),
            owns_channel: true,
            owns_transaction: false,
            result: None,
        })
    }

    /// Wraps an already-open adaptor channel (e.g. one a `Database` is
    /// already driving a save through) without taking ownership of it: this
    /// channel will never release or roll it back.
    pub fn wrapping(adaptor: Arc<dyn Adaptor>, adaptor_channel: Box<dyn AdaptorChannel>) -> Self {
        DatabaseChannel {
            adaptor,
            adaptor_channel: Some(adaptor_channel),
            owns_channel: false,
            owns_transaction: false,
            result: None,
        }
    }

    pub fn is_fetch_in_progress(&self) -> bool {
        self.result.is_some()
    }

    /// Runs `fetch_specification` against `model` (§4.5). With no prefetch
    /// key paths this issues one primary SELECT and materializes rows
    /// lazily as [`DatabaseChannel::next_object`] is called; with prefetch
    /// key paths, the whole primary result set is pulled eagerly up front
    /// (every object must exist before any relationship can be attached to
    /// it) inside an owned transaction, rolled back on any failure partway
    /// through a prefetch level.
    pub async fn select_objects_with_fetch_specification(
        &mut self,
        model: &Arc<Model>,
        fetch_specification: &FetchSpecification,
        mut tracking_context: Option<&mut TrackingContext<GenericRecord>>,
    ) -> Result<(), ChannelError> {
        if self.is_fetch_in_progress() {
            return Err(ChannelError::FetchAlreadyInProgress);
        }

        let entity_name = fetch_specification.entity_name().ok_or(ChannelError::MissingEntityName)?;
        let entity = model.entity(entity_name).ok_or_else(|| ChannelError::UnknownEntity(entity_name.to_string()))?;

        let attributes: Vec<_> = match fetch_specification.fetch_attribute_names() {
            Some(names) => names.iter().filter_map(|name| entity.attribute(name).cloned()).collect(),
            None => entity.attributes().cloned().collect(),
        };

        let expression = self.adaptor.expression_factory().select_expression(
            &attributes,
            fetch_specification.locks_objects(),
            fetch_specification,
            entity,
        )?;

        debug!(entity = entity_name, prefetches = fetch_specification.has_prefetches(), "executing primary select");

        if fetch_specification.fetches_raw_rows() {
            let rows = self.channel_mut()?.evaluate_query_expression(&expression).await?;
            self.result = Some(FetchResult::RawRows(rows.into()));
            return Ok(());
        }

        if !fetch_specification.has_prefetches() {
            let rows = self.channel_mut()?.evaluate_query_expression(&expression).await?;
            let objects = rows
                .into_iter()
                .map(|row| materialize_row(entity, row, tracking_context.as_deref_mut()))
                .collect();
            self.result = Some(FetchResult::Objects(objects));
            return Ok(());
        }

        let began_transaction = !self.channel_mut()?.is_transaction_in_progress();
        if began_transaction {
            self.channel_mut()?.begin().await?;
            self.owns_transaction = true;
        }

        let outcome = self.run_fetch_with_prefetches(entity, &expression, fetch_specification, tracking_context).await;

        // Reads never commit (§4.5.2.e): an owned transaction only exists to
        // give every prefetch level a consistent snapshot, so it is always
        // rolled back here, success or failure alike.
        if self.owns_transaction {
            if let Err(rollback_error) = self.channel_mut()?.rollback().await {
                warn!(entity = entity_name, %rollback_error, "failed to roll back owned prefetch transaction");
            }
            self.owns_transaction = false;
        }

        match outcome {
            Ok(objects) => {
                self.result = Some(FetchResult::Objects(objects));
                Ok(())
            }
            Err(error) => {
                warn!(entity = entity_name, %error, "prefetch failed, transaction rolled back");
                Err(error)
            }
        }
    }

    async fn run_fetch_with_prefetches(
        &mut self,
        entity: &Arc<eo_model::Entity>,
        expression: &eo_sql::SqlExpression,
        fetch_specification: &FetchSpecification,
        mut tracking_context: Option<&mut TrackingContext<GenericRecord>>,
    ) -> Result<VecDeque<Arc<GenericRecord>>, ChannelError> {
        let rows = self.channel_mut()?.evaluate_query_expression(expression).await?;
        let objects: Vec<Arc<GenericRecord>> = rows
            .into_iter()
            .map(|row| materialize_row(entity, row, tracking_context.as_deref_mut()))
            .collect();

        let adaptor = self.adaptor.clone();
        prefetch_key_paths(
            adaptor.as_ref(),
            self.channel_mut()?.as_mut(),
            entity,
            &objects,
            fetch_specification.prefetching_relationship_key_paths(),
            tracking_context,
        )
        .await?;

        Ok(objects.into())
    }

    /// Pulls the next materialized object, if the last fetch produced
    /// objects (not raw rows) and has any left.
    pub fn next_object(&mut self) -> Option<Arc<GenericRecord>> {
        match self.result.as_mut() {
            Some(FetchResult::Objects(queue)) => queue.pop_front(),
            _ => None,
        }
    }

    /// Pulls the next raw row, if the last fetch specification set
    /// `fetches_raw_rows`.
    pub fn next_row(&mut self) -> Option<eo_adaptor::Row> {
        match self.result.as_mut() {
            Some(FetchResult::RawRows(queue)) => queue.pop_front(),
            _ => None,
        }
    }

    /// Drains and discards any remaining fetch results. Idempotent; rolls
    /// back an owned transaction still open and releases an owned channel
    /// back to the pool, mirroring what a successful fetch's own cleanup
    /// path does, so a caller can cancel mid-iteration without leaking
    /// either.
    pub async fn cancel_fetch(&mut self) -> Result<(), ChannelError> {
        self.result = None;
        if self.owns_transaction {
            if let Some(channel) = self.adaptor_channel.as_mut() {
                if channel.is_transaction_in_progress() {
                    channel.rollback().await?;
                }
            }
            self.owns_transaction = false;
        }
        if self.owns_channel {
            if let Some(channel) = self.adaptor_channel.take() {
                self.adaptor.release_channel(channel).await;
            }
            self.owns_channel = false;
        }
        Ok(())
    }

    /// Returns this channel's underlying adaptor channel to the pool if this
    /// `DatabaseChannel` owns it; otherwise a no-op, since the caller that
    /// lent it the channel is responsible for its lifecycle.
    pub async fn release(mut self) {
        if self.owns_channel {
            if let Some(channel) = self.adaptor_channel.take() {
                self.adaptor.release_channel(channel).await;
            }
        }
    }

    fn channel_mut(&mut self) -> Result<&mut Box<dyn AdaptorChannel>, ChannelError> {
        self.adaptor_channel.as_mut().ok_or(ChannelError::ChannelReleased)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eo_model::{Attribute, Entity, Join, ModelTag, Relationship, ValueType};
    use eo_object::RelationshipHolder;
    use eo_qualifier::{Operator, Qualifier};
    use eo_test_adaptor::InProcessAdaptor;
    use eo_value::Value;
    use std::time::Duration;

    fn model() -> Arc<Model> {
        let person = Entity::builder("Person")
            .attribute(Attribute::new("id", ValueType::Int).required())
            .attribute(Attribute::new("name", ValueType::Text))
            .primary_key(vec!["id"])
            .relationship(
                Relationship::new("addresses", true)
                    .with_destination_entity_name("Address")
                    .with_joins(vec![Join::new("id", "person_id")]),
            )
            .build()
            .unwrap();
        let address = Entity::builder("Address")
            .attribute(Attribute::new("id", ValueType::Int).required())
            .attribute(Attribute::new("person_id", ValueType::Int))
            .attribute(Attribute::new("city", ValueType::Text))
            .primary_key(vec!["id"])
            .build()
            .unwrap();
        Arc::new(Model::new(vec![person, address], ModelTag::new(1)).unwrap())
    }

    fn row(id: i64, name: &str) -> eo_model::Snapshot {
        eo_model::Snapshot::new().with("id", Some(Value::Int(id))).with("name", Some(Value::Text(name.to_string())))
    }

    fn address_row(id: i64, person_id: i64, city: &str) -> eo_model::Snapshot {
        eo_model::Snapshot::new()
            .with("id", Some(Value::Int(id)))
            .with("person_id", Some(Value::Int(person_id)))
            .with("city", Some(Value::Text(city.to_string())))
    }

    #[tokio::test]
    async fn fetch_without_prefetch_materializes_every_row() {
        let model = model();
        let adaptor = Arc::new(InProcessAdaptor::new(model.clone(), Duration::from_secs(60)));
        adaptor.seed("Person", vec![row(1, "Ada"), row(2, "Grace")]);

        let mut channel = DatabaseChannel::open(adaptor).await.unwrap();
        let fetch_specification = FetchSpecification::for_entity_named("Person");
        channel.select_objects_with_fetch_specification(&model, &fetch_specification, None).await.unwrap();

        let mut names = Vec::new();
        while let Some(object) = channel.next_object() {
            names.push(object.value_for_key("name").unwrap().as_str().unwrap().to_string());
        }
        assert_eq!(names, vec!["Ada", "Grace"]);
    }

    #[tokio::test]
    async fn two_fetches_of_the_same_object_are_unique_through_a_shared_tracking_context() {
        let model = model();
        let adaptor = Arc::new(InProcessAdaptor::new(model.clone(), Duration::from_secs(60)));
        adaptor.seed("Person", vec![row(1, "Ada")]);

        let mut tracking = TrackingContext::new();
        let fetch_specification =
            FetchSpecification::for_entity_named("Person").with_qualifier(Qualifier::key_value("id", Operator::Equal, Value::Int(1)));

        let mut first_channel = DatabaseChannel::open(adaptor.clone()).await.unwrap();
        first_channel
            .select_objects_with_fetch_specification(&model, &fetch_specification, Some(&mut tracking))
            .await
            .unwrap();
        let first = first_channel.next_object().unwrap();

        let mut second_channel = DatabaseChannel::open(adaptor).await.unwrap();
        second_channel
            .select_objects_with_fetch_specification(&model, &fetch_specification, Some(&mut tracking))
            .await
            .unwrap();
        let second = second_channel.next_object().unwrap();

        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn prefetch_attaches_to_many_relationship_in_one_batched_level() {
        let model = model();
        let adaptor = Arc::new(InProcessAdaptor::new(model.clone(), Duration::from_secs(60)));
        adaptor.seed("Person", vec![row(1, "Ada"), row(2, "Grace")]);
        adaptor.seed(
            "Address",
            vec![address_row(10, 1, "Boston"), address_row(11, 1, "Cambridge"), address_row(12, 2, "Seattle")],
        );

        let mut channel = DatabaseChannel::open(adaptor).await.unwrap();
        let fetch_specification =
            FetchSpecification::for_entity_named("Person").with_prefetching_relationship_key_paths(vec!["addresses".into()]);
        channel.select_objects_with_fetch_specification(&model, &fetch_specification, None).await.unwrap();

        let mut by_name = std::collections::HashMap::new();
        while let Some(object) = channel.next_object() {
            let name = object.value_for_key("name").unwrap().as_str().unwrap().to_string();
            let related = object.related_to_many("addresses").unwrap();
            by_name.insert(name, related.len());
        }
        assert_eq!(by_name.get("Ada"), Some(&2));
        assert_eq!(by_name.get("Grace"), Some(&1));
    }

    #[tokio::test]
    async fn cancel_fetch_releases_an_owned_channel_back_to_the_pool() {
        let model = model();
        let adaptor = Arc::new(InProcessAdaptor::new(model.clone(), Duration::from_secs(60)));
        adaptor.seed("Person", vec![row(1, "Ada")]);

        let mut channel = DatabaseChannel::open(adaptor.clone()).await.unwrap();
        let fetch_specification = FetchSpecification::for_entity_named("Person");
        channel.select_objects_with_fetch_specification(&model, &fetch_specification, None).await.unwrap();

        channel.cancel_fetch().await.unwrap();

        assert!(
            adaptor.has_pooled_channel().await,
            "cancel_fetch must return its owned channel to the pool instead of leaking it",
        );
    }

    #[tokio::test]
    async fn prefetch_attaches_shared_destination_to_every_matching_source() {
        let country = Entity::builder("Country")
            .attribute(Attribute::new("code", ValueType::Text).required())
            .attribute(Attribute::new("name", ValueType::Text))
            .primary_key(vec!["code"])
            .build()
            .unwrap();
        let person = Entity::builder("Person")
            .attribute(Attribute::new("id", ValueType::Int).required())
            .attribute(Attribute::new("name", ValueType::Text))
            .attribute(Attribute::new("country_code", ValueType::Text))
            .primary_key(vec!["id"])
            .relationship(
                Relationship::new("country", true)
                    .with_destination_entity_name("Country")
                    .with_joins(vec![Join::new("country_code", "code")]),
            )
            .build()
            .unwrap();
        let model = Arc::new(Model::new(vec![person, country], ModelTag::new(1)).unwrap());

        let adaptor = Arc::new(InProcessAdaptor::new(model.clone(), Duration::from_secs(60)));
        adaptor.seed(
            "Person",
            vec![
                eo_model::Snapshot::new()
                    .with("id", Some(Value::Int(1)))
                    .with("name", Some(Value::Text("Ada".into())))
                    .with("country_code", Some(Value::Text("UK".into()))),
                eo_model::Snapshot::new()
                    .with("id", Some(Value::Int(2)))
                    .with("name", Some(Value::Text("Grace".into())))
                    .with("country_code", Some(Value::Text("UK".into()))),
            ],
        );
        adaptor.seed(
            "Country",
            vec![eo_model::Snapshot::new().with("code", Some(Value::Text("UK".into()))).with("name", Some(Value::Text("United Kingdom".into())))],
        );

        let mut channel = DatabaseChannel::open(adaptor).await.unwrap();
        let fetch_specification =
            FetchSpecification::for_entity_named("Person").with_prefetching_relationship_key_paths(vec!["country".into()]);
        channel.select_objects_with_fetch_specification(&model, &fetch_specification, None).await.unwrap();

        let mut seen = 0;
        while let Some(object) = channel.next_object() {
            let related = object.related_to_many("country").unwrap();
            assert_eq!(related.len(), 1, "every person sharing a country code must still get it attached");
            seen += 1;
        }
        assert_eq!(seen, 2);
    }

    #[tokio::test]
    async fn raw_rows_fetch_skips_materialization() {
        let model = model();
        let adaptor = Arc::new(InProcessAdaptor::new(model.clone(), Duration::from_secs(60)));
        adaptor.seed("Person", vec![row(1, "Ada")]);

        let mut channel = DatabaseChannel::open(adaptor).await.unwrap();
        let fetch_specification = FetchSpecification::for_entity_named("Person").with_fetches_raw_rows(true);
        channel.select_objects_with_fetch_specification(&model, &fetch_specification, None).await.unwrap();

        let row = channel.next_row().unwrap();
        assert_eq!(row.value_for("name"), Some(Some(&Value::Text("Ada".into()))));
        assert!(channel.next_object().is_none());
    }
}
