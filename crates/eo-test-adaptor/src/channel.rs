use std::sync::{Arc, Mutex};

use eo_adaptor::{AdaptorChannel, AdaptorError, AdaptorOperation, AdaptorOperationResult, Row};
use eo_model::Snapshot;
use eo_sql::{ExpressionFactory, SqlExpression};
use eo_value::Value;

use crate::factory::{PlanRegistry, TEST_SELECT_PREFIX};
use crate::store::{self, Tables};

/// A single connection to an [`crate::adaptor::InProcessAdaptor`]'s shared
/// tables. Outside a transaction, every operation applies straight to the
/// shared tables (autocommit); `begin()` switches to a private cloned copy
/// that `commit()` writes back wholesale and `rollback()` discards,
/// standing in for real transaction isolation.
pub struct TestAdaptorChannel {
    shared: Arc<Mutex<Tables>>,
    registry: Arc<PlanRegistry>,
    transaction: Option<Tables>,
}

impl TestAdaptorChannel {
    pub fn new(shared: Arc<Mutex<Tables>>, registry: Arc<PlanRegistry>) -> Self {
        TestAdaptorChannel { shared, registry, transaction: None }
    }

    fn with_tables<R>(&mut self, f: impl FnOnce(&mut Tables) -> R) -> R {
        match self.transaction.as_mut() {
            Some(tables) => f(tables),
            None => {
                let mut guard = self.shared.lock().expect("test adaptor tables lock poisoned");
                f(&mut guard)
            }
        }
    }
}

#[async_trait::async_trait]
impl AdaptorChannel for TestAdaptorChannel {
    async fn begin(&mut self) -> Result<(), AdaptorError> {
        if self.transaction.is_some() {
            return Err(AdaptorError::TransactionAlreadyInProgress);
        }
        let snapshot = self.shared.lock().expect("test adaptor tables lock poisoned").clone();
        self.transaction = Some(snapshot);
        Ok(())
    }

    async fn commit(&mut self) -> Result<(), AdaptorError> {
        let tables = self.transaction.take().ok_or(AdaptorError::NoTransactionInProgress)?;
        *self.shared.lock().expect("test adaptor tables lock poisoned") = tables;
        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), AdaptorError> {
        if self.transaction.take().is_none() {
            return Err(AdaptorError::NoTransactionInProgress);
        }
        Ok(())
    }

    fn is_transaction_in_progress(&self) -> bool {
        self.transaction.is_some()
    }

    async fn evaluate_query_expression(&mut self, expression: &SqlExpression) -> Result<Vec<Row>, AdaptorError> {
        let id: u64 = expression
            .statement
            .strip_prefix(TEST_SELECT_PREFIX)
            .and_then(|rest| rest.parse().ok())
            .ok_or_else(|| AdaptorError::execution(expression.statement.clone(), anyhow::anyhow!("not a recognized test-adaptor select token")))?;
        let plan = self
            .registry
            .take(id)
            .ok_or_else(|| AdaptorError::execution(expression.statement.clone(), anyhow::anyhow!("select plan already consumed or unknown")))?;

        let table = plan.entity.table_name_or_name().to_string();
        let mut rows: Vec<Snapshot> = self.with_tables(|tables| store::table_rows(tables, &table).to_vec());

        if let Some(qualifier) = plan.fetch_specification.qualifier() {
            rows.retain(|row| store::qualifier_matches(qualifier, row));
        }

        let is_count = plan.attributes.len() == 1 && plan.attributes[0].read_format() == Some("COUNT(*)");
        if is_count {
            return Ok(vec![Row::new(vec!["count".to_string()], vec![Some(Value::Int(rows.len() as i64))])]);
        }

        store::sort_rows(&mut rows, plan.fetch_specification.sort_orderings());

        if let Some(offset) = plan.fetch_specification.offset() {
            rows.drain(0..(offset as usize).min(rows.len()));
        }
        if let Some(limit) = plan.fetch_specification.limit() {
            rows.truncate(limit as usize);
        }

        let attribute_names: Vec<String> = plan.attributes.iter().map(|a| a.name().to_string()).collect();
        Ok(rows
            .into_iter()
            .map(|row| {
                let values = attribute_names.iter().map(|name| row.get(name).flatten().cloned()).collect();
                Row::new(attribute_names.clone(), values)
            })
            .collect())
    }

    async fn perform_adaptor_operation(
        &mut self,
        _factory: &dyn ExpressionFactory,
        operation: &AdaptorOperation,
    ) -> Result<AdaptorOperationResult, AdaptorError> {
        use eo_adaptor::AdaptorOperator;

        let table = operation.entity().table_name_or_name().to_string();
        match operation.operator() {
            AdaptorOperator::None => Ok(AdaptorOperationResult::default()),
            AdaptorOperator::Lock => {
                let matched = operation.qualifier().map_or(0, |qualifier| {
                    self.with_tables(|tables| store::table_rows(tables, &table).iter().filter(|row| store::qualifier_matches(qualifier, row)).count())
                });
                Ok(AdaptorOperationResult { affected_rows: matched as u64, result_row: None })
            }
            AdaptorOperator::Insert => {
                let row = operation
                    .row()
                    .ok_or_else(|| AdaptorError::execution(table.clone(), anyhow::anyhow!("insert operation carries no row")))?;
                let mut row = row.clone();
                let mut generated = Snapshot::new();
                for attribute in operation.entity().attributes() {
                    if attribute.is_auto_increment() && row.get(attribute.name()).flatten().is_none() {
                        let next = self.with_tables(|tables| store::next_auto_increment(tables, &table, attribute.name()));
                        row.set(attribute.name(), Some(Value::Int(next)));
                        generated.set(attribute.name(), Some(Value::Int(next)));
                    }
                }
                self.with_tables(|tables| store::insert_row(tables, &table, row));
                Ok(AdaptorOperationResult {
                    affected_rows: 1,
                    result_row: if generated.is_empty() { None } else { Some(generated) },
                })
            }
            AdaptorOperator::Update => {
                let row = operation
                    .row()
                    .ok_or_else(|| AdaptorError::execution(table.clone(), anyhow::anyhow!("update operation carries no row")))?;
                let qualifier = operation
                    .qualifier()
                    .ok_or_else(|| AdaptorError::execution(table.clone(), anyhow::anyhow!("update operation carries no qualifier")))?;
                let affected = self.with_tables(|tables| store::update_rows(tables, &table, qualifier, row));
                Ok(AdaptorOperationResult { affected_rows: affected, result_row: None })
            }
            AdaptorOperator::Delete => {
                let qualifier = operation
                    .qualifier()
                    .ok_or_else(|| AdaptorError::execution(table.clone(), anyhow::anyhow!("delete operation carries no qualifier")))?;
                let affected = self.with_tables(|tables| store::delete_rows(tables, &table, qualifier));
                Ok(AdaptorOperationResult { affected_rows: affected, result_row: None })
            }
        }
    }

    async fn query_sql(&mut self, statement: &str) -> Result<Vec<Row>, AdaptorError> {
        Err(AdaptorError::execution(statement.to_string(), anyhow::anyhow!("the in-process test adaptor does not execute raw SQL text")))
    }

    async fn perform_sql(&mut self, statement: &str) -> Result<u64, AdaptorError> {
        Err(AdaptorError::execution(statement.to_string(), anyhow::anyhow!("the in-process test adaptor does not execute raw SQL text")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eo_adaptor::AdaptorOperator;
    use eo_fetch::FetchSpecification;
    use eo_model::{Attribute, Entity, Model, ModelTag, ValueType};
    use eo_qualifier::{Operator, Qualifier};

    fn person_entity() -> Arc<eo_model::Entity> {
        let entity = Entity::builder("Person")
            .attribute(Attribute::new("id", ValueType::Int).required().auto_increment())
            .attribute(Attribute::new("name", ValueType::Text))
            .primary_key(vec!["id"])
            .build()
            .unwrap();
        let model = Model::new(vec![entity], ModelTag::new(1)).unwrap();
        model.entity("Person").unwrap().clone()
    }

    fn factory() -> (crate::factory::TestExpressionFactory, Arc<PlanRegistry>) {
        let registry = Arc::new(PlanRegistry::default());
        (crate::factory::TestExpressionFactory::new(registry.clone()), registry)
    }

    #[tokio::test]
    async fn insert_assigns_auto_increment_and_reports_it_as_generated() {
        let (factory, registry) = factory();
        let shared = Arc::new(Mutex::new(Tables::new()));
        let mut channel = TestAdaptorChannel::new(shared, registry);
        let entity = person_entity();
        let row = Snapshot::new().with("name", Some(Value::Text("Ada".into())));
        let op = AdaptorOperation::new(entity, AdaptorOperator::Insert).with_row(row);

        let result = channel.perform_adaptor_operation(&factory, &op).await.unwrap();
        assert_eq!(result.affected_rows, 1);
        assert_eq!(result.result_row.unwrap().get("id"), Some(Some(&Value::Int(1))));
    }

    #[tokio::test]
    async fn select_round_trips_through_factory_and_channel() {
        use eo_sql::ExpressionFactory;

        let (factory, registry) = factory();
        let shared = Arc::new(Mutex::new(Tables::new()));
        let entity = person_entity();
        {
            let mut tables = shared.lock().unwrap();
            store::insert_row(&mut tables, "Person", Snapshot::new().with("id", Some(Value::Int(1))).with("name", Some(Value::Text("Ada".into()))));
            store::insert_row(&mut tables, "Person", Snapshot::new().with("id", Some(Value::Int(2))).with("name", Some(Value::Text("Grace".into()))));
        }
        let mut channel = TestAdaptorChannel::new(shared, registry);

        let attrs: Vec<Attribute> = entity.attributes().cloned().collect();
        let fs = FetchSpecification::for_entity_named("Person").with_qualifier(Qualifier::key_value("name", Operator::Equal, Value::Text("Grace".into())));
        let expr = factory.select_expression(&attrs, false, &fs, &entity).unwrap();

        let rows = channel.evaluate_query_expression(&expr).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].value_for("name"), Some(Some(&Value::Text("Grace".into()))));
    }

    #[tokio::test]
    async fn rollback_discards_writes_made_inside_the_transaction() {
        let (factory, registry) = factory();
        let shared = Arc::new(Mutex::new(Tables::new()));
        let mut channel = TestAdaptorChannel::new(shared, registry);
        let entity = person_entity();

        channel.begin().await.unwrap();
        let row = Snapshot::new().with("name", Some(Value::Text("Ada".into())));
        channel.perform_adaptor_operation(&factory, &AdaptorOperation::new(entity.clone(), AdaptorOperator::Insert).with_row(row)).await.unwrap();
        channel.rollback().await.unwrap();

        let matched = channel
            .perform_adaptor_operation(
                &factory,
                &AdaptorOperation::new(entity, AdaptorOperator::Lock).with_qualifier(Qualifier::Boolean(true)),
            )
            .await
            .unwrap();
        assert_eq!(matched.affected_rows, 0);
    }
}
