//! [`ExpressionFactory`]: the single object-safe entry point `eo-adaptor` and
//! `eo-channel` hold a trait object of, so they never match on [`DialectKind`]
//! themselves. Each concrete factory is a zero-sized wrapper around its
//! [`Dialect`] impl; the statement-synthesis logic itself lives once in
//! [`crate::select`]/[`crate::dml`]/[`crate::ddl`] and is shared by all four.

use std::sync::Arc;

use eo_fetch::FetchSpecification;
use eo_model::{Attribute, Entity, Model, Snapshot};
use eo_qualifier::Qualifier;

use crate::ddl::{create_table_statements_for_entities, drop_table_statements_for_entities};
use crate::dialect::Dialect;
use crate::dialects::{AnsiDialect, MySqlDialect, PostgresDialect, SqliteDialect};
use crate::dml::{build_delete, build_insert, build_update};
use crate::error::SqlError;
use crate::expression::SqlExpression;
use crate::select::build_select;

/// Synthesizes every SQL statement an adaptor needs, parameterized only by
/// the [`Dialect`] each implementor carries. Every method has a default
/// implementation delegating to the dialect-agnostic builders in this crate;
/// a dialect only needs to exist (implement [`Dialect`]) to get a complete,
/// correct factory for free via one of the four wrapper structs below.
pub trait ExpressionFactory: Send + Sync {
    fn dialect(&self) -> &dyn Dialect;

    fn select_expression(
        &self,
        attributes: &[Attribute],
        lock: bool,
        fetch_specification: &FetchSpecification,
        entity: &Arc<Entity>,
    ) -> Result<SqlExpression, SqlError> {
        build_select(self.dialect(), attributes, lock, fetch_specification, entity)
    }

    fn insert_expression(&self, entity: &Arc<Entity>, row: &Snapshot) -> Result<SqlExpression, SqlError> {
        build_insert(self.dialect(), entity, row)
    }

    fn update_expression(&self, entity: &Arc<Entity>, row: &Snapshot, qualifier: &Qualifier) -> Result<SqlExpression, SqlError> {
        build_update(self.dialect(), entity, row, qualifier)
    }

    fn delete_expression(&self, entity: &Arc<Entity>, qualifier: &Qualifier) -> Result<SqlExpression, SqlError> {
        build_delete(self.dialect(), entity, qualifier)
    }

    fn create_table_statements(&self, model: &Model) -> Vec<String> {
        create_table_statements_for_entities(self.dialect(), model)
    }

    fn drop_table_statements(&self, model: &Model) -> Vec<String> {
        drop_table_statements_for_entities(self.dialect(), model)
    }
}

macro_rules! expression_factory {
    ($name:ident, $dialect:ty) => {
        #[derive(Debug, Clone, Copy, Default)]
        pub struct $name($dialect);

        impl ExpressionFactory for $name {
            fn dialect(&self) -> &dyn Dialect {
                &self.0
            }
        }
    };
}

expression_factory!(AnsiExpressionFactory, AnsiDialect);
expression_factory!(PostgresExpressionFactory, PostgresDialect);
expression_factory!(MySqlExpressionFactory, MySqlDialect);
expression_factory!(SqliteExpressionFactory, SqliteDialect);

#[cfg(test)]
mod tests {
    use super::*;
    use eo_model::{ModelTag, ValueType};
    use eo_qualifier::Operator;
    use eo_value::Value;

    fn model() -> Model {
        let entity = Entity::builder("Person")
            .attribute(Attribute::new("id", ValueType::Int).required().auto_increment())
            .attribute(Attribute::new("name", ValueType::Text))
            .primary_key(vec!["id"])
            .build()
            .unwrap();
        Model::new(vec![entity], ModelTag::new(1)).unwrap()
    }

    #[test]
    fn postgres_factory_returns_generated_keys() {
        let model = model();
        let person = model.entity("Person").unwrap().clone();
        let factory = PostgresExpressionFactory::default();
        let mut row = Snapshot::new();
        row.set("name", Some(Value::Text("Ada".into())));
        let expr = factory.insert_expression(&person, &row).unwrap();
        assert!(expr.statement.contains("RETURNING"));
    }

    #[test]
    fn sqlite_factory_has_no_lock_clause() {
        let model = model();
        let person = model.entity("Person").unwrap().clone();
        let factory = SqliteExpressionFactory::default();
        let attrs: Vec<Attribute> = person.attributes().cloned().collect();
        let fs = FetchSpecification::for_entity_named("Person")
            .with_qualifier(Qualifier::key_value("id", Operator::Equal, Value::Int(1)));
        let expr = factory.select_expression(&attrs, true, &fs, &person).unwrap();
        assert!(!expr.statement.contains("FOR UPDATE"));
    }

    #[test]
    fn create_table_statements_delegate_to_ddl() {
        let model = model();
        let factory = MySqlExpressionFactory::default();
        let statements = factory.create_table_statements(&model);
        assert_eq!(statements.len(), 1);
        assert!(statements[0].contains("CREATE TABLE `Person`"));
    }
}
