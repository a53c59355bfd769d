//! The SELECT algorithm of §4.3: resolve the combined qualifier, walk it once
//! to allocate join aliases, emit the select list, `WHERE`, `ORDER BY`,
//! `LIMIT`/`OFFSET`, and an optional row lock — all dialect-parameterized.

use std::sync::Arc;

use eo_fetch::FetchSpecification;
use eo_model::{Attribute, Entity};
use eo_qualifier::Qualifier;

use crate::builder::AliasBook;
use crate::dialect::Dialect;
use crate::error::SqlError;
use crate::expression::SqlExpression;
use crate::predicate::render_qualifier;

/// Builds the full SELECT described by §4.3 for `entity`, projecting
/// `attributes`, honoring `fetch_specification`'s qualifier/order/limit/
/// distinct/prefetch-irrelevant flags, and appending a row lock if `lock`.
///
/// If `fetch_specification` carries a raw-SQL hint (the "custom-SQL hint" of
/// §4.3), that text is used verbatim and only the result attribute list is
/// still computed (so the caller can still decode rows by name).
pub fn build_select(
    dialect: &dyn Dialect,
    attributes: &[Attribute],
    lock: bool,
    fetch_specification: &FetchSpecification,
    entity: &Arc<Entity>,
) -> Result<SqlExpression, SqlError> {
    let result_attribute_names: Vec<String> = attributes.iter().map(|a| a.name().to_string()).collect();

    if let Some(raw_sql) = fetch_specification.hints().raw_sql.as_deref() {
        return Ok(SqlExpression::new(raw_sql.to_string()).with_result_attribute_names(result_attribute_names));
    }

    let mut aliases = AliasBook::new(dialect, entity.clone());
    let mut binds = Vec::new();

    let qualifier = combined_qualifier(entity, fetch_specification)?;
    let where_sql = match &qualifier {
        Qualifier::Boolean(true) => None,
        other => Some(render_qualifier(other, &mut aliases, &mut binds)?),
    };

    let select_list = attributes
        .iter()
        .map(|attribute| render_select_column(attribute, &mut aliases))
        .collect::<Result<Vec<_>, _>>()?;

    let mut statement = String::from("SELECT ");
    if fetch_specification.distinct() {
        statement.push_str("DISTINCT ");
    }
    statement.push_str(&select_list.join(", "));
    statement.push_str(" FROM ");
    statement.push_str(&dialect.quote_identifier(entity.table_name_or_name()));
    statement.push(' ');
    statement.push_str(aliases.root_alias());
    for join in aliases.joins() {
        statement.push(' ');
        statement.push_str(join);
    }
    if let Some(where_sql) = &where_sql {
        statement.push_str(" WHERE ");
        statement.push_str(where_sql);
    }
    if !fetch_specification.sort_orderings().is_empty() {
        statement.push_str(" ORDER BY ");
        statement.push_str(&render_order_by(fetch_specification, &mut aliases)?);
    }
    if let Some(limit_offset) = dialect.limit_offset_clause(fetch_specification.limit(), fetch_specification.offset()) {
        statement.push(' ');
        statement.push_str(&limit_offset);
    }
    if lock {
        if let Some(lock_clause) = dialect.lock_clause() {
            statement.push(' ');
            statement.push_str(lock_clause);
        }
    }

    Ok(SqlExpression::new(statement)
        .with_bind_values(binds)
        .with_result_attribute_names(result_attribute_names))
}

/// ANDs the entity's restricting qualifier (§3: "implicit AND'd into every
/// fetch") with the fetch specification's own qualifier, then substitutes
/// the fetch's bindings per step 1 of §4.3.
///
/// Exposed beyond this module so that a non-SQL-text adaptor (an in-process
/// test adaptor evaluating a `FetchSpecification` directly against in-memory
/// rows) can apply the same restricting-qualifier-and-binding-resolution
/// step a real dialect's `SELECT` gets, without duplicating it.
pub fn combined_qualifier(entity: &Arc<Entity>, fetch_specification: &FetchSpecification) -> Result<Qualifier, SqlError> {
    let mut combined = entity.restricting_qualifier().cloned().unwrap_or(Qualifier::Boolean(true));
    if let Some(fs_qualifier) = fetch_specification.qualifier() {
        combined = combined.anded_with(fs_qualifier.clone());
    }

    let requires_all = fetch_specification.requires_all_qualifier_binding_variables();
    combined
        .qualifier_with(&fetch_specification.hints().bindings, requires_all)
        .map_err(|_| SqlError::unresolved_bindings(combined.binding_keys()))
}

fn render_select_column(attribute: &Attribute, aliases: &mut AliasBook<'_>) -> Result<String, SqlError> {
    let quoted_alias = aliases.dialect().quote_identifier(attribute.name());
    match attribute.read_format() {
        Some(format) if format.contains("%@") => {
            let resolved = aliases.resolve(attribute.name())?;
            let column = aliases.quoted(&resolved.alias, resolved.attribute.column_name_or_name());
            Ok(format!("{} AS {quoted_alias}", format.replacen("%@", &column, 1)))
        }
        // A pseudo-attribute with a self-contained read format (e.g. the
        // `COUNT(*)` pseudo-attribute) names no real column to resolve.
        Some(format) => Ok(format!("{format} AS {quoted_alias}")),
        None => {
            let resolved = aliases.resolve(attribute.name())?;
            let column = aliases.quoted(&resolved.alias, resolved.attribute.column_name_or_name());
            Ok(format!("{column} AS {quoted_alias}"))
        }
    }
}

fn render_order_by(fetch_specification: &FetchSpecification, aliases: &mut AliasBook<'_>) -> Result<String, SqlError> {
    let mut parts = Vec::with_capacity(fetch_specification.sort_orderings().len());
    for ordering in fetch_specification.sort_orderings() {
        let resolved = aliases.resolve(ordering.key())?;
        let mut column = aliases.quoted(&resolved.alias, resolved.attribute.column_name_or_name());
        if ordering.selector().is_case_insensitive() {
            column = format!("LOWER({column})");
        }
        let direction = if ordering.selector().is_descending() { "DESC" } else { "ASC" };
        parts.push(format!("{column} {direction}"));
    }
    Ok(parts.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialects::{AnsiDialect, PostgresDialect};
    use eo_fetch::FetchSpecification;
    use eo_model::{Attribute as Attr, DeleteRule, Join, Model, ModelTag, Relationship, ValueType};
    use eo_qualifier::{Operator, SortOrdering};
    use eo_value::Value;

    fn model() -> Model {
        let person = Entity::builder("Person")
            .attribute(Attr::new("id", ValueType::Int).required())
            .attribute(Attr::new("name", ValueType::Text))
            .primary_key(vec!["id"])
            .relationship(
                Relationship::new("addresses", true)
                    .with_destination_entity_name("Address")
                    .with_joins(vec![Join::new("id", "person_id")])
                    .with_delete_rule(DeleteRule::Cascade),
            )
            .build()
            .unwrap();
        let address = Entity::builder("Address")
            .attribute(Attr::new("id", ValueType::Int).required())
            .attribute(Attr::new("person_id", ValueType::Int).required())
            .attribute(Attr::new("zip", ValueType::Text))
            .primary_key(vec!["id"])
            .build()
            .unwrap();
        Model::new(vec![person, address], ModelTag::new(1)).unwrap()
    }

    #[test]
    fn count_fetch_has_no_order_by() {
        let model = model();
        let person = model.entity("Person").unwrap().clone();
        let dialect = AnsiDialect;
        let count_attr = Attr::count_pseudo_attribute();
        let fs = FetchSpecification::for_entity_named("Person")
            .with_qualifier(Qualifier::key_value("id", Operator::GreaterThan, Value::Int(1)))
            .with_limit(10);
        let expr = build_select(&dialect, &[count_attr], false, &fs, &person).unwrap();
        assert!(expr.statement.contains("COUNT(*)"));
        assert!(!expr.statement.contains("ORDER BY"));
    }

    #[test]
    fn prefetch_relationship_qualifier_allocates_join() {
        let model = model();
        let person = model.entity("Person").unwrap().clone();
        let dialect = AnsiDialect;
        let fs = FetchSpecification::for_entity_named("Person")
            .with_qualifier(Qualifier::key_value("addresses.zip", Operator::Equal, Value::Text("10001".into())));
        let attrs: Vec<Attribute> = person.attributes().cloned().collect();
        let expr = build_select(&dialect, &attrs, false, &fs, &person).unwrap();
        assert!(expr.statement.contains("JOIN"));
        assert!(expr.statement.contains("T1"));
    }

    #[test]
    fn locking_select_appends_lock_clause() {
        let model = model();
        let person = model.entity("Person").unwrap().clone();
        let dialect = PostgresDialect;
        let fs = FetchSpecification::for_entity_named("Person");
        let attrs: Vec<Attribute> = person.attributes().cloned().collect();
        let expr = build_select(&dialect, &attrs, true, &fs, &person).unwrap();
        assert!(expr.statement.trim_end().ends_with("FOR UPDATE"));
    }

    #[test]
    fn sort_ordering_resolves_column_and_direction() {
        let model = model();
        let person = model.entity("Person").unwrap().clone();
        let dialect = AnsiDialect;
        let fs = FetchSpecification::for_entity_named("Person").with_sort_orderings(vec![SortOrdering::desc("name")]);
        let attrs: Vec<Attribute> = person.attributes().cloned().collect();
        let expr = build_select(&dialect, &attrs, false, &fs, &person).unwrap();
        assert!(expr.statement.contains("ORDER BY \"T0\".\"name\" DESC"));
    }

    #[test]
    fn restricting_qualifier_is_implicitly_anded() {
        let person = Entity::builder("Active")
            .attribute(Attr::new("id", ValueType::Int).required())
            .attribute(Attr::new("status", ValueType::Text))
            .primary_key(vec!["id"])
            .restricting_qualifier(Qualifier::key_value("status", Operator::Equal, Value::Text("active".into())))
            .build()
            .unwrap();
        let person = std::sync::Arc::new(person);
        let dialect = AnsiDialect;
        let fs = FetchSpecification::for_entity_named("Active");
        let attrs: Vec<Attribute> = person.attributes().cloned().collect();
        let expr = build_select(&dialect, &attrs, false, &fs, &person).unwrap();
        assert!(expr.statement.contains("\"status\""));
        assert_eq!(expr.bind_values, vec![Value::Text("active".into())]);
    }

    #[test]
    fn raw_sql_hint_bypasses_synthesis() {
        let model = model();
        let person = model.entity("Person").unwrap().clone();
        let dialect = AnsiDialect;
        let fs = FetchSpecification::for_entity_named("Person")
            .with_hints(eo_fetch::FetchHints::new().with_raw_sql("SELECT 1"));
        let attrs: Vec<Attribute> = person.attributes().cloned().collect();
        let expr = build_select(&dialect, &attrs, false, &fs, &person).unwrap();
        assert_eq!(expr.statement, "SELECT 1");
        assert_eq!(expr.result_attribute_names, vec!["id".to_string(), "name".to_string()]);
    }
}
