//! `INSERT` / `UPDATE` / `DELETE` synthesis for §4.4 and §4.6's
//! `apply_generated_keys` contract.

use std::sync::Arc;

use eo_model::{Entity, Snapshot};
use eo_qualifier::Qualifier;
use eo_value::Value;

use crate::builder::AliasBook;
use crate::dialect::Dialect;
use crate::error::SqlError;
use crate::expression::SqlExpression;
use crate::predicate::render_qualifier;

/// Builds `INSERT INTO <table> (...) VALUES (...)`, skipping auto-increment
/// columns (the database assigns those; §4.6 reflects the generated value
/// back afterward) and appending `RETURNING <primary key columns>` when the
/// dialect supports it, so the caller can read generated keys in the same
/// round-trip instead of a follow-up reflection query.
pub fn build_insert(dialect: &dyn Dialect, entity: &Arc<Entity>, row: &Snapshot) -> Result<SqlExpression, SqlError> {
    let mut columns = Vec::new();
    let mut placeholders = Vec::new();
    let mut binds = Vec::new();

    for attribute in entity.attributes() {
        if attribute.is_auto_increment() {
            continue;
        }
        let Some(value) = row.get(attribute.name()) else {
            continue;
        };
        columns.push(dialect.quote_identifier(attribute.column_name_or_name()));
        match value {
            Some(value) => {
                binds.push(value.clone());
                placeholders.push(dialect.placeholder(binds.len()));
            }
            None => placeholders.push("NULL".to_string()),
        }
    }

    if columns.is_empty() {
        return Err(SqlError::EmptyRow(entity.name().to_string()));
    }

    let mut statement = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        dialect.quote_identifier(entity.table_name_or_name()),
        columns.join(", "),
        placeholders.join(", "),
    );

    if dialect.supports_returning() {
        let pk_columns: Vec<String> = entity
            .primary_key_attribute_names()
            .iter()
            .filter_map(|name| entity.attribute(name))
            .map(|attribute| dialect.quote_identifier(attribute.column_name_or_name()))
            .collect();
        if !pk_columns.is_empty() {
            statement.push_str(" RETURNING ");
            statement.push_str(&pk_columns.join(", "));
        }
    }

    let result_attribute_names = if dialect.supports_returning() {
        entity.primary_key_attribute_names().to_vec()
    } else {
        Vec::new()
    };

    Ok(SqlExpression::new(statement).with_bind_values(binds).with_result_attribute_names(result_attribute_names))
}

/// Builds `UPDATE <table> SET ... WHERE <qualifier>`, qualifying on the
/// primary key (the usual case for a row already fetched and tracked) or on
/// a caller-supplied qualifier for a bulk update. Placeholder numbering
/// continues across the `SET` and `WHERE` clauses so a numbered dialect
/// (Postgres's `$1`, `$2`, ...) stays consistent.
pub fn build_update(
    dialect: &dyn Dialect,
    entity: &Arc<Entity>,
    row: &Snapshot,
    qualifier: &Qualifier,
) -> Result<SqlExpression, SqlError> {
    let mut assignments = Vec::new();
    let mut binds = Vec::new();

    for attribute in entity.attributes() {
        if attribute.is_auto_increment() || entity.primary_key_attribute_names().iter().any(|pk| pk == attribute.name()) {
            continue;
        }
        let Some(value) = row.get(attribute.name()) else {
            continue;
        };
        let column = dialect.quote_identifier(attribute.column_name_or_name());
        match value {
            Some(value) => {
                binds.push(value.clone());
                assignments.push(format!("{column} = {}", dialect.placeholder(binds.len())));
            }
            None => assignments.push(format!("{column} = NULL")),
        }
    }

    if assignments.is_empty() {
        return Err(SqlError::EmptyRow(entity.name().to_string()));
    }

    let mut aliases = AliasBook::new_unqualified_root(dialect, entity.clone());
    let where_sql = render_qualifier(qualifier, &mut aliases, &mut binds)?;

    let statement = format!(
        "UPDATE {} SET {} WHERE {}",
        dialect.quote_identifier(entity.table_name_or_name()),
        assignments.join(", "),
        where_sql,
    );

    Ok(SqlExpression::new(statement).with_bind_values(binds))
}

/// Builds `DELETE FROM <table> WHERE <qualifier>`.
pub fn build_delete(dialect: &dyn Dialect, entity: &Arc<Entity>, qualifier: &Qualifier) -> Result<SqlExpression, SqlError> {
    let mut aliases = AliasBook::new_unqualified_root(dialect, entity.clone());
    let mut binds = Vec::new();
    let where_sql = render_qualifier(qualifier, &mut aliases, &mut binds)?;
    let statement = format!(
        "DELETE FROM {} WHERE {}",
        dialect.quote_identifier(entity.table_name_or_name()),
        where_sql,
    );
    Ok(SqlExpression::new(statement).with_bind_values(binds))
}
