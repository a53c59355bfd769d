//! Schema generation: collapses entity groups back onto one `CREATE TABLE`
//! per backing table, orders tables so a foreign key is never created before
//! the table it references, and emits `DROP TABLE` in the reverse order.

use std::collections::HashSet;

use eo_model::{Entity, Model};

use crate::dialect::Dialect;

/// Emits one `CREATE TABLE` per distinct backing table in `model`, ordered so
/// that a table referenced by a foreign key is created before the table that
/// references it. Tables are ordered by their outgoing foreign-key count
/// (self-references excluded, since those never block creation order), with
/// table name as a tiebreaker for tables that reference none of the others.
pub fn create_table_statements_for_entities(dialect: &dyn Dialect, model: &Model) -> Vec<String> {
    let groups = table_groups(model);
    let mut statements = Vec::with_capacity(groups.len());
    let mut deferred_constraints = Vec::new();

    for group in &groups {
        let table_name = group.table_name.clone();
        let mut lines = Vec::new();

        for column in &group.columns {
            let mut line = format!(
                "{} {}",
                dialect.quote_identifier(column.attribute.column_name_or_name()),
                dialect.column_type(column.attribute.value_type(), column.attribute.width(), column.attribute.is_auto_increment()),
            );
            if !column.attribute.allows_null() {
                line.push_str(" NOT NULL");
            }
            lines.push(line);
        }

        if !group.primary_key_columns.is_empty() {
            let pk_columns: Vec<String> = group.primary_key_columns.iter().map(|c| dialect.quote_identifier(c)).collect();
            lines.push(format!("PRIMARY KEY ({})", pk_columns.join(", ")));
        }

        for fk in &group.foreign_keys {
            if dialect.supports_inline_foreign_keys() {
                lines.push(format!(
                    "FOREIGN KEY ({}) REFERENCES {} ({})",
                    dialect.quote_identifier(&fk.column),
                    dialect.quote_identifier(&fk.references_table),
                    dialect.quote_identifier(&fk.references_column),
                ));
            } else {
                deferred_constraints.push(fk.clone());
            }
        }

        statements.push(format!(
            "CREATE TABLE {} (\n  {}\n)",
            dialect.quote_identifier(&table_name),
            lines.join(",\n  "),
        ));
    }

    let mut used_names = HashSet::new();
    for fk in &deferred_constraints {
        let mut name = fk.constraint_name.clone();
        let mut suffix = 1;
        while !used_names.insert(name.clone()) {
            suffix += 1;
            name = format!("{}_{suffix}", fk.constraint_name);
        }
        statements.push(format!(
            "ALTER TABLE {} ADD CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {} ({})",
            dialect.quote_identifier(&fk.table),
            dialect.quote_identifier(&name),
            dialect.quote_identifier(&fk.column),
            dialect.quote_identifier(&fk.references_table),
            dialect.quote_identifier(&fk.references_column),
        ));
    }

    statements
}

/// Emits `DROP TABLE` for every distinct backing table in `model`, in the
/// reverse of the order [`create_table_statements_for_entities`] would
/// create them, so a referenced table is never dropped before its
/// dependents.
pub fn drop_table_statements_for_entities(dialect: &dyn Dialect, model: &Model) -> Vec<String> {
    let mut groups = table_groups(model);
    groups.reverse();
    groups
        .iter()
        .map(|group| format!("DROP TABLE {}", dialect.quote_identifier(&group.table_name)))
        .collect()
}

struct Column<'e> {
    attribute: &'e eo_model::Attribute,
}

#[derive(Clone)]
struct ForeignKey {
    table: String,
    column: String,
    references_table: String,
    references_column: String,
    constraint_name: String,
}

struct TableGroup<'e> {
    table_name: String,
    columns: Vec<Column<'e>>,
    primary_key_columns: Vec<String>,
    foreign_keys: Vec<ForeignKey>,
    outgoing_fk_count: usize,
}

fn table_groups(model: &Model) -> Vec<TableGroup<'_>> {
    let mut seen_tables = Vec::new();
    for entity in model.entities() {
        let table_name = entity.table_name_or_name().to_string();
        if !seen_tables.contains(&table_name) {
            seen_tables.push(table_name);
        }
    }

    let mut groups: Vec<TableGroup<'_>> = seen_tables
        .into_iter()
        .map(|table_name| build_group(model, table_name))
        .collect();

    groups.sort_by(|a, b| a.outgoing_fk_count.cmp(&b.outgoing_fk_count).then_with(|| a.table_name.cmp(&b.table_name)));
    groups
}

fn build_group(model: &Model, table_name: String) -> TableGroup<'_> {
    let entities = model.entity_group(&table_name);

    let mut columns: Vec<Column<'_>> = Vec::new();
    let mut seen_columns = HashSet::new();
    let mut primary_key_columns = Vec::new();
    let mut foreign_keys = Vec::new();
    let mut outgoing_fk_count = 0;

    for entity in &entities {
        for attribute in entity.attributes() {
            let column_name = attribute.column_name_or_name().to_string();
            if seen_columns.insert(column_name) {
                columns.push(Column { attribute });
            }
        }

        if primary_key_columns.is_empty() {
            for pk_name in entity.primary_key_attribute_names() {
                if let Some(attribute) = entity.attribute(pk_name) {
                    primary_key_columns.push(attribute.column_name_or_name().to_string());
                }
            }
        }

        for relationship in entity.relationships() {
            if !relationship.is_foreign_key_relationship() {
                continue;
            }
            let Some(destination) = relationship.destination_entity() else {
                continue;
            };
            let destination_table = destination.table_name_or_name().to_string();
            let is_self_reference = destination_table == table_name;

            for join in relationship.joins() {
                let Some(source_attribute) = entity.attribute(join.source_attribute()) else {
                    continue;
                };
                let Some(destination_attribute) = destination.attribute(join.destination_attribute()) else {
                    continue;
                };
                foreign_keys.push(ForeignKey {
                    table: table_name.clone(),
                    column: source_attribute.column_name_or_name().to_string(),
                    references_table: destination_table.clone(),
                    references_column: destination_attribute.column_name_or_name().to_string(),
                    constraint_name: relationship
                        .constraint_name()
                        .map(|n| n.to_string())
                        .unwrap_or_else(|| format!("fk_{table_name}_{}", relationship.name())),
                });
            }

            if !is_self_reference {
                outgoing_fk_count += 1;
            }
        }
    }

    TableGroup {
        table_name,
        columns,
        primary_key_columns,
        foreign_keys,
        outgoing_fk_count,
    }
}
