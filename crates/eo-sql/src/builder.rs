use std::sync::Arc;

use indexmap::IndexMap;

use eo_model::{Attribute, Entity};

use crate::dialect::Dialect;
use crate::error::SqlError;

/// A resolved key path: the table alias its final attribute's column should
/// be qualified with, plus a clone of the attribute itself (cheap: a handful
/// of strings and an optional default value).
pub struct ResolvedColumn {
    pub alias: String,
    pub attribute: Attribute,
}

/// Accumulates table aliases and JOIN clauses as a statement's qualifier,
/// select list, and order-by clauses are walked. `T0` always denotes the
/// root entity's table; `T1`, `T2`, ... are allocated in first-use order for
/// each distinct relationship key-path prefix encountered.
pub struct AliasBook<'d> {
    dialect: &'d dyn Dialect,
    root_entity: Arc<Entity>,
    aliases: IndexMap<String, String>,
    joins: Vec<String>,
    next_index: usize,
    unqualify_root: bool,
}

impl<'d> AliasBook<'d> {
    pub fn new(dialect: &'d dyn Dialect, root_entity: Arc<Entity>) -> Self {
        Self::new_with(dialect, root_entity, false)
    }

    /// Like [`AliasBook::new`], but root-table column references render
    /// unqualified (no `T0.` prefix): `UPDATE`/`DELETE` statements target
    /// their table directly and never declare an alias for it, so a
    /// `T0`-qualified `WHERE` column would reference an alias the statement
    /// never binds.
    pub fn new_unqualified_root(dialect: &'d dyn Dialect, root_entity: Arc<Entity>) -> Self {
        Self::new_with(dialect, root_entity, true)
    }

    fn new_with(dialect: &'d dyn Dialect, root_entity: Arc<Entity>, unqualify_root: bool) -> Self {
        let mut aliases = IndexMap::new();
        aliases.insert(String::new(), "T0".to_string());
        AliasBook {
            dialect,
            root_entity,
            aliases,
            joins: Vec::new(),
            next_index: 1,
            unqualify_root,
        }
    }

    pub fn root_alias(&self) -> &str {
        self.aliases.get("").expect("root alias always present")
    }

    pub fn dialect(&self) -> &'d dyn Dialect {
        self.dialect
    }

    pub fn joins(&self) -> &[String] {
        &self.joins
    }

    /// Resolves a dot-separated key path (`"attr"`, `"relationship.attr"`,
    /// `"rel1.rel2.attr"`, ...) against the root entity, allocating aliases
    /// and JOIN clauses for any relationship hops not yet seen, and returns
    /// the alias and attribute the final segment names.
    pub fn resolve(&mut self, path: &str) -> Result<ResolvedColumn, SqlError> {
        let segments: Vec<&str> = path.split('.').collect();
        if segments.iter().any(|s| s.is_empty()) {
            return Err(SqlError::EmptyKeyPath(path.to_string()));
        }

        let (relationship_segments, attribute_name) = segments.split_at(segments.len() - 1);
        let attribute_name = attribute_name[0];

        let mut entity = self.root_entity.clone();
        let mut prefix = String::new();
        let mut parent_alias = self.root_alias().to_string();

        for segment in relationship_segments {
            if !prefix.is_empty() {
                prefix.push('.');
            }
            prefix.push_str(segment);

            let relationship = entity.relationship(segment).ok_or_else(|| SqlError::UnknownRelationship {
                entity: entity.name().to_string(),
                relationship: segment.to_string(),
            })?;
            let destination = relationship
                .destination_entity()
                .expect("relationship destination resolved by Model::connect_relationships");

            if let Some(existing_alias) = self.aliases.get(&prefix) {
                parent_alias = existing_alias.clone();
                entity = destination;
                continue;
            }

            let alias = format!("T{}", self.next_index);
            self.next_index += 1;

            let conditions: Vec<String> = relationship
                .joins()
                .iter()
                .map(|join| {
                    let source_attr = entity
                        .attribute(join.source_attribute())
                        .expect("join source attribute validated at model bind time");
                    let dest_attr = destination
                        .attribute(join.destination_attribute())
                        .expect("join destination attribute validated at model bind time");
                    format!(
                        "{}.{} = {}.{}",
                        self.dialect.quote_identifier(&parent_alias),
                        self.dialect.quote_identifier(source_attr.column_name_or_name()),
                        self.dialect.quote_identifier(&alias),
                        self.dialect.quote_identifier(dest_attr.column_name_or_name()),
                    )
                })
                .collect();

            self.joins.push(format!(
                "JOIN {} {} ON {}",
                self.dialect.quote_identifier(destination.table_name_or_name()),
                self.dialect.quote_identifier(&alias),
                conditions.join(" AND "),
            ));

            self.aliases.insert(prefix.clone(), alias.clone());
            parent_alias = alias;
            entity = destination;
        }

        let attribute = entity.attribute(attribute_name).cloned().ok_or_else(|| SqlError::UnknownAttribute {
            entity: entity.name().to_string(),
            attribute: attribute_name.to_string(),
        })?;

        Ok(ResolvedColumn { alias: parent_alias, attribute })
    }

    pub fn quoted(&self, alias: &str, column: &str) -> String {
        if self.unqualify_root && alias == self.root_alias() {
            return self.dialect.quote_identifier(column);
        }
        format!("{}.{}", self.dialect.quote_identifier(alias), self.dialect.quote_identifier(column))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eo_model::{Attribute as Attr, DeleteRule, Join, Model, ModelTag, Relationship, ValueType};
    use crate::dialects::AnsiDialect;

    fn build_model() -> Model {
        let customer = eo_model::Entity::builder("Customer")
            .attribute(Attr::new("id", ValueType::Int).required())
            .primary_key(vec!["id"])
            .relationship(
                Relationship::new("orders", true)
                    .with_destination_entity_name("Order")
                    .with_joins(vec![Join::new("id", "customer_id")])
                    .with_delete_rule(DeleteRule::Cascade),
            )
            .build()
            .unwrap();
        let order = eo_model::Entity::builder("Order")
            .attribute(Attr::new("id", ValueType::Int).required())
            .attribute(Attr::new("customer_id", ValueType::Int).required())
            .attribute(Attr::new("total", ValueType::Float))
            .primary_key(vec!["id"])
            .build()
            .unwrap();
        Model::new(vec![customer, order], ModelTag::new(1)).unwrap()
    }

    #[test]
    fn root_attribute_resolves_to_t0() {
        let model = build_model();
        let customer = model.entity("Customer").unwrap().clone();
        let dialect = AnsiDialect;
        let mut book = AliasBook::new(&dialect, customer);
        let resolved = book.resolve("id").unwrap();
        assert_eq!(resolved.alias, "T0");
        assert!(book.joins().is_empty());
    }

    #[test]
    fn relationship_path_allocates_join_and_alias_once() {
        let model = build_model();
        let customer = model.entity("Customer").unwrap().clone();
        let dialect = AnsiDialect;
        let mut book = AliasBook::new(&dialect, customer);

        let first = book.resolve("orders.total").unwrap();
        assert_eq!(first.alias, "T1");
        assert_eq!(book.joins().len(), 1);

        let second = book.resolve("orders.customer_id").unwrap();
        assert_eq!(second.alias, "T1");
        assert_eq!(book.joins().len(), 1, "second reference to the same relationship path reuses its alias");
    }
}
