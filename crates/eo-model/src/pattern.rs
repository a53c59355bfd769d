use crate::attribute::Attribute;
use crate::entity::{Entity, EntityBuilder};

/// Applies a pattern entity's defaults onto a concrete entity that doesn't
/// already specify them.
///
/// A pattern entity (`Entity::is_pattern`) supplies attribute/relationship
/// shape shared across several concrete entities without forcing each one to
/// redeclare it; an external-name pattern (`Entity::is_external_name_pattern`)
/// additionally supplies a table-naming convention (e.g. every concrete
/// entity inherits the pattern's `external_name` unless it sets its own).
/// This is deliberately a one-shot application rather than a live link: once
/// applied, the concrete entity owns its own attribute/relationship list and
/// further changes to the pattern do not propagate.
pub fn apply_pattern(pattern: &Entity, concrete: &Entity) -> Entity {
    let mut builder = EntityBuilder::new(concrete.name()).primary_key(
        if concrete.primary_key_attribute_names().is_empty() {
            pattern.primary_key_attribute_names().to_vec()
        } else {
            concrete.primary_key_attribute_names().to_vec()
        },
    );
    if let Some(class_name) = concrete.class_name().or(pattern.class_name()) {
        builder = builder.class_name(class_name);
    }

    if let Some(qualifier) = concrete.restricting_qualifier().or(pattern.restricting_qualifier()) {
        builder = builder.restricting_qualifier(qualifier.clone());
    }

    let external_name = if pattern.is_external_name_pattern() {
        concrete.external_name().or(pattern.external_name())
    } else {
        concrete.external_name()
    };
    if let Some(name) = external_name {
        builder = builder.external_name(name);
    }

    let mut seen_attributes = std::collections::HashSet::new();
    for attribute in concrete.attributes() {
        seen_attributes.insert(attribute.name().to_string());
        builder = builder.attribute(attribute.clone());
    }
    for attribute in pattern.attributes() {
        if !seen_attributes.contains(attribute.name()) {
            builder = builder.attribute(inherit_attribute(attribute));
        }
    }

    let mut seen_relationships = std::collections::HashSet::new();
    for relationship in concrete.relationships() {
        seen_relationships.insert(relationship.name().to_string());
        builder = builder.relationship(relationship.clone());
    }
    for relationship in pattern.relationships() {
        if !seen_relationships.contains(relationship.name()) {
            builder = builder.relationship(relationship.clone());
        }
    }

    builder.build().expect("pattern application preserves primary-key validity")
}

fn inherit_attribute(attribute: &Attribute) -> Attribute {
    attribute.clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::ValueType;

    #[test]
    fn concrete_attribute_wins_over_pattern_attribute_of_same_name() {
        let pattern = Entity::builder("Pattern")
            .external_name_pattern()
            .attribute(Attribute::new("id", ValueType::Int))
            .attribute(Attribute::new("created_at", ValueType::Text))
            .build()
            .unwrap();

        let concrete = Entity::builder("Person")
            .attribute(Attribute::new("id", ValueType::Int).required())
            .primary_key(vec!["id"])
            .build()
            .unwrap();

        let result = apply_pattern(&pattern, &concrete);
        assert!(result.attribute("id").unwrap().allows_null() == false);
        assert!(result.attribute("created_at").is_some());
        assert_eq!(result.primary_key_attribute_names(), &["id".to_string()]);
    }

    #[test]
    fn external_name_pattern_supplies_table_naming() {
        let pattern = Entity::builder("Pattern")
            .external_name_pattern()
            .external_name("t_default")
            .build()
            .unwrap();
        let concrete = Entity::builder("Person").build().unwrap();
        let result = apply_pattern(&pattern, &concrete);
        assert_eq!(result.external_name(), Some("t_default"));
    }

    #[test]
    fn non_external_name_pattern_does_not_supply_table_naming() {
        let pattern = Entity::builder("Pattern").external_name("t_default").build().unwrap();
        let concrete = Entity::builder("Person").build().unwrap();
        let result = apply_pattern(&pattern, &concrete);
        assert_eq!(result.external_name(), None);
    }
}
