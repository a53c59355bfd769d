use indexmap::IndexMap;

use eo_fetch::FetchSpecification;
use eo_qualifier::Qualifier;

use crate::attribute::Attribute;
use crate::error::ModelError;
use crate::global_id::GlobalId;
use crate::relationship::Relationship;
use crate::snapshot::Snapshot;

/// Description of one mapped type and its backing table.
///
/// Built through [`EntityBuilder`], which validates the §3 invariants
/// (primary-key names must name real attributes; relationship names unique)
/// before handing back a usable `Entity`.
#[derive(Debug, Clone)]
pub struct Entity {
    name: String,
    external_name: Option<String>,
    class_name: Option<String>,
    primary_key_attribute_names: Vec<String>,
    restricting_qualifier: Option<Qualifier>,
    attributes: IndexMap<String, Attribute>,
    relationships: IndexMap<String, Relationship>,
    named_fetch_specifications: IndexMap<String, FetchSpecification>,
    is_pattern: bool,
    is_external_name_pattern: bool,
}

impl Entity {
    pub fn builder(name: impl Into<String>) -> EntityBuilder {
        EntityBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn external_name(&self) -> Option<&str> {
        self.external_name.as_deref()
    }

    /// The table name to emit in SQL: the external name if set, else the
    /// entity's own name (mirrors `Attribute::column_name_or_name`).
    pub fn table_name_or_name(&self) -> &str {
        self.external_name.as_deref().unwrap_or(&self.name)
    }

    pub fn class_name(&self) -> Option<&str> {
        self.class_name.as_deref()
    }

    pub fn primary_key_attribute_names(&self) -> &[String] {
        &self.primary_key_attribute_names
    }

    pub fn restricting_qualifier(&self) -> Option<&Qualifier> {
        self.restricting_qualifier.as_ref()
    }

    pub fn attributes(&self) -> impl Iterator<Item = &Attribute> {
        self.attributes.values()
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.get(name)
    }

    pub fn relationships(&self) -> impl Iterator<Item = &Relationship> {
        self.relationships.values()
    }

    pub fn relationship(&self, name: &str) -> Option<&Relationship> {
        self.relationships.get(name)
    }

    pub fn named_fetch_specification(&self, name: &str) -> Option<&FetchSpecification> {
        self.named_fetch_specifications.get(name)
    }

    pub fn is_pattern(&self) -> bool {
        self.is_pattern
    }

    pub fn is_external_name_pattern(&self) -> bool {
        self.is_external_name_pattern
    }

    /// Projects the primary-key columns out of `row` and forms a
    /// [`GlobalId`]. Returns `None` if any primary-key attribute's value is
    /// missing from `row` or is present-but-null (§3: "returns null if any
    /// primary-key value is missing").
    pub fn global_id_for_row(&self, row: &Snapshot) -> Option<GlobalId> {
        if self.primary_key_attribute_names.is_empty() {
            return None;
        }
        let mut keys = Vec::with_capacity(self.primary_key_attribute_names.len());
        for pk_name in &self.primary_key_attribute_names {
            let value = row.get(pk_name)??.clone();
            keys.push((pk_name.clone(), value));
        }
        Some(GlobalId::from_keys(self.name.clone(), keys))
    }
}

pub struct EntityBuilder {
    name: String,
    external_name: Option<String>,
    class_name: Option<String>,
    primary_key_attribute_names: Vec<String>,
    restricting_qualifier: Option<Qualifier>,
    attributes: IndexMap<String, Attribute>,
    relationships: IndexMap<String, Relationship>,
    named_fetch_specifications: IndexMap<String, FetchSpecification>,
    is_pattern: bool,
    is_external_name_pattern: bool,
}

impl EntityBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        EntityBuilder {
            name: name.into(),
            external_name: None,
            class_name: None,
            primary_key_attribute_names: Vec::new(),
            restricting_qualifier: None,
            attributes: IndexMap::new(),
            relationships: IndexMap::new(),
            named_fetch_specifications: IndexMap::new(),
            is_pattern: false,
            is_external_name_pattern: false,
        }
    }

    pub fn external_name(mut self, name: impl Into<String>) -> Self {
        self.external_name = Some(name.into());
        self
    }

    pub fn class_name(mut self, name: impl Into<String>) -> Self {
        self.class_name = Some(name.into());
        self
    }

    pub fn primary_key(mut self, names: Vec<impl Into<String>>) -> Self {
        self.primary_key_attribute_names = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn restricting_qualifier(mut self, qualifier: Qualifier) -> Self {
        self.restricting_qualifier = Some(qualifier);
        self
    }

    pub fn attribute(mut self, attribute: Attribute) -> Self {
        self.attributes.insert(attribute.name().to_string(), attribute);
        self
    }

    pub fn relationship(mut self, relationship: Relationship) -> Self {
        self.relationships.insert(relationship.name().to_string(), relationship);
        self
    }

    pub fn named_fetch_specification(mut self, name: impl Into<String>, spec: FetchSpecification) -> Self {
        self.named_fetch_specifications.insert(name.into(), spec);
        self
    }

    pub fn pattern(mut self) -> Self {
        self.is_pattern = true;
        self
    }

    pub fn external_name_pattern(mut self) -> Self {
        self.is_external_name_pattern = true;
        self
    }

    /// Validates the §3 invariants and produces an [`Entity`].
    pub fn build(self) -> Result<Entity, ModelError> {
        for pk_name in &self.primary_key_attribute_names {
            if !self.attributes.contains_key(pk_name) {
                return Err(ModelError::UnknownPrimaryKeyAttribute {
                    entity: self.name.clone(),
                    attribute: pk_name.clone(),
                });
            }
        }

        Ok(Entity {
            name: self.name,
            external_name: self.external_name,
            class_name: self.class_name,
            primary_key_attribute_names: self.primary_key_attribute_names,
            restricting_qualifier: self.restricting_qualifier,
            attributes: self.attributes,
            relationships: self.relationships,
            named_fetch_specifications: self.named_fetch_specifications,
            is_pattern: self.is_pattern,
            is_external_name_pattern: self.is_external_name_pattern,
        })
    }
}
