use std::marker::PhantomData;

use eo_qualifier::{Qualifier, SortOrdering};

use crate::hints::FetchHints;

/// A declarative fetch request: entity, predicate, order, limits, prefetch
/// key-paths, hints, locking, distinctness, and a raw-row escape hatch.
///
/// Carries only an entity *name*; resolving that name against a live
/// `Model`/`Entity` is the job of whichever layer actually has a model in
/// scope (`eo-sql`, `eo-channel`), which keeps this crate free of a
/// dependency on `eo-model`.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchSpecification {
    entity_name: Option<String>,
    fetch_attribute_names: Option<Vec<String>>,
    qualifier: Option<Qualifier>,
    sort_orderings: Vec<SortOrdering>,
    limit: Option<u64>,
    offset: Option<u64>,
    hints: FetchHints,
    distinct: bool,
    locks_objects: bool,
    deep: bool,
    fetches_raw_rows: bool,
    fetches_read_only: bool,
    requires_all_qualifier_binding_variables: bool,
    prefetching_relationship_key_paths: Vec<String>,
}

impl Default for FetchSpecification {
    fn default() -> Self {
        FetchSpecification {
            entity_name: None,
            fetch_attribute_names: None,
            qualifier: None,
            sort_orderings: Vec::new(),
            limit: None,
            offset: None,
            hints: FetchHints::default(),
            distinct: false,
            locks_objects: false,
            deep: false,
            fetches_raw_rows: false,
            fetches_read_only: false,
            requires_all_qualifier_binding_variables: false,
            prefetching_relationship_key_paths: Vec::new(),
        }
    }
}

impl FetchSpecification {
    pub fn for_entity_named(entity_name: impl Into<String>) -> Self {
        FetchSpecification {
            entity_name: Some(entity_name.into()),
            ..Default::default()
        }
    }

    pub fn entity_name(&self) -> Option<&str> {
        self.entity_name.as_deref()
    }

    pub fn with_entity_name(mut self, entity_name: impl Into<String>) -> Self {
        self.entity_name = Some(entity_name.into());
        self
    }

    pub fn fetch_attribute_names(&self) -> Option<&[String]> {
        self.fetch_attribute_names.as_deref()
    }

    pub fn with_fetch_attribute_names(mut self, names: Vec<String>) -> Self {
        self.fetch_attribute_names = Some(names);
        self
    }

    pub fn qualifier(&self) -> Option<&Qualifier> {
        self.qualifier.as_ref()
    }

    pub fn with_qualifier(mut self, qualifier: Qualifier) -> Self {
        self.qualifier = Some(qualifier);
        self
    }

    pub fn sort_orderings(&self) -> &[SortOrdering] {
        &self.sort_orderings
    }

    pub fn with_sort_orderings(mut self, orderings: Vec<SortOrdering>) -> Self {
        self.sort_orderings = orderings;
        self
    }

    pub fn limit(&self) -> Option<u64> {
        self.limit
    }

    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(&self) -> Option<u64> {
        self.offset
    }

    pub fn with_offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn hints(&self) -> &FetchHints {
        &self.hints
    }

    pub fn with_hints(mut self, hints: FetchHints) -> Self {
        self.hints = hints;
        self
    }

    pub fn distinct(&self) -> bool {
        self.distinct
    }

    pub fn with_distinct(mut self, distinct: bool) -> Self {
        self.distinct = distinct;
        self
    }

    pub fn locks_objects(&self) -> bool {
        self.locks_objects
    }

    pub fn with_locks_objects(mut self, locks: bool) -> Self {
        self.locks_objects = locks;
        self
    }

    pub fn deep(&self) -> bool {
        self.deep
    }

    pub fn with_deep(mut self, deep: bool) -> Self {
        self.deep = deep;
        self
    }

    pub fn fetches_raw_rows(&self) -> bool {
        self.fetches_raw_rows
    }

    pub fn with_fetches_raw_rows(mut self, raw: bool) -> Self {
        self.fetches_raw_rows = raw;
        self
    }

    pub fn fetches_read_only(&self) -> bool {
        self.fetches_read_only
    }

    pub fn with_fetches_read_only(mut self, read_only: bool) -> Self {
        self.fetches_read_only = read_only;
        self
    }

    pub fn requires_all_qualifier_binding_variables(&self) -> bool {
        self.requires_all_qualifier_binding_variables
    }

    pub fn with_requires_all_qualifier_binding_variables(mut self, requires_all: bool) -> Self {
        self.requires_all_qualifier_binding_variables = requires_all;
        self
    }

    pub fn prefetching_relationship_key_paths(&self) -> &[String] {
        &self.prefetching_relationship_key_paths
    }

    pub fn with_prefetching_relationship_key_paths(mut self, paths: Vec<String>) -> Self {
        self.prefetching_relationship_key_paths = paths;
        self
    }

    pub fn has_prefetches(&self) -> bool {
        !self.prefetching_relationship_key_paths.is_empty()
    }

    /// Rewrites this specification for a PK-only global-ID fetch: project
    /// only `pk_attribute_names`, mark read-only, and disable prefetching.
    pub fn for_global_id_fetch(&self, pk_attribute_names: Vec<String>) -> FetchSpecification {
        let mut spec = self.clone();
        spec.fetch_attribute_names = Some(pk_attribute_names);
        spec.fetches_read_only = true;
        spec.prefetching_relationship_key_paths.clear();
        spec
    }

    /// Rewrites this specification for a count fetch: project only the
    /// given count pseudo-attribute, drop sort orderings, and limit to 1 row.
    pub fn for_count_fetch(&self, count_attribute_name: impl Into<String>) -> FetchSpecification {
        let mut spec = self.clone();
        spec.fetch_attribute_names = Some(vec![count_attribute_name.into()]);
        spec.sort_orderings.clear();
        spec.limit = Some(1);
        spec.prefetching_relationship_key_paths.clear();
        spec
    }
}

/// A [`FetchSpecification`] paired with a static object type, so that
/// callers get a typed result back from a fetch without the core needing to
/// know about application entity types.
#[derive(Debug, Clone)]
pub struct TypedFetchSpecification<T> {
    inner: FetchSpecification,
    _marker: PhantomData<fn() -> T>,
}

impl<T> TypedFetchSpecification<T> {
    pub fn new(inner: FetchSpecification) -> Self {
        TypedFetchSpecification {
            inner,
            _marker: PhantomData,
        }
    }

    pub fn inner(&self) -> &FetchSpecification {
        &self.inner
    }

    pub fn into_inner(self) -> FetchSpecification {
        self.inner
    }
}

impl<T> From<FetchSpecification> for TypedFetchSpecification<T> {
    fn from(inner: FetchSpecification) -> Self {
        TypedFetchSpecification::new(inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eo_qualifier::{Operator, Qualifier};
    use eo_value::Value;

    #[test]
    fn count_rewrite_drops_order_and_limits_to_one() {
        let spec = FetchSpecification::for_entity_named("Person")
            .with_qualifier(Qualifier::key_value("id", Operator::GreaterThan, Value::Int(1)))
            .with_sort_orderings(vec![SortOrdering::asc("name")])
            .with_limit(10);

        let count_spec = spec.for_count_fetch("count");
        assert_eq!(count_spec.fetch_attribute_names(), Some(&["count".to_string()][..]));
        assert!(count_spec.sort_orderings().is_empty());
        assert_eq!(count_spec.limit(), Some(1));
        assert_eq!(count_spec.qualifier(), spec.qualifier());
    }

    #[test]
    fn global_id_rewrite_projects_pk_and_disables_prefetch() {
        let spec = FetchSpecification::for_entity_named("Person")
            .with_prefetching_relationship_key_paths(vec!["addresses".into()]);
        let gid_spec = spec.for_global_id_fetch(vec!["id".into()]);
        assert_eq!(gid_spec.fetch_attribute_names(), Some(&["id".to_string()][..]));
        assert!(gid_spec.fetches_read_only());
        assert!(!gid_spec.has_prefetches());
    }
}
