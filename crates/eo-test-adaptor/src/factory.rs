//! An [`ExpressionFactory`] that never renders real SQL text for reads:
//! `select_expression` records the structured plan it was asked to build in
//! a shared registry and hands back a correlation token instead of a
//! statement, so [`crate::channel::TestAdaptorChannel`] can retrieve and
//! interpret it directly (§3.1's "no SQL parsing of its own output"). Write
//! statements are never synthesized by this factory at all:
//! `TestAdaptorChannel::perform_adaptor_operation` interprets the
//! [`eo_adaptor::AdaptorOperation`] it is given directly, bypassing the
//! factory entirely.

use std::collections::HashMap;
use std::sync::{atomic::AtomicU64, atomic::Ordering as AtomicOrdering, Arc, Mutex};

use eo_fetch::FetchSpecification;
use eo_model::{Attribute, Entity};
use eo_sql::{combined_qualifier, Dialect, ExpressionFactory, SqlError, SqlExpression};
use eo_sql::dialects::AnsiDialect;

/// The prefix a test-adaptor `SELECT` correlation token carries, so a
/// channel can tell at a glance that a statement is one of its own plan
/// references rather than (accidentally) real SQL.
pub const TEST_SELECT_PREFIX: &str = "##test-select:";

/// What `select_expression` actually needs remembered: the already
/// restricting-qualifier-anded-and-binding-resolved predicate, the
/// projected attributes, and the rest of the fetch specification's
/// shape (sort/limit/offset/distinct).
#[derive(Debug, Clone)]
pub struct SelectPlan {
    pub entity: Arc<Entity>,
    pub attributes: Vec<Attribute>,
    pub fetch_specification: FetchSpecification,
}

#[derive(Default)]
pub struct PlanRegistry {
    plans: Mutex<HashMap<u64, SelectPlan>>,
    next_id: AtomicU64,
}

impl PlanRegistry {
    fn store(&self, plan: SelectPlan) -> u64 {
        let id = self.next_id.fetch_add(1, AtomicOrdering::Relaxed);
        self.plans.lock().expect("plan registry lock poisoned").insert(id, plan);
        id
    }

    pub fn take(&self, id: u64) -> Option<SelectPlan> {
        self.plans.lock().expect("plan registry lock poisoned").remove(&id)
    }
}

pub struct TestExpressionFactory {
    dialect: AnsiDialect,
    registry: Arc<PlanRegistry>,
}

impl TestExpressionFactory {
    pub fn new(registry: Arc<PlanRegistry>) -> Self {
        TestExpressionFactory { dialect: AnsiDialect, registry }
    }

    /// The registry this factory writes select plans into, shared with
    /// every channel an [`crate::adaptor::InProcessAdaptor`] opens so they
    /// can read the plans this factory wrote.
    pub fn registry(&self) -> Arc<PlanRegistry> {
        self.registry.clone()
    }
}

impl ExpressionFactory for TestExpressionFactory {
    fn dialect(&self) -> &dyn Dialect {
        &self.dialect
    }

    fn select_expression(
        &self,
        attributes: &[Attribute],
        _lock: bool,
        fetch_specification: &FetchSpecification,
        entity: &Arc<Entity>,
    ) -> Result<SqlExpression, SqlError> {
        let resolved_qualifier = combined_qualifier(entity, fetch_specification)?;
        let mut resolved_spec = fetch_specification.clone();
        resolved_spec = resolved_spec.with_qualifier(resolved_qualifier);

        let result_attribute_names: Vec<String> = attributes.iter().map(|a| a.name().to_string()).collect();
        let id = self.registry.store(SelectPlan {
            entity: entity.clone(),
            attributes: attributes.to_vec(),
            fetch_specification: resolved_spec,
        });

        Ok(SqlExpression::new(format!("{TEST_SELECT_PREFIX}{id}")).with_result_attribute_names(result_attribute_names))
    }
}
