use std::sync::Arc;

use eo_model::{Entity, Snapshot};
use eo_qualifier::Qualifier;

/// What an [`AdaptorOperation`] does to its entity's table. Ordinal order
/// (`None < Lock < Insert < Update < Delete`) is the safe sequencing for
/// referential integrity §4.6 requires a batch to execute in: locks before
/// writes, inserts before updates (a row must exist to be updated), deletes
/// last (so a row being deleted is never still referenced by a pending
/// insert/update in the same batch).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum AdaptorOperator {
    None,
    Lock,
    Insert,
    Update,
    Delete,
}

impl AdaptorOperator {
    pub fn ordinal(&self) -> u8 {
        match self {
            AdaptorOperator::None => 0,
            AdaptorOperator::Lock => 1,
            AdaptorOperator::Insert => 2,
            AdaptorOperator::Update => 3,
            AdaptorOperator::Delete => 4,
        }
    }
}

/// One unit of work an [`crate::AdaptorChannel`] executes against a single
/// entity's table: the row data to write (insert/update), the qualifier to
/// restrict it by (update/delete/lock), or neither (a no-op placeholder
/// operation, used when a `DatabaseOperation` expands to zero adaptor-level
/// work).
#[derive(Debug, Clone)]
pub struct AdaptorOperation {
    entity: Arc<Entity>,
    operator: AdaptorOperator,
    row: Option<Snapshot>,
    qualifier: Option<Qualifier>,
}

impl AdaptorOperation {
    pub fn new(entity: Arc<Entity>, operator: AdaptorOperator) -> Self {
        AdaptorOperation {
            entity,
            operator,
            row: None,
            qualifier: None,
        }
    }

    pub fn with_row(mut self, row: Snapshot) -> Self {
        self.row = Some(row);
        self
    }

    pub fn with_qualifier(mut self, qualifier: Qualifier) -> Self {
        self.qualifier = Some(qualifier);
        self
    }

    pub fn entity(&self) -> &Arc<Entity> {
        &self.entity
    }

    pub fn operator(&self) -> AdaptorOperator {
        self.operator
    }

    pub fn row(&self) -> Option<&Snapshot> {
        self.row.as_ref()
    }

    pub fn qualifier(&self) -> Option<&Qualifier> {
        self.qualifier.as_ref()
    }
}

/// Sorts `operations` in place by `(entity name, operator ordinal)`, the
/// order [`crate::AdaptorChannel::perform_adaptor_operation`] must be called
/// in within one batch (§4.6).
pub fn sort_for_batch(operations: &mut [AdaptorOperation]) {
    operations.sort_by(|a, b| a.entity.name().cmp(b.entity.name()).then_with(|| a.operator.cmp(&b.operator)));
}

/// What a completed [`AdaptorOperation`] reports back: how many rows it
/// touched, and (for an insert against an auto-increment entity) the
/// generated primary-key values reflected into `result_row`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AdaptorOperationResult {
    pub affected_rows: u64,
    pub result_row: Option<Snapshot>,
}
