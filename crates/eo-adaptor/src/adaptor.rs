use std::sync::Arc;

use eo_model::Model;
use eo_sql::{ExpressionFactory, SqlExpression};

use crate::error::AdaptorError;
use crate::operation::{AdaptorOperation, AdaptorOperationResult};
use crate::row::Row;

/// The top-level handle a `Database` holds onto: the model/factory a
/// concrete backend exposes, and the channel pool it hands channels out of.
/// A concrete adaptor crate (e.g. an in-process test adaptor, or a real
/// driver-backed one) implements this once per backend; `eo-channel` and
/// `eo-database` only ever depend on this trait, never on a concrete type.
#[async_trait::async_trait]
pub trait Adaptor: Send + Sync {
    /// The model this adaptor serves requests against.
    fn model(&self) -> &Arc<Model>;

    /// The dialect-specific statement synthesizer for this adaptor's backend.
    fn expression_factory(&self) -> &dyn ExpressionFactory;

    /// Opens a brand new channel, bypassing the pool entirely. Used by
    /// `open_channel_from_pool` on a pool miss, and available directly to
    /// callers that need a channel outside the pool's lifecycle (e.g. schema
    /// migration tooling).
    async fn open_channel(&self) -> Result<Box<dyn AdaptorChannel>, AdaptorError>;

    /// Returns a channel from the pool if one is available and unexpired,
    /// opening a fresh one otherwise (§4.4).
    async fn open_channel_from_pool(&self) -> Result<Box<dyn AdaptorChannel>, AdaptorError>;

    /// Returns a channel to the pool for reuse. A channel with a transaction
    /// still in progress is rolled back and discarded rather than pooled
    /// (§4.4, §8's pool-safety invariant).
    async fn release_channel(&self, channel: Box<dyn AdaptorChannel>);
}

/// A single logical connection to the backing store. `eo-channel`'s
/// `DatabaseChannel` drives one of these through a fetch or a save; this
/// crate only defines the contract, never the wire protocol underneath it.
///
/// `evaluate_query_expression` returns its rows eagerly rather than as a
/// stream: the synthesized SQL already bounds the result set (limit/offset
/// applied by `eo-sql`), and `eo-channel`'s own lazy-iterator semantics live
/// one layer up, over the already-materialized rows, so nothing above this
/// trait needs a stream here.
#[async_trait::async_trait]
pub trait AdaptorChannel: Send {
    /// Starts a transaction. Returns [`AdaptorError::TransactionAlreadyInProgress`]
    /// if one is already open on this channel.
    async fn begin(&mut self) -> Result<(), AdaptorError>;

    /// Commits the open transaction. Returns [`AdaptorError::NoTransactionInProgress`]
    /// if none is open.
    async fn commit(&mut self) -> Result<(), AdaptorError>;

    /// Rolls back the open transaction. Returns [`AdaptorError::NoTransactionInProgress`]
    /// if none is open.
    async fn rollback(&mut self) -> Result<(), AdaptorError>;

    /// Whether a transaction is currently open on this channel.
    fn is_transaction_in_progress(&self) -> bool;

    /// Executes a synthesized SELECT and returns its rows.
    async fn evaluate_query_expression(&mut self, expression: &SqlExpression) -> Result<Vec<Row>, AdaptorError>;

    /// Executes a single write operation (insert/update/delete/lock),
    /// synthesizing its SQL via `factory` and reporting affected-row count
    /// and, for an insert, any generated key values.
    async fn perform_adaptor_operation(
        &mut self,
        factory: &dyn ExpressionFactory,
        operation: &AdaptorOperation,
    ) -> Result<AdaptorOperationResult, AdaptorError>;

    /// Executes a raw SQL statement built outside the expression factory
    /// (e.g. DDL) and returns its rows, if any.
    async fn query_sql(&mut self, statement: &str) -> Result<Vec<Row>, AdaptorError>;

    /// Executes a raw SQL statement for its side effect only, returning the
    /// affected-row count.
    async fn perform_sql(&mut self, statement: &str) -> Result<u64, AdaptorError>;
}
