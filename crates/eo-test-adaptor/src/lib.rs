//! An in-process [`eo_adaptor::Adaptor`]/[`eo_adaptor::AdaptorChannel`] pair
//! backed by in-memory tables, standing in for a real driver so
//! `eo-channel`/`eo-database` (and this crate's own pool/transaction
//! bookkeeping) can be exercised without a socket.

pub mod adaptor;
pub mod channel;
pub mod factory;
pub mod store;

pub use adaptor::InProcessAdaptor;
pub use channel::TestAdaptorChannel;
pub use factory::{PlanRegistry, SelectPlan, TestExpressionFactory};
