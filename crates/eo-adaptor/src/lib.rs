//! The `Adaptor`/`AdaptorChannel` contract, the channel pool, and the
//! row/operation value types that sit between a driver-backed adaptor
//! implementation and the fetch/save orchestration in `eo-channel` and
//! `eo-database`.

pub mod adaptor;
pub mod config;
pub mod error;
pub mod operation;
pub mod pool;
pub mod row;

pub use adaptor::{Adaptor, AdaptorChannel};
pub use config::AdaptorConfig;
pub use error::AdaptorError;
pub use operation::{sort_for_batch, AdaptorOperation, AdaptorOperationResult, AdaptorOperator};
pub use pool::ChannelPool;
pub use row::Row;
