//! Fetch orchestration (§4.5): row-to-object materialization, relationship
//! prefetch, and the transaction/pool lifecycle a single fetch drives an
//! [`eo_adaptor::AdaptorChannel`] through.
//!
//! Sits directly above `eo-adaptor`/`eo-sql`/`eo-object` and is in turn the
//! layer `eo-database`'s `Database`/`DataSource` façade drives; nothing in
//! this crate knows about the save side of that façade (`DatabaseOperation`
//! batching lives there, not here).

pub mod channel;
pub mod error;
pub mod materialize;
pub mod prefetch;

pub use channel::DatabaseChannel;
pub use error::ChannelError;
pub use materialize::materialize_row;
pub use prefetch::{prefetch_key_paths, PrefetchKey};
