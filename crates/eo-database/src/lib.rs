//! [`Database`]: the top-level facade (§4.6) application code drives — fetch,
//! find, save, delete — built directly on top of `eo-channel`'s fetch
//! orchestrator and `eo-adaptor`'s write primitives.
//!
//! Fetch/find reads go through [`eo_channel::DatabaseChannel`] (prefetch,
//! materialization, and the always-rollback discipline for an owned
//! transaction all live there); this crate owns the save/delete side:
//! [`operation::DatabaseOperation`]'s insert/update/delete expansion and
//! `Database::perform_database_operations`'s batch transaction, which always
//! commits on success, the opposite of a read's always-rollback.

pub mod database;
pub mod error;
pub mod operation;

pub use database::Database;
pub use error::DatabaseError;
pub use operation::DatabaseOperation;
