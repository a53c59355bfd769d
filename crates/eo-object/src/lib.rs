//! The object layer: the `DatabaseObject` accessor contract objects expose to
//! the rest of the core, plus the object-uniquing and generic-record support
//! built on top of it.

pub mod database_object;
pub mod error;
pub mod generic_record;
pub mod relationship_holder;
pub mod tracking_context;

pub use database_object::{DatabaseObject, SnapshotHolding};
pub use error::ObjectError;
pub use generic_record::GenericRecord;
pub use relationship_holder::RelationshipHolder;
pub use tracking_context::TrackingContext;
