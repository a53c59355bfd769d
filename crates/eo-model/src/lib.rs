//! Entity/relationship/model layer: the structural description of what gets
//! mapped to SQL, independent of any one database connection.
//!
//! Depends on `eo-value` (scalar values), `eo-qualifier` (restricting
//! qualifiers and `Qualifier` bindings embedded in relationships/entities),
//! and `eo-fetch` (named fetch specifications on entities). Deliberately does
//! not depend on `eo-sql` or `eo-adaptor`, which instead depend on this
//! crate, keeping the dependency graph acyclic.

pub mod attribute;
pub mod entity;
pub mod error;
pub mod global_id;
pub mod join;
pub mod model;
pub mod pattern;
pub mod relationship;
pub mod snapshot;

pub use attribute::{Attribute, ValueType};
pub use entity::{Entity, EntityBuilder};
pub use error::ModelError;
pub use global_id::GlobalId;
pub use join::Join;
pub use model::{Model, ModelTag};
pub use pattern::apply_pattern;
pub use relationship::{DeleteRule, Relationship};
pub use snapshot::Snapshot;
