//! Declarative fetch requests ([`FetchSpecification`]) consumed by the SQL
//! expression builder and the database channel.

mod fetch_specification;
mod hints;

pub use fetch_specification::{FetchSpecification, TypedFetchSpecification};
pub use hints::FetchHints;
