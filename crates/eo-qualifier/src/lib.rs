//! Boolean predicate tree ([`Qualifier`]) and ordering terms ([`SortOrdering`])
//! shared by fetch specifications and the SQL expression builder.

mod error;
mod operator;
mod qualifier;
mod sort_ordering;

pub use error::QualifierError;
pub use operator::Operator;
pub use qualifier::{Binding, Bindings, Qualifier, QualifierValue};
pub use sort_ordering::{SortOrdering, SortSelector};
