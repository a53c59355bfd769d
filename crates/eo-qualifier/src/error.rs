use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum QualifierError {
    #[error("qualifier binding {0:?} has no supplied value")]
    MissingBinding(String),

    #[error("qualifier binding {0:?} resolved to the wrong kind (expected a qualifier, got a value, or vice versa)")]
    BindingKindMismatch(String),
}
