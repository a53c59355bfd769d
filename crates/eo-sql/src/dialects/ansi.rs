use crate::dialect::{Dialect, DialectKind};

/// The baseline dialect: every default in [`Dialect`] is ANSI-reasonable, so
/// this type overrides nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnsiDialect;

impl Dialect for AnsiDialect {
    fn kind(&self) -> DialectKind {
        DialectKind::Ansi
    }
}
