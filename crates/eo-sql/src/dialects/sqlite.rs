use eo_model::ValueType;

use crate::dialect::{Dialect, DialectKind, PlaceholderStyle};

#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteDialect;

impl Dialect for SqliteDialect {
    fn kind(&self) -> DialectKind {
        DialectKind::Sqlite
    }

    fn placeholder_style(&self) -> PlaceholderStyle {
        PlaceholderStyle::Positional
    }

    /// SQLite has no row-level locking; there is no equivalent clause to
    /// emit for a locking fetch.
    fn lock_clause(&self) -> Option<&'static str> {
        None
    }

    fn column_type(&self, value_type: ValueType, _width: Option<u32>, is_auto_increment: bool) -> String {
        match (value_type, is_auto_increment) {
            (ValueType::Int, true) => "INTEGER".to_string(),
            (ValueType::Int, false) => "INTEGER".to_string(),
            (ValueType::Float, _) => "REAL".to_string(),
            (ValueType::Bool, _) => "INTEGER".to_string(),
            (ValueType::Bytes, _) => "BLOB".to_string(),
            (ValueType::Text, _) => "TEXT".to_string(),
        }
    }
}
