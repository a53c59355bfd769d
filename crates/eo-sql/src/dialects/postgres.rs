use eo_model::ValueType;

use crate::dialect::{Dialect, DialectKind, PlaceholderStyle};

#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresDialect;

impl Dialect for PostgresDialect {
    fn kind(&self) -> DialectKind {
        DialectKind::Postgres
    }

    fn placeholder_style(&self) -> PlaceholderStyle {
        PlaceholderStyle::Numbered
    }

    fn case_insensitive_like_operator(&self) -> &'static str {
        "ILIKE"
    }

    fn supports_returning(&self) -> bool {
        true
    }

    fn column_type(&self, value_type: ValueType, width: Option<u32>, is_auto_increment: bool) -> String {
        match (value_type, is_auto_increment) {
            (ValueType::Int, true) => "BIGSERIAL".to_string(),
            (ValueType::Int, false) => "BIGINT".to_string(),
            (ValueType::Float, _) => "DOUBLE PRECISION".to_string(),
            (ValueType::Bool, _) => "BOOLEAN".to_string(),
            (ValueType::Bytes, _) => "BYTEA".to_string(),
            (ValueType::Text, _) => match width {
                Some(width) => format!("VARCHAR({width})"),
                None => "TEXT".to_string(),
            },
        }
    }
}
