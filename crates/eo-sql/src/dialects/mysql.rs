use eo_model::ValueType;

use crate::dialect::{Dialect, DialectKind, PlaceholderStyle};

#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlDialect;

impl Dialect for MySqlDialect {
    fn kind(&self) -> DialectKind {
        DialectKind::MySql
    }

    fn placeholder_style(&self) -> PlaceholderStyle {
        PlaceholderStyle::Positional
    }

    fn quote_identifier(&self, identifier: &str) -> String {
        format!("`{}`", identifier.replace('`', "``"))
    }

    /// MySQL wants foreign keys as post-table `ALTER TABLE` statements so
    /// that circular references between entity groups don't block table
    /// creation order.
    fn supports_inline_foreign_keys(&self) -> bool {
        false
    }

    fn column_type(&self, value_type: ValueType, width: Option<u32>, is_auto_increment: bool) -> String {
        match (value_type, is_auto_increment) {
            (ValueType::Int, true) => "BIGINT AUTO_INCREMENT".to_string(),
            (ValueType::Int, false) => "BIGINT".to_string(),
            (ValueType::Float, _) => "DOUBLE".to_string(),
            (ValueType::Bool, _) => "TINYINT(1)".to_string(),
            (ValueType::Bytes, _) => "BLOB".to_string(),
            (ValueType::Text, _) => match width {
                Some(width) => format!("VARCHAR({width})"),
                None => "TEXT".to_string(),
            },
        }
    }
}
