use std::fmt::Debug;

use eo_model::ValueType;

/// Placeholder style a dialect uses for bound values in emitted SQL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderStyle {
    /// `$1`, `$2`, ... (Postgres).
    Numbered,
    /// `?` repeated (MySQL, SQLite).
    Positional,
}

/// A marker distinguishing which concrete dialect an `AdaptorConfig` (see
/// `eo-adaptor`) should select an `ExpressionFactory` for. Kept separate from
/// `Dialect` itself (a trait, not serializable) so configuration can name a
/// dialect without depending on a trait object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DialectKind {
    Ansi,
    Postgres,
    MySql,
    Sqlite,
}

/// The per-backend knobs the SQL expression builder and DDL generator defer
/// to: identifier quoting, bind-placeholder spelling, row locking, and
/// column-type spelling. Every method has an ANSI-reasonable default;
/// concrete dialects override only where they diverge (mirrors the
/// `DialectLexerConf`/`DialectParserConf` default-method pattern other SQL
/// front ends in this corpus use for the same reason: most dialects agree on
/// most things).
pub trait Dialect: Debug {
    fn kind(&self) -> DialectKind;

    fn placeholder_style(&self) -> PlaceholderStyle {
        PlaceholderStyle::Positional
    }

    /// Renders the placeholder for the `position`-th (1-based) bound value.
    fn placeholder(&self, position: usize) -> String {
        match self.placeholder_style() {
            PlaceholderStyle::Numbered => format!("${position}"),
            PlaceholderStyle::Positional => "?".to_string(),
        }
    }

    /// Quotes an identifier (table or column name) for safe embedding in SQL.
    /// The default doubles embedded quote characters per the ANSI-standard
    /// double-quote convention; MySQL overrides to backticks.
    fn quote_identifier(&self, identifier: &str) -> String {
        format!("\"{}\"", identifier.replace('"', "\"\""))
    }

    /// The operator token for a case-insensitive pattern match. Most
    /// dialects' default text collation is already case-insensitive, so
    /// plain `LIKE` suffices; Postgres is the notable exception and needs
    /// its dedicated `ILIKE`.
    fn case_insensitive_like_operator(&self) -> &'static str {
        "LIKE"
    }

    /// The row-level lock clause appended to a locking SELECT, if the
    /// dialect supports one.
    fn lock_clause(&self) -> Option<&'static str> {
        Some("FOR UPDATE")
    }

    /// Renders `LIMIT`/`OFFSET` (or dialect equivalent). `None` if neither is
    /// set.
    fn limit_offset_clause(&self, limit: Option<u64>, offset: Option<u64>) -> Option<String> {
        match (limit, offset) {
            (None, None) => None,
            (Some(limit), None) => Some(format!("LIMIT {limit}")),
            (None, Some(offset)) => Some(format!("OFFSET {offset}")),
            (Some(limit), Some(offset)) => Some(format!("LIMIT {limit} OFFSET {offset}")),
        }
    }

    /// Whether this dialect prefers inline `REFERENCES` clauses for foreign
    /// keys over post-table `ALTER TABLE ... ADD CONSTRAINT`.
    fn supports_inline_foreign_keys(&self) -> bool {
        true
    }

    /// Whether `INSERT` can carry a `RETURNING` clause to hand generated
    /// primary-key values back in the same round-trip. Dialects without
    /// support (MySQL, SQLite) rely on a separate `last_insert_id`-style
    /// reflection the adaptor performs after the insert.
    fn supports_returning(&self) -> bool {
        false
    }

    /// The column-type DDL token for a logical [`ValueType`], honoring an
    /// optional width (`VARCHAR(width)`) and auto-increment (serial/identity
    /// spelling is dialect-specific).
    fn column_type(&self, value_type: ValueType, width: Option<u32>, is_auto_increment: bool) -> String {
        match (value_type, is_auto_increment) {
            (ValueType::Int, true) => "INTEGER".to_string(),
            (ValueType::Int, false) => "INTEGER".to_string(),
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
