use eo_qualifier::Bindings;

/// The "hint bag" carried by a [`crate::FetchSpecification`].
///
/// Two hints are understood by the core itself: `bindings`, substituted into
/// the fetch's qualifier before SQL synthesis (§4.3 step 1), and
/// `raw_sql`, a verbatim SQL override (the "custom-SQL hint": when present,
/// the expression builder uses this text directly but still records the
/// attribute list for result decoding).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchHints {
    pub bindings: Bindings,
    pub raw_sql: Option<String>,
}

impl FetchHints {
    pub fn new() -> Self {
        FetchHints::default()
    }

    pub fn with_bindings(mut self, bindings: Bindings) -> Self {
        self.bindings = bindings;
        self
    }

    pub fn with_raw_sql(mut self, sql: impl Into<String>) -> Self {
        self.raw_sql = Some(sql.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty() && self.raw_sql.is_none()
    }
}
