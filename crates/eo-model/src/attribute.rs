use eo_value::Value;

/// The logical type of an attribute's stored value, independent of any one
/// dialect's column-type spelling. Dialects map these to their own DDL
/// tokens (`INTEGER`, `INT8`, `BIGINT`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    Int,
    Float,
    Text,
    Bool,
    Bytes,
}

/// One column of an [`crate::entity::Entity`].
///
/// Invariant: `column_name_or_name()` is `external_name` if set, else `name`.
#[derive(Debug, Clone)]
pub struct Attribute {
    name: String,
    external_name: Option<String>,
    value_type: ValueType,
    width: Option<u32>,
    precision: Option<u32>,
    default_value: Option<Value>,
    allows_null: bool,
    is_auto_increment: bool,
    /// A format string with a single `%@` placeholder substituted with the
    /// attribute's qualified column expression by the SQL builder, e.g.
    /// `"COUNT(*)"` or `"LOWER(%@)"`.
    read_format: Option<String>,
    use_bind_variable: Option<bool>,
}

impl Attribute {
    pub fn new(name: impl Into<String>, value_type: ValueType) -> Self {
        Attribute {
            name: name.into(),
            external_name: None,
            value_type,
            width: None,
            precision: None,
            default_value: None,
            allows_null: true,
            is_auto_increment: false,
            read_format: None,
            use_bind_variable: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn external_name(&self) -> Option<&str> {
        self.external_name.as_deref()
    }

    pub fn with_external_name(mut self, external_name: impl Into<String>) -> Self {
        self.external_name = Some(external_name.into());
        self
    }

    /// `columnNameOrName` per §3: the external (column) name if set, else the
    /// attribute's own name.
    pub fn column_name_or_name(&self) -> &str {
        self.external_name.as_deref().unwrap_or(&self.name)
    }

    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    pub fn width(&self) -> Option<u32> {
        self.width
    }

    pub fn with_width(mut self, width: u32) -> Self {
        self.width = Some(width);
        self
    }

    pub fn precision(&self) -> Option<u32> {
        self.precision
    }

    pub fn with_precision(mut self, precision: u32) -> Self {
        self.precision = Some(precision);
        self
    }

    pub fn default_value(&self) -> Option<&Value> {
        self.default_value.as_ref()
    }

    pub fn with_default_value(mut self, value: impl Into<Value>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    pub fn allows_null(&self) -> bool {
        self.allows_null
    }

    pub fn required(mut self) -> Self {
        self.allows_null = false;
        self
    }

    pub fn is_auto_increment(&self) -> bool {
        self.is_auto_increment
    }

    pub fn auto_increment(mut self) -> Self {
        self.is_auto_increment = true;
        self
    }

    pub fn read_format(&self) -> Option<&str> {
        self.read_format.as_deref()
    }

    pub fn with_read_format(mut self, format: impl Into<String>) -> Self {
        self.read_format = Some(format.into());
        self
    }

    /// The count pseudo-attribute: `COUNT(*)`, not bound to a real column,
    /// never null-allowed, never auto-increment.
    pub fn count_pseudo_attribute() -> Self {
        Attribute::new("count", ValueType::Int)
            .with_read_format("COUNT(*)")
            .required()
    }

    /// Whether a value for this attribute should be emitted as a bind
    /// placeholder rather than an inlined literal. Defaults to `true` for
    /// variable-width types (text/bytes); integers and booleans default to
    /// inlining. Explicit overrides via [`Attribute::with_use_bind_variable`]
    /// always win.
    pub fn should_use_bind_variable(&self) -> bool {
        if let Some(explicit) = self.use_bind_variable {
            return explicit;
        }
        matches!(self.value_type, ValueType::Text | ValueType::Bytes)
    }

    pub fn with_use_bind_variable(mut self, should_bind: bool) -> Self {
        self.use_bind_variable = Some(should_bind);
        self
    }
}
