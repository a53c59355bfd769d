use eo_value::Value;

/// A fully-rendered SQL statement plus its positional bind values and the
/// attribute names the caller should decode result rows against.
///
/// `result_attribute_names` is empty for statements that produce no rows
/// (INSERT/UPDATE/DELETE without a RETURNING clause); for a SELECT it lists
/// the attributes in the same order as the statement's select list, which is
/// what `eo-channel` uses to materialize a `Row` back into typed values.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlExpression {
    pub statement: String,
    pub bind_values: Vec<Value>,
    pub result_attribute_names: Vec<String>,
}

impl SqlExpression {
    pub fn new(statement: impl Into<String>) -> Self {
        SqlExpression {
            statement: statement.into(),
            bind_values: Vec::new(),
            result_attribute_names: Vec::new(),
        }
    }

    pub fn with_bind_values(mut self, values: Vec<Value>) -> Self {
        self.bind_values = values;
        self
    }

    pub fn with_result_attribute_names(mut self, names: Vec<String>) -> Self {
        self.result_attribute_names = names;
        self
    }
}
