use eo_value::Value;

/// A single result row: an ordered sequence of positionally-addressed values
/// together with the attribute names it was fetched for (in the same order
/// as [`eo_sql::SqlExpression::result_attribute_names`], which is what an
/// adaptor channel decodes a raw driver row against).
///
/// Supports both positional and name-indexed access; `eo-channel`'s
/// materialization step only ever uses name-indexed access, but positional
/// access is what a concrete adaptor's driver decode loop would build a `Row`
/// from in the first place.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    attribute_names: Vec<String>,
    values: Vec<Option<Value>>,
}

impl Row {
    pub fn new(attribute_names: Vec<String>, values: Vec<Option<Value>>) -> Self {
        debug_assert_eq!(attribute_names.len(), values.len(), "row must have one value per attribute name");
        Row { attribute_names, values }
    }

    pub fn attribute_names(&self) -> &[String] {
        &self.attribute_names
    }

    pub fn value_at(&self, position: usize) -> Option<&Option<Value>> {
        self.values.get(position)
    }

    /// Looks up a value by attribute name. `None` if the name was not
    /// projected by this row at all; `Some(None)` if projected but SQL NULL.
    pub fn value_for(&self, attribute_name: &str) -> Option<Option<&Value>> {
        let position = self.attribute_names.iter().position(|n| n == attribute_name)?;
        Some(self.values[position].as_ref())
    }

    /// Converts this row into an [`eo_model::Snapshot`] keyed by attribute
    /// name, which is what `eo-channel`'s row-to-object materialization
    /// consumes.
    pub fn into_snapshot(self) -> eo_model::Snapshot {
        let mut snapshot = eo_model::Snapshot::new();
        for (name, value) in self.attribute_names.into_iter().zip(self.values.into_iter()) {
            snapshot.set(name, value);
        }
        snapshot
    }
}
