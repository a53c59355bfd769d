use std::collections::BTreeMap;

use eo_value::Value;

/// A mapping from attribute name to an optional value.
///
/// The `Option` is semantic, not an artifact of storage: a present key with
/// an absent value represents SQL `NULL`, distinct from a key that is
/// missing entirely (e.g. an attribute that was never selected by a
/// fetch). Code that diffs snapshots must treat "missing" and "present but
/// null" as different states.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot(BTreeMap<String, Option<Value>>);

impl Snapshot {
    pub fn new() -> Self {
        Snapshot(BTreeMap::new())
    }

    pub fn set(&mut self, attribute_name: impl Into<String>, value: Option<Value>) {
        self.0.insert(attribute_name.into(), value);
    }

    pub fn with(mut self, attribute_name: impl Into<String>, value: Option<Value>) -> Self {
        self.set(attribute_name, value);
        self
    }

    /// `None` if the key is absent; `Some(None)` if present but null;
    /// `Some(Some(v))` if present with a value.
    pub fn get(&self, attribute_name: &str) -> Option<Option<&Value>> {
        self.0.get(attribute_name).map(|v| v.as_ref())
    }

    pub fn contains_key(&self, attribute_name: &str) -> bool {
        self.0.contains_key(attribute_name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&Value>)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_ref()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Attribute names present in `self` but absent or differently-valued in
    /// `other`, plus attribute names present only in `other`. Used for
    /// `changesFromSnapshot`-style diffing; the round-trip property in the
    /// spec requires this to be empty when `other` was itself produced by
    /// applying `self` unmodified.
    pub fn changes_from(&self, other: &Snapshot) -> Snapshot {
        let mut changes = Snapshot::new();
        for (key, value) in self.iter() {
            if other.get(key) != Some(value) {
                changes.set(key, value.cloned());
            }
        }
        for (key, value) in other.iter() {
            if self.get(key).is_none() {
                changes.set(key, value.cloned());
            }
        }
        changes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn present_null_differs_from_missing() {
        let mut snap = Snapshot::new();
        snap.set("middle_name", None);
        assert!(snap.contains_key("middle_name"));
        assert_eq!(snap.get("middle_name"), Some(None));
        assert_eq!(snap.get("nickname"), None);
    }

    #[test]
    fn changes_from_identical_is_empty() {
        let snap = Snapshot::new()
            .with("id", Some(Value::Int(1)))
            .with("name", Some(Value::Text("Ada".into())));
        let changes = snap.changes_from(&snap.clone());
        assert!(changes.is_empty());
    }

    #[test]
    fn changes_from_detects_modified_and_added_keys() {
        let before = Snapshot::new().with("name", Some(Value::Text("Ada".into())));
        let after = Snapshot::new()
            .with("name", Some(Value::Text("Grace".into())))
            .with("nickname", Some(Value::Text("G".into())));
        let changes = before.changes_from(&after);
        assert_eq!(
            changes.get("name"),
            Some(Some(&Value::Text("Ada".into())))
        );
        assert_eq!(
            changes.get("nickname"),
            Some(Some(&Value::Text("G".into())))
        );
    }
}
