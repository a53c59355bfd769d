use std::collections::{HashMap, HashSet};

use eo_value::Value;

use crate::error::QualifierError;
use crate::operator::Operator;

/// The right-hand side of a `KeyValue` leaf: either a resolved scalar/list of
/// values, or a named binding awaiting substitution.
#[derive(Debug, Clone, PartialEq)]
pub enum QualifierValue {
    Scalar(Value),
    List(Vec<Value>),
    Binding(String),
}

impl From<Value> for QualifierValue {
    fn from(v: Value) -> Self {
        QualifierValue::Scalar(v)
    }
}

/// What a named binding resolves to: either a concrete value (used to
/// resolve a `KeyValue` leaf's `QualifierValue::Binding`), a list of values
/// (for `IN`/`BETWEEN` leaves), or a whole sub-qualifier (used to resolve a
/// top-level `Qualifier::Binding`).
#[derive(Debug, Clone, PartialEq)]
pub enum Binding {
    Value(Value),
    Values(Vec<Value>),
    Qualifier(Qualifier),
}

pub type Bindings = HashMap<String, Binding>;

/// A boolean predicate tree over attribute keys.
///
/// Immutable by construction; resolving bindings (`qualifier_with`) always
/// produces a new tree rather than mutating in place.
#[derive(Debug, Clone, PartialEq)]
pub enum Qualifier {
    And(Vec<Qualifier>),
    Or(Vec<Qualifier>),
    Not(Box<Qualifier>),
    KeyValue {
        key: String,
        op: Operator,
        value: QualifierValue,
    },
    KeyComparison {
        left_key: String,
        op: Operator,
        right_key: String,
    },
    Boolean(bool),
    Sql(String),
    Binding(String),
}

impl Qualifier {
    pub fn key_value(key: impl Into<String>, op: Operator, value: impl Into<QualifierValue>) -> Self {
        Qualifier::KeyValue {
            key: key.into(),
            op,
            value: value.into(),
        }
    }

    pub fn key_comparison(left_key: impl Into<String>, op: Operator, right_key: impl Into<String>) -> Self {
        Qualifier::KeyComparison {
            left_key: left_key.into(),
            op,
            right_key: right_key.into(),
        }
    }

    pub fn and(qualifiers: impl IntoIterator<Item = Qualifier>) -> Self {
        Qualifier::And(qualifiers.into_iter().collect())
    }

    pub fn or(qualifiers: impl IntoIterator<Item = Qualifier>) -> Self {
        Qualifier::Or(qualifiers.into_iter().collect())
    }

    pub fn not(qualifier: Qualifier) -> Self {
        Qualifier::Not(Box::new(qualifier))
    }

    /// ANDs `self` with `other`, applying the short-circuit simplifications
    /// from §4.1: `and(true, q) == q`, `and(false, _) == false`.
    pub fn anded_with(self, other: Qualifier) -> Qualifier {
        simplify_and(vec![self, other])
    }

    /// The set of all unresolved binding names referenced anywhere in the
    /// tree, whether as a whole-qualifier `Binding` or as a `KeyValue`'s
    /// `QualifierValue::Binding`.
    pub fn binding_keys(&self) -> HashSet<String> {
        let mut keys = HashSet::new();
        self.collect_binding_keys(&mut keys);
        keys
    }

    fn collect_binding_keys(&self, keys: &mut HashSet<String>) {
        match self {
            Qualifier::And(children) | Qualifier::Or(children) => {
                for child in children {
                    child.collect_binding_keys(keys);
                }
            }
            Qualifier::Not(inner) => inner.collect_binding_keys(keys),
            Qualifier::KeyValue { value, .. } => {
                if let QualifierValue::Binding(name) = value {
                    keys.insert(name.clone());
                }
            }
            Qualifier::KeyComparison { .. } | Qualifier::Boolean(_) | Qualifier::Sql(_) => {}
            Qualifier::Binding(name) => {
                keys.insert(name.clone());
            }
        }
    }

    /// Substitutes every binding reachable in the tree using `bindings`.
    /// If `requires_all` is set, any binding with no entry in `bindings` is
    /// an error; otherwise unresolved bindings are left in place.
    pub fn qualifier_with(
        &self,
        bindings: &Bindings,
        requires_all: bool,
    ) -> Result<Qualifier, QualifierError> {
        match self {
            Qualifier::And(children) => {
                let resolved = children
                    .iter()
                    .map(|c| c.qualifier_with(bindings, requires_all))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(simplify_and(resolved))
            }
            Qualifier::Or(children) => {
                let resolved = children
                    .iter()
                    .map(|c| c.qualifier_with(bindings, requires_all))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(simplify_or(resolved))
            }
            Qualifier::Not(inner) => Ok(Qualifier::Not(Box::new(
                inner.qualifier_with(bindings, requires_all)?,
            ))),
            Qualifier::KeyValue { key, op, value } => {
                let resolved_value = match value {
                    QualifierValue::Binding(name) => match bindings.get(name) {
                        Some(Binding::Value(v)) => QualifierValue::Scalar(v.clone()),
                        Some(Binding::Values(vs)) => QualifierValue::List(vs.clone()),
                        Some(Binding::Qualifier(_)) => {
                            return Err(QualifierError::BindingKindMismatch(name.clone()))
                        }
                        None if requires_all => {
                            return Err(QualifierError::MissingBinding(name.clone()))
                        }
                        None => QualifierValue::Binding(name.clone()),
                    },
                    other => other.clone(),
                };
                Ok(Qualifier::KeyValue {
                    key: key.clone(),
                    op: *op,
                    value: resolved_value,
                })
            }
            Qualifier::KeyComparison { .. } | Qualifier::Boolean(_) | Qualifier::Sql(_) => {
                Ok(self.clone())
            }
            Qualifier::Binding(name) => match bindings.get(name) {
                Some(Binding::Qualifier(q)) => Ok(q.clone()),
                Some(Binding::Value(_)) | Some(Binding::Values(_)) => {
                    Err(QualifierError::BindingKindMismatch(name.clone()))
                }
                None if requires_all => Err(QualifierError::MissingBinding(name.clone())),
                None => Ok(Qualifier::Binding(name.clone())),
            },
        }
    }
}

fn simplify_and(children: Vec<Qualifier>) -> Qualifier {
    let mut kept = Vec::with_capacity(children.len());
    for child in children {
        match child {
            Qualifier::Boolean(true) => continue,
            Qualifier::Boolean(false) => return Qualifier::Boolean(false),
            Qualifier::And(nested) => kept.extend(nested),
            other => kept.push(other),
        }
    }
    match kept.len() {
        0 => Qualifier::Boolean(true),
        1 => kept.into_iter().next().expect("len checked"),
        _ => Qualifier::And(kept),
    }
}

fn simplify_or(children: Vec<Qualifier>) -> Qualifier {
    let mut kept = Vec::with_capacity(children.len());
    for child in children {
        match child {
            Qualifier::Boolean(false) => continue,
            Qualifier::Boolean(true) => return Qualifier::Boolean(true),
            Qualifier::Or(nested) => kept.extend(nested),
            other => kept.push(other),
        }
    }
    match kept.len() {
        0 => Qualifier::Boolean(false),
        1 => kept.into_iter().next().expect("len checked"),
        _ => Qualifier::Or(kept),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kv(key: &str, op: Operator, v: i64) -> Qualifier {
        Qualifier::key_value(key, op, Value::Int(v))
    }

    #[test]
    fn and_true_is_identity() {
        let q = kv("age", Operator::GreaterThan, 18);
        let combined = Qualifier::Boolean(true).anded_with(q.clone());
        assert_eq!(combined, q);
    }

    #[test]
    fn and_false_absorbs() {
        let q = kv("age", Operator::GreaterThan, 18);
        let combined = Qualifier::Boolean(false).anded_with(q);
        assert_eq!(combined, Qualifier::Boolean(false));
    }

    #[test]
    fn or_true_absorbs() {
        let resolved = simplify_or(vec![Qualifier::Boolean(true), kv("age", Operator::Equal, 1)]);
        assert_eq!(resolved, Qualifier::Boolean(true));
    }

    #[test]
    fn binding_keys_collects_both_forms() {
        let q = Qualifier::and([
            Qualifier::key_value("active", Operator::Equal, QualifierValue::Binding("isActive".into())),
            Qualifier::Binding("extra".into()),
        ]);
        let keys = q.binding_keys();
        assert!(keys.contains("isActive"));
        assert!(keys.contains("extra"));
        assert_eq!(keys.len(), 2);
    }

    #[test]
    fn qualifier_with_requires_all_fails_on_missing() {
        let q = Qualifier::key_value("active", Operator::Equal, QualifierValue::Binding("isActive".into()));
        let err = q.qualifier_with(&Bindings::new(), true).unwrap_err();
        assert_eq!(err, QualifierError::MissingBinding("isActive".into()));
    }

    #[test]
    fn qualifier_with_leaves_unresolved_when_not_required() {
        let q = Qualifier::key_value("active", Operator::Equal, QualifierValue::Binding("isActive".into()));
        let resolved = q.qualifier_with(&Bindings::new(), false).unwrap();
        assert_eq!(resolved, q);
    }

    #[test]
    fn qualifier_with_substitutes_whole_qualifier_binding() {
        let q = Qualifier::Binding("filter".into());
        let mut bindings = Bindings::new();
        bindings.insert("filter".into(), Binding::Qualifier(Qualifier::Boolean(true)));
        let resolved = q.qualifier_with(&bindings, true).unwrap();
        assert_eq!(resolved, Qualifier::Boolean(true));
    }

    #[test]
    fn structural_equality() {
        let a = Qualifier::and([kv("x", Operator::Equal, 1), kv("y", Operator::Equal, 2)]);
        let b = Qualifier::and([kv("x", Operator::Equal, 1), kv("y", Operator::Equal, 2)]);
        assert_eq!(a, b);
    }
}
