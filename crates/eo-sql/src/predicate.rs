use eo_qualifier::{Operator, Qualifier, QualifierValue};
use eo_value::Value;

use crate::builder::AliasBook;
use crate::dialect::Dialect;
use crate::error::SqlError;

/// Renders `qualifier` as a parenthesized SQL boolean expression, appending
/// any bound values (in emission order) to `binds` and allocating aliases/
/// joins for any relationship key-paths it references via `aliases`.
///
/// Bindings must already be resolved (see `Qualifier::qualifier_with`) before
/// reaching this function; an unresolved `Qualifier::Binding` or
/// `QualifierValue::Binding` is reported as [`SqlError::UnresolvedBindings`].
pub fn render_qualifier(qualifier: &Qualifier, aliases: &mut AliasBook<'_>, binds: &mut Vec<Value>) -> Result<String, SqlError> {
    match qualifier {
        Qualifier::Boolean(true) => Ok("(1 = 1)".to_string()),
        Qualifier::Boolean(false) => Ok("(1 = 0)".to_string()),
        Qualifier::Sql(raw) => Ok(format!("({raw})")),
        Qualifier::Binding(key) => Err(SqlError::unresolved_bindings([key.clone()].into_iter().collect())),
        Qualifier::Not(inner) => Ok(format!("(NOT {})", render_qualifier(inner, aliases, binds)?)),
        Qualifier::And(children) => render_conjunction(children, " AND ", "(1 = 1)", aliases, binds),
        Qualifier::Or(children) => render_conjunction(children, " OR ", "(1 = 0)", aliases, binds),
        Qualifier::KeyComparison { left_key, op, right_key } => {
            if op.is_variadic() || op.is_nullary() {
                return Err(SqlError::KeyComparisonAcrossRelationship(format!("{left_key} {op:?} {right_key}")));
            }
            let left = aliases.resolve(left_key)?;
            let right = aliases.resolve(right_key)?;
            let left_column = aliases.quoted(&left.alias, left.attribute.column_name_or_name());
            let right_column = aliases.quoted(&right.alias, right.attribute.column_name_or_name());
            Ok(format!("({left_column} {} {right_column})", operator_token(*op, aliases.dialect())))
        }
        Qualifier::KeyValue { key, op, value } => render_key_value(key, *op, value, aliases, binds),
    }
}

fn render_conjunction(
    children: &[Qualifier],
    joiner: &str,
    empty: &str,
    aliases: &mut AliasBook<'_>,
    binds: &mut Vec<Value>,
) -> Result<String, SqlError> {
    if children.is_empty() {
        return Ok(empty.to_string());
    }
    let mut rendered = Vec::with_capacity(children.len());
    for child in children {
        rendered.push(render_qualifier(child, aliases, binds)?);
    }
    Ok(format!("({})", rendered.join(joiner)))
}

fn render_key_value(
    key: &str,
    op: Operator,
    value: &QualifierValue,
    aliases: &mut AliasBook<'_>,
    binds: &mut Vec<Value>,
) -> Result<String, SqlError> {
    let resolved = aliases.resolve(key)?;
    let column = aliases.quoted(&resolved.alias, resolved.attribute.column_name_or_name());
    let should_bind = resolved.attribute.should_use_bind_variable();
    let dialect = aliases.dialect();

    match op {
        Operator::IsNull => Ok(format!("({column} IS NULL)")),
        Operator::In => {
            let values = expect_list(key, value)?;
            let rendered: Vec<String> = values.iter().map(|v| emit_value(v, should_bind, binds, dialect, binds.len() + 1)).collect();
            Ok(format!("({column} IN ({}))", rendered.join(", ")))
        }
        Operator::Between => {
            let values = expect_list(key, value)?;
            if values.len() != 2 {
                return Err(SqlError::UnresolvedBindings(vec![format!("{key}: BETWEEN requires exactly two values")]));
            }
            let low = emit_value(&values[0], should_bind, binds, dialect, binds.len() + 1);
            let high = emit_value(&values[1], should_bind, binds, dialect, binds.len() + 1);
            Ok(format!("({column} BETWEEN {low} AND {high})"))
        }
        Operator::Contains => {
            let scalar = expect_scalar(key, value)?;
            let wrapped = wrap_for_contains(scalar);
            let placeholder = emit_value(&wrapped, should_bind, binds, dialect, binds.len() + 1);
            Ok(format!("({column} LIKE {placeholder} ESCAPE '\\')"))
        }
        Operator::ILike => {
            let scalar = expect_scalar(key, value)?;
            let placeholder = emit_value(scalar, should_bind, binds, dialect, binds.len() + 1);
            Ok(format!("({column} {} {placeholder})", dialect.case_insensitive_like_operator()))
        }
        _ => {
            let scalar = expect_scalar(key, value)?;
            let placeholder = emit_value(scalar, should_bind, binds, dialect, binds.len() + 1);
            Ok(format!("({column} {} {placeholder})", operator_token(op, dialect)))
        }
    }
}

fn expect_scalar<'v>(key: &str, value: &'v QualifierValue) -> Result<&'v Value, SqlError> {
    match value {
        QualifierValue::Scalar(v) => Ok(v),
        QualifierValue::List(_) => Err(SqlError::unresolved_bindings(
            [format!("{key}: expected a single value, got a list")].into_iter().collect(),
        )),
        QualifierValue::Binding(name) => Err(SqlError::unresolved_bindings([name.clone()].into_iter().collect())),
    }
}

fn expect_list<'v>(key: &str, value: &'v QualifierValue) -> Result<&'v [Value], SqlError> {
    match value {
        QualifierValue::List(values) => Ok(values),
        QualifierValue::Scalar(_) => Err(SqlError::unresolved_bindings(
            [format!("{key}: expected a list of values, got a single value")].into_iter().collect(),
        )),
        QualifierValue::Binding(name) => Err(SqlError::unresolved_bindings([name.clone()].into_iter().collect())),
    }
}

fn wrap_for_contains(value: &Value) -> Value {
    match value {
        Value::Text(text) => {
            let escaped = text.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_");
            Value::Text(format!("%{escaped}%"))
        }
        other => other.clone(),
    }
}

/// Appends `value` to `binds` and returns its placeholder if `should_bind`,
/// otherwise renders it as an inline SQL literal (only done for the integral/
/// boolean leaves `Attribute::should_use_bind_variable` excludes by default).
fn emit_value(value: &Value, should_bind: bool, binds: &mut Vec<Value>, dialect: &dyn Dialect, position: usize) -> String {
    if should_bind {
        binds.push(value.clone());
        dialect.placeholder(position)
    } else {
        inline_literal(value)
    }
}

fn inline_literal(value: &Value) -> String {
    match value {
        Value::Int(v) => v.to_string(),
        Value::Float(v) => v.to_string(),
        Value::Bool(v) => if *v { "TRUE".to_string() } else { "FALSE".to_string() },
        Value::Text(v) => format!("'{}'", v.replace('\'', "''")),
        Value::Bytes(_) => unreachable!("should_use_bind_variable defaults true for Bytes"),
    }
}

fn operator_token(op: Operator, dialect: &dyn Dialect) -> &'static str {
    match op {
        Operator::Equal => "=",
        Operator::NotEqual => "!=",
        Operator::LessThan => "<",
        Operator::LessThanOrEqual => "<=",
        Operator::GreaterThan => ">",
        Operator::GreaterThanOrEqual => ">=",
        Operator::Like => "LIKE",
        Operator::ILike => dialect.case_insensitive_like_operator(),
        Operator::In | Operator::Contains | Operator::Between | Operator::IsNull => {
            unreachable!("handled by dedicated branches in render_key_value")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialects::{AnsiDialect, PostgresDialect};
    use eo_model::{Attribute, DeleteRule, Entity, Join, Model, ModelTag, Relationship, ValueType};
    use eo_qualifier::Qualifier;

    fn model() -> Model {
        let person = Entity::builder("Person")
            .attribute(Attribute::new("id", ValueType::Int).required())
            .attribute(Attribute::new("name", ValueType::Text))
            .primary_key(vec!["id"])
            .relationship(
                Relationship::new("addresses", true)
                    .with_destination_entity_name("Address")
                    .with_joins(vec![Join::new("id", "person_id")])
                    .with_delete_rule(DeleteRule::Cascade),
            )
            .build()
            .unwrap();
        let address = Entity::builder("Address")
            .attribute(Attribute::new("id", ValueType::Int).required())
            .attribute(Attribute::new("person_id", ValueType::Int).required())
            .attribute(Attribute::new("zip", ValueType::Text))
            .primary_key(vec!["id"])
            .build()
            .unwrap();
        Model::new(vec![person, address], ModelTag::new(1)).unwrap()
    }

    #[test]
    fn equal_on_text_binds_value() {
        let model = model();
        let person = model.entity("Person").unwrap().clone();
        let dialect = AnsiDialect;
        let mut aliases = AliasBook::new(&dialect, person);
        let mut binds = Vec::new();
        let qualifier = Qualifier::key_value("name", Operator::Equal, Value::Text("Ada".into()));
        let sql = render_qualifier(&qualifier, &mut aliases, &mut binds).unwrap();
        assert_eq!(sql, "(\"T0\".\"name\" = ?)");
        assert_eq!(binds, vec![Value::Text("Ada".into())]);
    }

    #[test]
    fn equal_on_int_inlines_by_default() {
        let model = model();
        let person = model.entity("Person").unwrap().clone();
        let dialect = AnsiDialect;
        let mut aliases = AliasBook::new(&dialect, person);
        let mut binds = Vec::new();
        let qualifier = Qualifier::key_value("id", Operator::Equal, Value::Int(7));
        let sql = render_qualifier(&qualifier, &mut aliases, &mut binds).unwrap();
        assert_eq!(sql, "(\"T0\".\"id\" = 7)");
        assert!(binds.is_empty());
    }

    #[test]
    fn relationship_key_path_joins_through_alias() {
        let model = model();
        let person = model.entity("Person").unwrap().clone();
        let dialect = AnsiDialect;
        let mut aliases = AliasBook::new(&dialect, person);
        let mut binds = Vec::new();
        let qualifier = Qualifier::key_value("addresses.zip", Operator::Equal, Value::Text("10001".into()));
        let sql = render_qualifier(&qualifier, &mut aliases, &mut binds).unwrap();
        assert_eq!(sql, "(\"T1\".\"zip\" = ?)");
        assert_eq!(aliases.joins().len(), 1);
    }

    #[test]
    fn postgres_ilike_uses_ilike_token() {
        let model = model();
        let person = model.entity("Person").unwrap().clone();
        let dialect = PostgresDialect;
        let mut aliases = AliasBook::new(&dialect, person);
        let mut binds = Vec::new();
        let qualifier = Qualifier::key_value("name", Operator::ILike, Value::Text("ada%".into()));
        let sql = render_qualifier(&qualifier, &mut aliases, &mut binds).unwrap();
        assert!(sql.contains("ILIKE"));
    }

    #[test]
    fn contains_escapes_wildcard_characters_in_the_search_term() {
        let model = model();
        let person = model.entity("Person").unwrap().clone();
        let dialect = AnsiDialect;
        let mut aliases = AliasBook::new(&dialect, person);
        let mut binds = Vec::new();
        let qualifier = Qualifier::key_value("name", Operator::Contains, Value::Text("50%_off".into()));
        let sql = render_qualifier(&qualifier, &mut aliases, &mut binds).unwrap();
        assert!(sql.contains("ESCAPE '\\'"));
        assert_eq!(binds, vec![Value::Text("%50\\%\\_off%".into())]);
    }

    #[test]
    fn unresolved_binding_is_an_error() {
        let model = model();
        let person = model.entity("Person").unwrap().clone();
        let dialect = AnsiDialect;
        let mut aliases = AliasBook::new(&dialect, person);
        let mut binds = Vec::new();
        let qualifier = Qualifier::Binding("missing".into());
        assert!(render_qualifier(&qualifier, &mut aliases, &mut binds).is_err());
    }
}
