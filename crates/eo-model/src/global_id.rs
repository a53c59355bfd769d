use std::fmt;
use std::hash::{Hash, Hasher};

use eo_value::Value;

/// Entity-qualified primary-key identity, used to unique objects across
/// fetches within a `TrackingContext` scope (defined in `eo-object`).
///
/// Two scalar-keyed variants exist for the common single-integer and
/// single-text primary key cases, matching the source design's
/// `SingleIntKeyGlobalID`-style shortcuts, plus a general keyed variant for
/// composite primary keys. Equality and hashing are always by
/// `(entity_name, keys)`, regardless of which variant produced the value.
#[derive(Debug, Clone)]
pub enum GlobalId {
    SingleInt {
        entity_name: String,
        key_name: String,
        key: i64,
    },
    SingleText {
        entity_name: String,
        key_name: String,
        key: String,
    },
    Keyed {
        entity_name: String,
        keys: Vec<(String, Value)>,
    },
}

impl GlobalId {
    pub fn entity_name(&self) -> &str {
        match self {
            GlobalId::SingleInt { entity_name, .. } => entity_name,
            GlobalId::SingleText { entity_name, .. } => entity_name,
            GlobalId::Keyed { entity_name, .. } => entity_name,
        }
    }

    /// Builds the most specific variant the key list permits: a single
    /// integer or text key collapses to a scalar variant, anything else
    /// (zero columns, multiple columns, or an exotic value type) uses the
    /// general keyed form.
    pub fn from_keys(entity_name: impl Into<String>, mut keys: Vec<(String, Value)>) -> Self {
        let entity_name = entity_name.into();
        if keys.len() == 1 {
            let (key_name, value) = keys.pop().expect("len checked");
            return match value {
                Value::Int(key) => GlobalId::SingleInt {
                    entity_name,
                    key_name,
                    key,
                },
                Value::Text(key) => GlobalId::SingleText {
                    entity_name,
                    key_name,
                    key,
                },
                other => GlobalId::Keyed {
                    entity_name,
                    keys: vec![(key_name, other)],
                },
            };
        }
        GlobalId::Keyed { entity_name, keys }
    }

    /// Normalized `(name, value)` pairs regardless of variant.
    pub fn keys(&self) -> Vec<(String, Value)> {
        match self {
            GlobalId::SingleInt { key_name, key, .. } => {
                vec![(key_name.clone(), Value::Int(*key))]
            }
            GlobalId::SingleText { key_name, key, .. } => {
                vec![(key_name.clone(), Value::Text(key.clone()))]
            }
            GlobalId::Keyed { keys, .. } => keys.clone(),
        }
    }
}

impl PartialEq for GlobalId {
    fn eq(&self, other: &Self) -> bool {
        self.entity_name() == other.entity_name() && self.keys() == other.keys()
    }
}

impl Eq for GlobalId {}

impl Hash for GlobalId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.entity_name().hash(state);
        for (name, value) in self.keys() {
            name.hash(state);
            match value {
                Value::Int(v) => v.hash(state),
                Value::Text(v) => v.hash(state),
                Value::Bool(v) => v.hash(state),
                Value::Bytes(v) => v.hash(state),
                Value::Float(v) => v.to_bits().hash(state),
            }
        }
    }
}

impl fmt::Display for GlobalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[", self.entity_name())?;
        for (i, (name, value)) in self.keys().iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{name}={value}")?;
        }
        write!(f, "]")
    }
}
