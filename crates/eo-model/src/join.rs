/// One leg of a foreign-key relationship: a source attribute name (on the
/// relationship's source entity) paired with a destination attribute name
/// (on the relationship's destination entity).
///
/// Joins are stored and compared by attribute *name* rather than by a true
/// back-reference to avoid an ownership cycle through `Entity`; `Model::
/// connect_relationships` is what validates that both names resolve to real
/// attributes on their respective entities (see `Entity::attribute`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Join {
    source_attribute: String,
    destination_attribute: String,
}

impl Join {
    pub fn new(source_attribute: impl Into<String>, destination_attribute: impl Into<String>) -> Self {
        Join {
            source_attribute: source_attribute.into(),
            destination_attribute: destination_attribute.into(),
        }
    }

    pub fn source_attribute(&self) -> &str {
        &self.source_attribute
    }

    pub fn destination_attribute(&self) -> &str {
        &self.destination_attribute
    }

    /// The inverse join: source and destination swapped.
    pub fn inverse(&self) -> Join {
        Join {
            source_attribute: self.destination_attribute.clone(),
            destination_attribute: self.source_attribute.clone(),
        }
    }

    /// Two joins are reciprocal iff their attribute pairs swap exactly, i.e.
    /// `self == other.inverse()`.
    pub fn is_reciprocal_to(&self, other: &Join) -> bool {
        *self == other.inverse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inverse_swaps_attributes() {
        let join = Join::new("person_id", "id");
        let inverse = join.inverse();
        assert_eq!(inverse.source_attribute(), "id");
        assert_eq!(inverse.destination_attribute(), "person_id");
    }

    #[test]
    fn reciprocal_detection() {
        let a = Join::new("person_id", "id");
        let b = Join::new("id", "person_id");
        assert!(a.is_reciprocal_to(&b));
        assert!(b.is_reciprocal_to(&a));

        let c = Join::new("person_id", "other_id");
        assert!(!a.is_reciprocal_to(&c));
    }
}
