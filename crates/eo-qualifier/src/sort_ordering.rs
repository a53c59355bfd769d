/// How a single sort key is compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortSelector {
    Asc,
    Desc,
    CaseInsensitiveAsc,
    CaseInsensitiveDesc,
}

impl SortSelector {
    pub fn is_descending(&self) -> bool {
        matches!(self, SortSelector::Desc | SortSelector::CaseInsensitiveDesc)
    }

    pub fn is_case_insensitive(&self) -> bool {
        matches!(
            self,
            SortSelector::CaseInsensitiveAsc | SortSelector::CaseInsensitiveDesc
        )
    }
}

/// One `ORDER BY` term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortOrdering {
    key: String,
    selector: SortSelector,
}

impl SortOrdering {
    pub fn new(key: impl Into<String>, selector: SortSelector) -> Self {
        SortOrdering {
            key: key.into(),
            selector,
        }
    }

    pub fn asc(key: impl Into<String>) -> Self {
        SortOrdering::new(key, SortSelector::Asc)
    }

    pub fn desc(key: impl Into<String>) -> Self {
        SortOrdering::new(key, SortSelector::Desc)
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn selector(&self) -> SortSelector {
        self.selector
    }
}
