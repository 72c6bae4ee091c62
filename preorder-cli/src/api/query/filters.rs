//! Row filters for PostgREST requests

use crate::api::models::Identifier;

/// Characters that force a value to be double-quoted inside a filter
const RESERVED: &[char] = &[',', '.', '(', ')', '"', ':', ' ', '\\'];

/// A single literal inside a filter expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterValue {
    Int(i64),
    Text(String),
}

impl FilterValue {
    /// Render the literal, quoting text that would otherwise break the expression
    pub fn render(&self) -> String {
        match self {
            Self::Int(n) => n.to_string(),
            Self::Text(s) if s.is_empty() || s.contains(RESERVED) => {
                format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
            }
            Self::Text(s) => s.clone(),
        }
    }
}

impl From<&Identifier> for FilterValue {
    fn from(id: &Identifier) -> Self {
        match id {
            Identifier::Int(n) => Self::Int(*n),
            Identifier::Text(s) => Self::Text(s.clone()),
        }
    }
}

/// Horizontal filter on one column
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    /// `column=eq.value`
    Eq { column: String, value: FilterValue },
    /// `column=in.(v1,v2,...)`
    In {
        column: String,
        values: Vec<FilterValue>,
    },
}

impl Filter {
    pub fn eq(column: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::Eq {
            column: column.into(),
            value: value.into(),
        }
    }

    pub fn is_in<I, V>(column: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<FilterValue>,
    {
        Self::In {
            column: column.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Scope a write or read to a set of identifiers, collapsing a single key to `eq`
    pub fn for_identifiers(column: impl Into<String>, ids: &[Identifier]) -> Self {
        match ids {
            [single] => Self::eq(column, single),
            _ => Self::is_in(column, ids.iter()),
        }
    }

    /// Render as a `(key, value)` query pair; the HTTP layer handles URL encoding
    pub fn to_query_pair(&self) -> (String, String) {
        match self {
            Self::Eq { column, value } => (column.clone(), format!("eq.{}", value.render())),
            Self::In { column, values } => {
                let rendered: Vec<String> = values.iter().map(FilterValue::render).collect();
                (column.clone(), format!("in.({})", rendered.join(",")))
            }
        }
    }
}
