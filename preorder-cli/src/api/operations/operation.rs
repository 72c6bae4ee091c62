//! Core Operation types for PostgREST table requests

use serde_json::Value;

use crate::api::query::Filter;

/// Represents a single request that can be executed against a PostgREST table
#[derive(Debug, Clone)]
pub enum Operation {
    /// Read selected columns of the rows matching a filter
    Select {
        /// Table name (e.g., "Products")
        table: String,
        /// Columns to return
        columns: Vec<String>,
        /// Row filter
        filter: Filter,
    },
    /// Update the rows matching a filter
    Update {
        /// Table name
        table: String,
        /// Row filter; never empty, PostgREST would otherwise touch every row
        filter: Filter,
        /// Updated field data as JSON
        data: Value,
    },
}

impl Operation {
    /// Create a new Select operation
    pub fn select<I, S>(table: impl Into<String>, columns: I, filter: Filter) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Select {
            table: table.into(),
            columns: columns.into_iter().map(Into::into).collect(),
            filter,
        }
    }

    /// Create a new Update operation
    pub fn update(table: impl Into<String>, filter: Filter, data: Value) -> Self {
        Self::Update {
            table: table.into(),
            filter,
            data,
        }
    }

    /// Get the table name for this operation
    pub fn table(&self) -> &str {
        match self {
            Self::Select { table, .. } => table,
            Self::Update { table, .. } => table,
        }
    }

    /// Get the HTTP method for this operation
    pub fn http_method(&self) -> reqwest::Method {
        match self {
            Self::Select { .. } => reqwest::Method::GET,
            Self::Update { .. } => reqwest::Method::PATCH,
        }
    }

    /// Get the operation type as a string
    pub fn operation_type(&self) -> &'static str {
        match self {
            Self::Select { .. } => "select",
            Self::Update { .. } => "update",
        }
    }

    /// Short label used in logs and error messages, e.g. "update Products"
    pub fn describe(&self) -> String {
        format!("{} {}", self.operation_type(), self.table())
    }

    /// Query string pairs: `select=` for reads plus the row filter
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        match self {
            Self::Select {
                columns, filter, ..
            } => vec![
                ("select".to_string(), columns.join(",")),
                filter.to_query_pair(),
            ],
            Self::Update { filter, .. } => vec![filter.to_query_pair()],
        }
    }

    /// JSON body, if the operation sends one
    pub fn body(&self) -> Option<&Value> {
        match self {
            Self::Select { .. } => None,
            Self::Update { data, .. } => Some(data),
        }
    }

    /// `Prefer` header value
    pub fn prefer(&self) -> Option<&'static str> {
        match self {
            Self::Select { .. } => None,
            Self::Update { .. } => Some("return=minimal"),
        }
    }
}
