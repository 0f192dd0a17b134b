//! Typed row filters for table queries.
//!
//! A [`Query`] renders to the query-string dialect of the hosted REST endpoint
//! (`col=eq.value`, `order=col.desc`, `limit=n`) and is also interpreted directly by the
//! in-memory store used in tests.

use std::fmt::Display;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    Eq(&'static str, String),
    In(&'static str, Vec<String>),
    IsNull(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub column: &'static str,
    pub ascending: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    pub columns: Option<&'static str>,
    pub filters: Vec<Filter>,
    pub order: Vec<Order>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts the returned columns (defaults to `*`).
    pub fn select(mut self, columns: &'static str) -> Self {
        self.columns = Some(columns);
        self
    }

    pub fn eq(mut self, column: &'static str, value: impl Display) -> Self {
        self.filters.push(Filter::Eq(column, value.to_string()));
        self
    }

    pub fn is_in<I, V>(mut self, column: &'static str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Display,
    {
        self.filters.push(Filter::In(
            column,
            values.into_iter().map(|v| v.to_string()).collect(),
        ));
        self
    }

    pub fn is_null(mut self, column: &'static str) -> Self {
        self.filters.push(Filter::IsNull(column));
        self
    }

    pub fn order_by(mut self, column: &'static str) -> Self {
        self.order.push(Order {
            column,
            ascending: true,
        });
        self
    }

    pub fn order_by_desc(mut self, column: &'static str) -> Self {
        self.order.push(Order {
            column,
            ascending: false,
        });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// True when an `in` filter has no values, so no row can match.
    pub fn matches_nothing(&self) -> bool {
        self.filters
            .iter()
            .any(|f| matches!(f, Filter::In(_, values) if values.is_empty()))
    }

    /// Filter parameters only, as used by update and delete requests.
    pub fn filter_params(&self) -> Vec<(String, String)> {
        self.filters
            .iter()
            .map(|filter| match filter {
                Filter::Eq(column, value) => (column.to_string(), format!("eq.{value}")),
                Filter::In(column, values) => {
                    let list: Vec<String> = values.iter().map(|v| quote_list_item(v)).collect();
                    (column.to_string(), format!("in.({})", list.join(",")))
                }
                Filter::IsNull(column) => (column.to_string(), "is.null".to_string()),
            })
            .collect()
    }

    /// Full parameter list for a select request.
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = vec![(
            "select".to_string(),
            self.columns.unwrap_or("*").to_string(),
        )];
        params.extend(self.filter_params());

        if !self.order.is_empty() {
            let order: Vec<String> = self
                .order
                .iter()
                .map(|o| format!("{}.{}", o.column, if o.ascending { "asc" } else { "desc" }))
                .collect();
            params.push(("order".to_string(), order.join(",")));
        }

        if let Some(limit) = self.limit {
            params.push(("limit".to_string(), limit.to_string()));
        }

        params
    }
}

/// Values inside `in.(...)` must be double-quoted when they contain list syntax.
fn quote_list_item(value: &str) -> String {
    if value.contains([',', '(', ')', '"', ':', ' ', '\\']) {
        format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
    } else {
        value.to_string()
    }
}
