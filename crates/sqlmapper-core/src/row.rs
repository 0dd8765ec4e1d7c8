//! Result rows returned by the execution boundary.

use crate::error::{Error, Result};
use crate::value::{FromValue, Value};

/// A single result row: column names paired with values, in select order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    columns: Vec<String>,
    values: Vec<Value>,
}

impl Row {
    /// Create an empty row.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a row from `(column, value)` pairs, preserving their order.
    #[must_use]
    pub fn from_pairs(pairs: Vec<(String, Value)>) -> Self {
        let mut row = Self::new();
        for (column, value) in pairs {
            row.push(column, value);
        }
        row
    }

    /// Append a column.
    pub fn push(&mut self, column: impl Into<String>, value: Value) {
        self.columns.push(column.into());
        self.values.push(value);
    }

    /// Number of columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Whether the row has no columns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Column names in select order.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Value at a positional index.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Value for a named column.
    pub fn get_named(&self, column: &str) -> Result<&Value> {
        self.columns
            .iter()
            .position(|c| c == column)
            .map(|i| &self.values[i])
            .ok_or_else(|| Error::Metadata {
                message: format!("column {column} not present in result row"),
            })
    }

    /// Typed value for a named column.
    ///
    /// This is the accessor generated `from_row` implementations use.
    pub fn try_get<T: FromValue>(&self, column: &str) -> Result<T> {
        T::from_value(self.get_named(column)?)
    }

    /// Iterate column/value pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns
            .iter()
            .map(String::as_str)
            .zip(self.values.iter())
    }
}
