//! Structured WHERE criteria.
//!
//! Conditions are composed as an [`Expr`] tree and rendered by [`Where`]
//! into SQL with `w{i}` placeholders. Simple conjunctions chain through
//! [`Where::and`]; nested AND/OR trees build through [`Expr::and`] /
//! [`Expr::or`].
//!
//! # Example
//!
//! ```
//! use sqlmapper_query::criteria::{Expr, Where};
//!
//! let criteria = Where::new()
//!     .and(Expr::col("age").ge(18))
//!     .and(Expr::col("name").like("A%").or(Expr::col("name").is_null()));
//! let (sql, params) = criteria.render(0);
//! assert_eq!(sql, "age >= :w0 AND (name LIKE :w1 OR name IS NULL)");
//! assert_eq!(params.len(), 2);
//! ```

use sqlmapper_core::{ParameterMap, Value};

/// A WHERE-clause expression tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// `column = value`
    Eq(String, Value),
    /// `column <> value`
    Ne(String, Value),
    /// `column > value`
    Gt(String, Value),
    /// `column >= value`
    Ge(String, Value),
    /// `column < value`
    Lt(String, Value),
    /// `column <= value`
    Le(String, Value),
    /// `column LIKE pattern`
    Like(String, Value),
    /// `column IS NULL`
    IsNull(String),
    /// `column IS NOT NULL`
    IsNotNull(String),
    /// `column IN (v1, v2, …)`
    In(String, Vec<Value>),
    /// Conjunction of sub-expressions.
    And(Vec<Expr>),
    /// Disjunction of sub-expressions.
    Or(Vec<Expr>),
}

impl Expr {
    /// Start an expression from a column reference.
    pub fn col(name: impl Into<String>) -> ColumnRef {
        ColumnRef { name: name.into() }
    }

    /// Combine with another expression under AND, flattening nested ANDs.
    #[must_use]
    pub fn and(self, other: Expr) -> Expr {
        match self {
            Expr::And(mut children) => {
                children.push(other);
                Expr::And(children)
            }
            first => Expr::And(vec![first, other]),
        }
    }

    /// Combine with another expression under OR, flattening nested ORs.
    #[must_use]
    pub fn or(self, other: Expr) -> Expr {
        match self {
            Expr::Or(mut children) => {
                children.push(other);
                Expr::Or(children)
            }
            first => Expr::Or(vec![first, other]),
        }
    }

    fn render_into(&self, sql: &mut String, params: &mut ParameterMap, counter: &mut usize) {
        match self {
            Expr::Eq(c, v) => Self::binary(sql, params, counter, c, "=", v),
            Expr::Ne(c, v) => Self::binary(sql, params, counter, c, "<>", v),
            Expr::Gt(c, v) => Self::binary(sql, params, counter, c, ">", v),
            Expr::Ge(c, v) => Self::binary(sql, params, counter, c, ">=", v),
            Expr::Lt(c, v) => Self::binary(sql, params, counter, c, "<", v),
            Expr::Le(c, v) => Self::binary(sql, params, counter, c, "<=", v),
            Expr::Like(c, v) => Self::binary(sql, params, counter, c, "LIKE", v),
            Expr::IsNull(c) => sql.push_str(&format!("{c} IS NULL")),
            Expr::IsNotNull(c) => sql.push_str(&format!("{c} IS NOT NULL")),
            Expr::In(c, values) => {
                let mut names = Vec::with_capacity(values.len());
                for value in values {
                    let name = format!("w{counter}");
                    *counter += 1;
                    params.insert(name.clone(), value.clone());
                    names.push(format!(":{name}"));
                }
                sql.push_str(&format!("{c} IN ({})", names.join(", ")));
            }
            Expr::And(children) => Self::list(sql, params, counter, children, " AND "),
            Expr::Or(children) => Self::list(sql, params, counter, children, " OR "),
        }
    }

    fn binary(
        sql: &mut String,
        params: &mut ParameterMap,
        counter: &mut usize,
        column: &str,
        op: &str,
        value: &Value,
    ) {
        let name = format!("w{counter}");
        *counter += 1;
        sql.push_str(&format!("{column} {op} :{name}"));
        params.insert(name, value.clone());
    }

    fn list(
        sql: &mut String,
        params: &mut ParameterMap,
        counter: &mut usize,
        children: &[Expr],
        separator: &str,
    ) {
        for (i, child) in children.iter().enumerate() {
            if i > 0 {
                sql.push_str(separator);
            }
            let composite = matches!(child, Expr::And(_) | Expr::Or(_));
            if composite {
                sql.push('(');
            }
            child.render_into(sql, params, counter);
            if composite {
                sql.push(')');
            }
        }
    }
}

/// A column reference mid-construction; comparison methods finish it into an
/// [`Expr`].
#[derive(Debug, Clone)]
pub struct ColumnRef {
    name: String,
}

impl ColumnRef {
    /// `column = value`
    pub fn eq(self, value: impl Into<Value>) -> Expr {
        Expr::Eq(self.name, value.into())
    }

    /// `column <> value`
    pub fn ne(self, value: impl Into<Value>) -> Expr {
        Expr::Ne(self.name, value.into())
    }

    /// `column > value`
    pub fn gt(self, value: impl Into<Value>) -> Expr {
        Expr::Gt(self.name, value.into())
    }

    /// `column >= value`
    pub fn ge(self, value: impl Into<Value>) -> Expr {
        Expr::Ge(self.name, value.into())
    }

    /// `column < value`
    pub fn lt(self, value: impl Into<Value>) -> Expr {
        Expr::Lt(self.name, value.into())
    }

    /// `column <= value`
    pub fn le(self, value: impl Into<Value>) -> Expr {
        Expr::Le(self.name, value.into())
    }

    /// `column LIKE pattern`
    pub fn like(self, pattern: impl Into<String>) -> Expr {
        Expr::Like(self.name, Value::Text(pattern.into()))
    }

    /// `column IS NULL`
    #[must_use]
    pub fn is_null(self) -> Expr {
        Expr::IsNull(self.name)
    }

    /// `column IS NOT NULL`
    #[must_use]
    pub fn is_not_null(self) -> Expr {
        Expr::IsNotNull(self.name)
    }

    /// `column IN (v1, v2, …)`
    pub fn is_in<V: Into<Value>>(self, values: impl IntoIterator<Item = V>) -> Expr {
        Expr::In(self.name, values.into_iter().map(Into::into).collect())
    }
}

/// An accumulating conjunction of expressions with a renderer.
///
/// `Where::new().and(a).and(b)` renders as `a AND b`; OR branches come in as
/// [`Expr::or`] subtrees.
#[derive(Debug, Clone, Default)]
pub struct Where {
    root: Option<Expr>,
}

impl Where {
    /// Create an empty criteria set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create criteria from a single expression.
    #[must_use]
    pub fn with(expr: Expr) -> Self {
        Self { root: Some(expr) }
    }

    /// AND another expression onto the criteria.
    #[must_use]
    pub fn and(mut self, expr: Expr) -> Self {
        self.root = Some(match self.root {
            Some(existing) => existing.and(expr),
            None => expr,
        });
        self
    }

    /// Shorthand for `.and(Expr::col(column).eq(value))`.
    #[must_use]
    pub fn eq(self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.and(Expr::col(column).eq(value))
    }

    /// Merge another criteria set onto this one under AND.
    #[must_use]
    pub fn merge(mut self, other: Where) -> Self {
        if let Some(expr) = other.root {
            self = self.and(expr);
        }
        self
    }

    /// Whether no condition has been added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Render to SQL text plus parameters.
    ///
    /// `start` offsets the `w{i}` numbering so multiple criteria sets can
    /// share one statement without placeholder collisions. An empty criteria
    /// set renders as an empty string.
    #[must_use]
    pub fn render(&self, start: usize) -> (String, ParameterMap) {
        let mut sql = String::new();
        let mut params = ParameterMap::new();
        let mut counter = start;
        if let Some(root) = &self.root {
            root.render_into(&mut sql, &mut params, &mut counter);
        }
        (sql, params)
    }
}

impl From<Expr> for Where {
    fn from(expr: Expr) -> Self {
        Where::with(expr)
    }
}
