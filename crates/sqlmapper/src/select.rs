//! Fluent SELECT builder.

use std::marker::PhantomData;

use sqlmapper_core::{
    CommandKind, DataSource, Entity, Error, IntoPk, ParameterMap, PkPredicate, Result, Value,
    resolve,
};
use sqlmapper_query::{Statement, Where, dml};
use sqlmapper_session::Propagation;

use crate::manager::SqlManager;

/// A chainable select that resolves its source in priority order:
/// explicit SQL, then SQL file, then primary-key predicate, then criteria,
/// then an unconditional select of the whole table.
///
/// Builders are single-use: configuration calls consume and return the
/// builder, terminal calls consume it for good.
///
/// # Example
///
/// ```ignore
/// let adults: Vec<User> = manager
///     .select::<User>()
///     .filter(Expr::col("age").ge(18))
///     .get_result_list()?;
///
/// let missing = manager
///     .find_by_pk::<User>(999)
///     .suppress_not_found()
///     .get_single_result()?; // Ok(None) instead of Error::NotFound
/// ```
pub struct SelectBuilder<'m, D: DataSource, E: Entity + 'static> {
    manager: &'m SqlManager<D>,
    sql: Option<String>,
    sql_file: Option<String>,
    params: ParameterMap,
    pk_values: Option<Vec<Value>>,
    criteria: Where,
    suppress_not_found: bool,
    _entity: PhantomData<fn() -> E>,
}

impl<'m, D: DataSource, E: Entity + 'static> SelectBuilder<'m, D, E> {
    pub(crate) fn new(manager: &'m SqlManager<D>) -> Self {
        Self {
            manager,
            sql: None,
            sql_file: None,
            params: ParameterMap::new(),
            pk_values: None,
            criteria: Where::new(),
            suppress_not_found: false,
            _entity: PhantomData,
        }
    }

    /// Use explicit SQL text instead of generated SQL.
    #[must_use]
    pub fn with_sql(mut self, sql: impl Into<String>) -> Self {
        self.sql = Some(sql.into());
        self
    }

    /// Use SQL loaded from a file reference instead of generated SQL.
    #[must_use]
    pub fn with_sql_file(mut self, path: impl Into<String>) -> Self {
        self.sql_file = Some(path.into());
        self
    }

    /// Add named parameters for explicit or file-based SQL.
    #[must_use]
    pub fn with_params(mut self, params: ParameterMap) -> Self {
        self.params.extend(params);
        self
    }

    /// Restrict to one row by primary-key values.
    #[must_use]
    pub fn by_primary_key(mut self, key: impl IntoPk) -> Self {
        self.pk_values = Some(key.into_values());
        self
    }

    /// AND criteria onto the select. Accepts an [`sqlmapper_query::Expr`] or
    /// a whole [`Where`].
    #[must_use]
    pub fn filter(mut self, criteria: impl Into<Where>) -> Self {
        self.criteria = self.criteria.merge(criteria.into());
        self
    }

    /// Make [`SelectBuilder::get_single_result`] return `Ok(None)` for zero
    /// rows instead of [`Error::NotFound`].
    ///
    /// More than one row still raises [`Error::AmbiguousResult`]; that
    /// signals a predicate defect, not missing data.
    #[must_use]
    pub fn suppress_not_found(mut self) -> Self {
        self.suppress_not_found = true;
        self
    }

    /// Fetch every matching row.
    pub fn get_result_list(self) -> Result<Vec<E>> {
        let statement = self.build()?;
        let rows = self
            .manager
            .transaction_manager()
            .execute(Propagation::Required, |session| session.fetch(&statement))?;
        rows.iter().map(E::from_row).collect()
    }

    /// Fetch exactly one row.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] on zero rows (unless suppressed), and
    /// [`Error::AmbiguousResult`] on more than one, always.
    pub fn get_single_result(self) -> Result<Option<E>> {
        let meta = resolve::<E>()?;
        let suppress = self.suppress_not_found;
        let statement = self.build()?;
        let rows = self
            .manager
            .transaction_manager()
            .execute(Propagation::Required, |session| session.fetch(&statement))?;

        match rows.as_slice() {
            [] if suppress => Ok(None),
            [] => Err(Error::NotFound {
                table: meta.qualified_name(),
            }),
            [row] => Ok(Some(E::from_row(row)?)),
            _ => Err(Error::AmbiguousResult {
                table: meta.qualified_name(),
                found: rows.len(),
            }),
        }
    }

    fn build(&self) -> Result<Statement> {
        let meta = resolve::<E>()?;

        if let Some(sql) = &self.sql {
            return Ok(Statement::new(
                sql.clone(),
                self.params.clone(),
                CommandKind::Select,
            ));
        }
        if let Some(path) = &self.sql_file {
            let sql = self.manager.load_sql(path, CommandKind::Select)?;
            return Ok(Statement::new(sql, self.params.clone(), CommandKind::Select));
        }
        if let Some(values) = &self.pk_values {
            let pk = PkPredicate::new(&meta, values.clone())?;
            return Ok(dml::build_select_by_pk(&meta, &pk));
        }
        if !self.criteria.is_empty() {
            return Ok(dml::build_select_where(&meta, &self.criteria));
        }
        Ok(dml::build_select_all(&meta))
    }
}
