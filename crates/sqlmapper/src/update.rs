//! Fluent criteria-driven UPDATE builder.

use std::marker::PhantomData;

use sqlmapper_core::{DataSource, Entity, ParameterMap, Result, Value, resolve};
use sqlmapper_query::{Where, dml};
use sqlmapper_session::Propagation;

use crate::manager::SqlManager;

/// A chainable UPDATE over an entity's table.
///
/// SET values accumulate in call order; criteria AND together. An empty
/// criteria set updates every row, so chain a [`UpdateBuilder::filter`]
/// unless that is what you mean.
///
/// # Example
///
/// ```ignore
/// let touched = manager
///     .update_query::<User>()
///     .set("status", "inactive")
///     .filter(Expr::col("last_login").is_null())
///     .execute()?;
/// ```
pub struct UpdateBuilder<'m, D: DataSource, E: Entity + 'static> {
    manager: &'m SqlManager<D>,
    sets: ParameterMap,
    criteria: Where,
    _entity: PhantomData<fn() -> E>,
}

impl<'m, D: DataSource, E: Entity + 'static> UpdateBuilder<'m, D, E> {
    pub(crate) fn new(manager: &'m SqlManager<D>) -> Self {
        Self {
            manager,
            sets: ParameterMap::new(),
            criteria: Where::new(),
            _entity: PhantomData,
        }
    }

    /// Set a column to a value.
    #[must_use]
    pub fn set(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.sets.insert(column, value);
        self
    }

    /// AND criteria onto the update.
    #[must_use]
    pub fn filter(mut self, criteria: impl Into<Where>) -> Self {
        self.criteria = self.criteria.merge(criteria.into());
        self
    }

    /// Execute the update, returning the affected-row count.
    ///
    /// # Errors
    ///
    /// [`sqlmapper_core::Error::Metadata`] when no SET column was given.
    pub fn execute(self) -> Result<u64> {
        let meta = resolve::<E>()?;
        let statement = dml::build_update_where(&meta, self.sets, &self.criteria)?;
        self.manager
            .transaction_manager()
            .execute(Propagation::Required, |session| session.run(&statement))
    }
}
