//! Fluent criteria-driven DELETE builder.

use std::marker::PhantomData;

use sqlmapper_core::{DataSource, Entity, Result, resolve};
use sqlmapper_query::{Where, dml};
use sqlmapper_session::Propagation;

use crate::manager::SqlManager;

/// A chainable DELETE over an entity's table.
///
/// Criteria AND together. An empty criteria set deletes every row, so chain
/// a [`DeleteBuilder::filter`] unless that is what you mean.
pub struct DeleteBuilder<'m, D: DataSource, E: Entity + 'static> {
    manager: &'m SqlManager<D>,
    criteria: Where,
    _entity: PhantomData<fn() -> E>,
}

impl<'m, D: DataSource, E: Entity + 'static> DeleteBuilder<'m, D, E> {
    pub(crate) fn new(manager: &'m SqlManager<D>) -> Self {
        Self {
            manager,
            criteria: Where::new(),
            _entity: PhantomData,
        }
    }

    /// AND criteria onto the delete.
    #[must_use]
    pub fn filter(mut self, criteria: impl Into<Where>) -> Self {
        self.criteria = self.criteria.merge(criteria.into());
        self
    }

    /// Execute the delete, returning the affected-row count.
    pub fn execute(self) -> Result<u64> {
        let meta = resolve::<E>()?;
        let statement = dml::build_delete_where(&meta, &self.criteria);
        self.manager
            .transaction_manager()
            .execute(Propagation::Required, |session| session.run(&statement))
    }
}
