//! The `SqlManager` facade.
//!
//! One manager wraps one [`DataSource`] and exposes everything the mapping
//! layer offers: entity CRUD with re-select-after-write, raw and file-based
//! SQL operations, the fluent builders, and [`SqlManager::transaction`] for
//! multi-statement units of work.
//!
//! Every operation runs under [`Propagation::Required`] unless its `_with`
//! variant says otherwise, so operations issued inside a transaction
//! callback join the surrounding unit of work automatically.

use std::fmt;

use sqlmapper_core::{
    CommandKind, DataSource, Entity, EntityMetadata, Error, IntoPk, ParameterMap, PkPredicate,
    Result, Row, Value, entity_params, resolve,
};
use sqlmapper_query::dml;
use sqlmapper_session::{Propagation, SessionHandle, TransactionManager};

use crate::delete::DeleteBuilder;
use crate::select::SelectBuilder;
use crate::sql_loader::SqlLoader;
use crate::update::UpdateBuilder;

/// Entity CRUD, raw SQL operations and fluent builders over one datasource.
///
/// Not `Sync`: a manager belongs to a single logical call chain, like the
/// [`TransactionManager`] it owns. Share the [`DataSource`] and give each
/// chain its own manager.
pub struct SqlManager<D: DataSource> {
    tx: TransactionManager<D>,
    loader: Option<Box<dyn SqlLoader>>,
}

impl<D: DataSource> SqlManager<D> {
    /// Create a manager over a datasource, without SQL-file support.
    pub fn new(datasource: D) -> Self {
        Self {
            tx: TransactionManager::new(datasource),
            loader: None,
        }
    }

    /// Attach a [`SqlLoader`] for `_by_sql_file` operations.
    #[must_use]
    pub fn with_loader(mut self, loader: impl SqlLoader + 'static) -> Self {
        self.loader = Some(Box::new(loader));
        self
    }

    /// The transaction manager driving this manager's propagation.
    pub fn transaction_manager(&self) -> &TransactionManager<D> {
        &self.tx
    }

    // ------------------------------------------------------------------
    // Entity operations
    // ------------------------------------------------------------------

    /// Insert an entity and return its stored state, re-selected by primary
    /// key inside the same transaction.
    pub fn insert<E: Entity + 'static>(&self, entity: &E) -> Result<E> {
        self.insert_with(entity, Propagation::Required)
    }

    /// [`SqlManager::insert`] under an explicit propagation policy.
    #[tracing::instrument(level = "debug", skip_all, fields(entity = std::any::type_name::<E>()))]
    pub fn insert_with<E: Entity + 'static>(
        &self,
        entity: &E,
        propagation: Propagation,
    ) -> Result<E> {
        self.tx
            .execute(propagation, |session| self.insert_on(session, entity))
    }

    /// Update an entity by its primary key and return the stored state.
    ///
    /// An affected-row count of zero means the row vanished or a concurrent
    /// writer got there first; it surfaces as [`Error::OptimisticLock`].
    pub fn update<E: Entity + fmt::Debug + 'static>(&self, entity: &E) -> Result<E> {
        self.update_with(entity, Propagation::Required)
    }

    /// [`SqlManager::update`] under an explicit propagation policy.
    #[tracing::instrument(level = "debug", skip_all, fields(entity = std::any::type_name::<E>()))]
    pub fn update_with<E: Entity + fmt::Debug + 'static>(
        &self,
        entity: &E,
        propagation: Propagation,
    ) -> Result<E> {
        self.tx
            .execute(propagation, |session| self.update_on(session, entity))
    }

    /// Delete an entity by its primary key, returning the affected-row count.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoPrimaryKey`] when the entity's key values are all
    /// null/absent.
    pub fn delete<E: Entity + 'static>(&self, entity: &E) -> Result<u64> {
        self.delete_with(entity, Propagation::Required)
    }

    /// [`SqlManager::delete`] under an explicit propagation policy.
    pub fn delete_with<E: Entity + 'static>(
        &self,
        entity: &E,
        propagation: Propagation,
    ) -> Result<u64> {
        let meta = resolve::<E>()?;
        let pk = PkPredicate::from_entity(&meta, entity)?;
        if pk.is_unset() {
            return Err(Error::NoPrimaryKey {
                table: meta.qualified_name(),
            });
        }
        self.delete_predicate(&meta, &pk, propagation)
    }

    /// Delete a row by explicit primary-key values.
    ///
    /// Returns the affected-row count: 0 when no such row exists, which is
    /// not an error.
    pub fn delete_by_pk<E: Entity + 'static>(&self, key: impl IntoPk) -> Result<u64> {
        self.delete_by_pk_with::<E>(key, Propagation::Required)
    }

    /// [`SqlManager::delete_by_pk`] under an explicit propagation policy.
    pub fn delete_by_pk_with<E: Entity + 'static>(
        &self,
        key: impl IntoPk,
        propagation: Propagation,
    ) -> Result<u64> {
        let meta = resolve::<E>()?;
        let pk = PkPredicate::new(&meta, key.into_values())?;
        self.delete_predicate(&meta, &pk, propagation)
    }

    /// Insert the entity when no row with its primary key exists, update it
    /// otherwise. An entity whose key values are all null/absent skips the
    /// existence check and inserts.
    ///
    /// The existence check and the write are two separate statements with no
    /// locking between them; under concurrent writers this can lose an
    /// update or attempt a duplicate insert. Callers needing atomicity
    /// should use their database's native upsert through raw SQL.
    pub fn insert_or_update<E: Entity + fmt::Debug + 'static>(&self, entity: &E) -> Result<E> {
        self.insert_or_update_with(entity, Propagation::Required)
    }

    /// [`SqlManager::insert_or_update`] under an explicit propagation policy.
    #[tracing::instrument(level = "debug", skip_all, fields(entity = std::any::type_name::<E>()))]
    pub fn insert_or_update_with<E: Entity + fmt::Debug + 'static>(
        &self,
        entity: &E,
        propagation: Propagation,
    ) -> Result<E> {
        self.tx.execute(propagation, |session| {
            let meta = resolve::<E>()?;
            let pk = PkPredicate::from_entity(&meta, entity)?;

            if pk.is_unset() {
                tracing::debug!(table = %meta.qualified_name(), "primary key unset, inserting");
                return self.insert_on(session, entity);
            }

            let probe = dml::build_count_by_pk(&meta, &pk);
            let rows = session.fetch(&probe)?;
            let count = rows
                .first()
                .and_then(|row| row.get(0))
                .and_then(Value::as_i64)
                .ok_or_else(|| {
                    Error::execution(
                        CommandKind::Select,
                        "COUNT(*) probe returned no countable value",
                    )
                })?;

            if count > 0 {
                tracing::debug!(table = %meta.qualified_name(), "row exists, updating");
                self.update_on(session, entity)
            } else {
                tracing::debug!(table = %meta.qualified_name(), "no row, inserting");
                self.insert_on(session, entity)
            }
        })
    }

    /// Start a select pre-filtered to one primary key.
    ///
    /// Terminal calls behave like any other select:
    /// `find_by_pk::<User>(1).get_single_result()` raises
    /// [`Error::NotFound`] for a missing row unless
    /// [`SelectBuilder::suppress_not_found`] was chained in.
    pub fn find_by_pk<E: Entity + 'static>(&self, key: impl IntoPk) -> SelectBuilder<'_, D, E> {
        self.select().by_primary_key(key)
    }

    /// Fetch every row of an entity's table.
    pub fn find_all<E: Entity + 'static>(&self) -> Result<Vec<E>> {
        self.select::<E>().get_result_list()
    }

    // ------------------------------------------------------------------
    // Fluent builders
    // ------------------------------------------------------------------

    /// Start a fluent select for an entity type.
    pub fn select<E: Entity + 'static>(&self) -> SelectBuilder<'_, D, E> {
        SelectBuilder::new(self)
    }

    /// Start a criteria-driven UPDATE for an entity type.
    pub fn update_query<E: Entity + 'static>(&self) -> UpdateBuilder<'_, D, E> {
        UpdateBuilder::new(self)
    }

    /// Start a criteria-driven DELETE for an entity type.
    pub fn delete_query<E: Entity + 'static>(&self) -> DeleteBuilder<'_, D, E> {
        DeleteBuilder::new(self)
    }

    // ------------------------------------------------------------------
    // Raw SQL operations
    // ------------------------------------------------------------------

    /// Start a select over explicit SQL text.
    pub fn select_by_sql<E: Entity + 'static>(
        &self,
        sql: impl Into<String>,
        params: ParameterMap,
    ) -> SelectBuilder<'_, D, E> {
        self.select().with_sql(sql).with_params(params)
    }

    /// Start a select over a SQL file reference.
    pub fn select_by_sql_file<E: Entity + 'static>(
        &self,
        path: impl Into<String>,
        params: ParameterMap,
    ) -> SelectBuilder<'_, D, E> {
        self.select().with_sql_file(path).with_params(params)
    }

    /// Execute explicit DML text, returning the affected-row count.
    pub fn execute_sql(&self, sql: &str, params: &ParameterMap, kind: CommandKind) -> Result<u64> {
        self.tx.execute(Propagation::Required, |session| {
            session.execute(sql, params, kind)
        })
    }

    /// Execute DML loaded from a SQL file reference.
    pub fn execute_sql_file(
        &self,
        path: &str,
        params: &ParameterMap,
        kind: CommandKind,
    ) -> Result<u64> {
        let sql = self.load_sql(path, kind)?;
        self.execute_sql(&sql, params, kind)
    }

    // ------------------------------------------------------------------
    // Transactions
    // ------------------------------------------------------------------

    /// Run a multi-statement unit of work under the given propagation.
    ///
    /// The callback receives this manager; every operation issued through it
    /// joins the unit's session. On success the owning scope commits; on any
    /// error it rolls back and the error propagates per the manager's
    /// wrapping policy.
    #[tracing::instrument(level = "debug", skip(self, callback), fields(propagation = %propagation))]
    pub fn transaction<T>(
        &self,
        propagation: Propagation,
        callback: impl FnOnce(&Self) -> Result<T>,
    ) -> Result<T> {
        self.tx.execute(propagation, |_session| callback(self))
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    pub(crate) fn load_sql(&self, path: &str, kind: CommandKind) -> Result<String> {
        match &self.loader {
            Some(loader) => loader.load(path),
            None => Err(Error::execution(
                kind,
                format!("no SQL loader configured (requested file {path})"),
            )),
        }
    }

    fn insert_on<E: Entity + 'static>(
        &self,
        session: &SessionHandle<D::Conn>,
        entity: &E,
    ) -> Result<E> {
        let meta = resolve::<E>()?;
        let statement = dml::build_insert(&meta, entity_params(entity))?;
        session.run(&statement)?;

        let pk = PkPredicate::from_entity(&meta, entity)?;
        if pk.is_unset() {
            // No key to re-select by; hand back the written state.
            let pairs = entity
                .to_row()
                .into_iter()
                .map(|(column, value)| (column.to_string(), value))
                .collect();
            return E::from_row(&Row::from_pairs(pairs));
        }
        Self::reselect(session, &meta, &pk)
    }

    fn update_on<E: Entity + fmt::Debug + 'static>(
        &self,
        session: &SessionHandle<D::Conn>,
        entity: &E,
    ) -> Result<E> {
        let meta = resolve::<E>()?;
        let pk = PkPredicate::from_entity(&meta, entity)?;
        let statement = dml::build_update(&meta, entity_params(entity))?;

        let affected = session.run(&statement)?;
        if affected == 0 {
            return Err(Error::OptimisticLock {
                table: meta.qualified_name(),
                entity: format!("{entity:?}"),
                columns: pk.columns(),
            });
        }
        Self::reselect(session, &meta, &pk)
    }

    fn delete_predicate(
        &self,
        meta: &EntityMetadata,
        pk: &PkPredicate,
        propagation: Propagation,
    ) -> Result<u64> {
        let statement = dml::build_delete(meta, pk);
        self.tx
            .execute(propagation, |session| session.run(&statement))
    }

    fn reselect<E: Entity + 'static>(
        session: &SessionHandle<D::Conn>,
        meta: &EntityMetadata,
        pk: &PkPredicate,
    ) -> Result<E> {
        let statement = dml::build_select_by_pk(meta, pk);
        let rows = session.fetch(&statement)?;
        match rows.as_slice() {
            [] => Err(Error::NotFound {
                table: meta.qualified_name(),
            }),
            [row] => E::from_row(row),
            _ => Err(Error::AmbiguousResult {
                table: meta.qualified_name(),
                found: rows.len(),
            }),
        }
    }
}
