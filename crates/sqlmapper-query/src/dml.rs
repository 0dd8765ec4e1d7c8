//! Statement generators.
//!
//! Each generator derives a fully parameterized statement from resolved
//! entity metadata. Column placeholders reuse the column name; primary-key
//! predicates use the synthetic `pk0, pk1, …` names so an UPDATE can carry a
//! column's new value and the row's key in the same parameter map without
//! collision. `pk{i}` indices follow the metadata's declared key order.

use sqlmapper_core::{
    CommandKind, EntityMetadata, Error, ParameterMap, PkPredicate, Result,
};

use crate::criteria::Where;
use crate::statement::Statement;

/// Render `k0 = :pk0 AND k1 = :pk1 …` plus the matching parameters.
fn pk_where(pk: &PkPredicate) -> (String, ParameterMap) {
    let mut clauses = Vec::with_capacity(pk.pairs().len());
    let mut params = ParameterMap::new();
    for (i, (column, value)) in pk.pairs().iter().enumerate() {
        clauses.push(format!("{column} = :pk{i}"));
        params.insert(format!("pk{i}"), value.clone());
    }
    (clauses.join(" AND "), params)
}

/// Build an INSERT from an entity's column values.
///
/// Columns appear in the parameter map's insertion order; every value is
/// bound through a placeholder named after its column.
///
/// # Errors
///
/// Returns [`Error::Metadata`] when the entity produced no column values.
pub fn build_insert(meta: &EntityMetadata, entity_params: ParameterMap) -> Result<Statement> {
    if entity_params.is_empty() {
        return Err(Error::Metadata {
            message: format!(
                "entity for table {} produced no column values",
                meta.qualified_name()
            ),
        });
    }

    let columns: Vec<&str> = entity_params.iter().map(|(n, _)| n).collect();
    let placeholders: Vec<String> = columns.iter().map(|c| format!(":{c}")).collect();
    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        meta.qualified_name(),
        columns.join(", "),
        placeholders.join(", ")
    );

    tracing::debug!(table = %meta.qualified_name(), columns = columns.len(), "built insert");
    Ok(Statement::new(sql, entity_params, CommandKind::Insert))
}

/// Build an UPDATE from an entity's column values.
///
/// Primary-key columns are removed from the SET clause and drive the WHERE
/// clause through `pk{i}` placeholders instead.
///
/// # Errors
///
/// Returns [`Error::NoPrimaryKey`] when every primary-key value is
/// null/absent, and [`Error::Metadata`] when no non-key column remains to
/// set.
pub fn build_update(meta: &EntityMetadata, entity_params: ParameterMap) -> Result<Statement> {
    let mut params = entity_params;
    let mut key_values = Vec::with_capacity(meta.primary_key_columns.len());
    for column in &meta.primary_key_columns {
        let value = params.remove(column).unwrap_or(sqlmapper_core::Value::Null);
        key_values.push(value);
    }
    let pk = PkPredicate::new(meta, key_values)?;
    if pk.is_unset() {
        return Err(Error::NoPrimaryKey {
            table: meta.qualified_name(),
        });
    }

    if params.is_empty() {
        return Err(Error::Metadata {
            message: format!(
                "table {} has no non-key columns to update",
                meta.qualified_name()
            ),
        });
    }

    let set_clauses: Vec<String> = params.iter().map(|(c, _)| format!("{c} = :{c}")).collect();
    let (where_sql, where_params) = pk_where(&pk);
    params.extend(where_params);

    let sql = format!(
        "UPDATE {} SET {} WHERE {}",
        meta.qualified_name(),
        set_clauses.join(", "),
        where_sql
    );

    tracing::debug!(table = %meta.qualified_name(), "built update");
    Ok(Statement::new(sql, params, CommandKind::Update))
}

/// Build a DELETE for a primary-key predicate.
pub fn build_delete(meta: &EntityMetadata, pk: &PkPredicate) -> Statement {
    let (where_sql, params) = pk_where(pk);
    let sql = format!("DELETE FROM {} WHERE {}", meta.qualified_name(), where_sql);
    Statement::new(sql, params, CommandKind::Delete)
}

/// Build a SELECT for a primary-key predicate.
pub fn build_select_by_pk(meta: &EntityMetadata, pk: &PkPredicate) -> Statement {
    let (where_sql, params) = pk_where(pk);
    let sql = format!(
        "SELECT * FROM {} WHERE {}",
        meta.qualified_name(),
        where_sql
    );
    Statement::new(sql, params, CommandKind::Select)
}

/// Build an unconditional SELECT of every row.
pub fn build_select_all(meta: &EntityMetadata) -> Statement {
    let sql = format!("SELECT * FROM {}", meta.qualified_name());
    Statement::new(sql, ParameterMap::new(), CommandKind::Select)
}

/// Build a COUNT(*) existence probe for a primary-key predicate.
pub fn build_count_by_pk(meta: &EntityMetadata, pk: &PkPredicate) -> Statement {
    let (where_sql, params) = pk_where(pk);
    let sql = format!(
        "SELECT COUNT(*) FROM {} WHERE {}",
        meta.qualified_name(),
        where_sql
    );
    Statement::new(sql, params, CommandKind::Select)
}

/// Build a SELECT filtered by structured criteria.
///
/// An empty criteria set renders as an unconditional select.
pub fn build_select_where(meta: &EntityMetadata, criteria: &Where) -> Statement {
    let (where_sql, params) = criteria.render(0);
    let mut sql = format!("SELECT * FROM {}", meta.qualified_name());
    if !where_sql.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&where_sql);
    }
    Statement::new(sql, params, CommandKind::Select)
}

/// Build an UPDATE with explicit SET values and structured criteria.
///
/// SET placeholders reuse the column names; criteria placeholders come from
/// the `w{i}` namespace, so the two never collide. An empty criteria set
/// updates every row.
///
/// # Errors
///
/// Returns [`Error::Metadata`] when no SET column was given.
pub fn build_update_where(
    meta: &EntityMetadata,
    sets: ParameterMap,
    criteria: &Where,
) -> Result<Statement> {
    if sets.is_empty() {
        return Err(Error::Metadata {
            message: format!("update of {} sets no columns", meta.qualified_name()),
        });
    }

    let set_clauses: Vec<String> = sets.iter().map(|(c, _)| format!("{c} = :{c}")).collect();
    let mut params = sets;
    let (where_sql, where_params) = criteria.render(0);
    params.extend(where_params);

    let mut sql = format!(
        "UPDATE {} SET {}",
        meta.qualified_name(),
        set_clauses.join(", ")
    );
    if !where_sql.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&where_sql);
    }
    Ok(Statement::new(sql, params, CommandKind::Update))
}

/// Build a DELETE with structured criteria.
///
/// An empty criteria set deletes every row.
pub fn build_delete_where(meta: &EntityMetadata, criteria: &Where) -> Statement {
    let (where_sql, params) = criteria.render(0);
    let mut sql = format!("DELETE FROM {}", meta.qualified_name());
    if !where_sql.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&where_sql);
    }
    Statement::new(sql, params, CommandKind::Delete)
}
