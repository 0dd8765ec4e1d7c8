//! The entity descriptor contract.

use crate::field::FieldInfo;
use crate::params::ParameterMap;
use crate::row::Row;
use crate::value::Value;
use crate::Result;

/// A type mapped to a database table.
///
/// Implementations are normally generated by `#[derive(Entity)]`, which turns
/// `#[entity(...)]` annotations into the static descriptor below; hand-written
/// implementations are equally valid. The descriptor is resolved once per
/// type into [`crate::EntityMetadata`] and cached for the process lifetime.
///
/// # Example
///
/// ```ignore
/// #[derive(Entity, Debug, Clone, PartialEq)]
/// #[entity(table = "users")]
/// struct User {
///     #[entity(primary_key)]
///     id: i64,
///     name: String,
/// }
/// ```
pub trait Entity: Sized {
    /// Declared table name. `None` falls back to the lower-cased type name
    /// (the metadata resolver logs a warning for the fallback).
    const TABLE: Option<&'static str>;

    /// Declared schema, rendered as a `schema.table` prefix when present.
    const SCHEMA: Option<&'static str>;

    /// Static field descriptors, in declaration order.
    fn fields() -> &'static [FieldInfo];

    /// Current column values, as `(column_name, value)` pairs in
    /// [`Entity::fields`] order. This order drives generated column order.
    fn to_row(&self) -> Vec<(&'static str, Value)>;

    /// Rebuild an instance from a result row.
    fn from_row(row: &Row) -> Result<Self>;

    /// Current primary-key values, in declared primary-key column order.
    fn primary_key_value(&self) -> Vec<Value>;
}

/// Collect an entity's column values into a [`ParameterMap`].
///
/// Keys are column names; insertion order follows [`Entity::to_row`].
pub fn entity_params<E: Entity>(entity: &E) -> ParameterMap {
    entity
        .to_row()
        .into_iter()
        .map(|(column, value)| (column.to_string(), value))
        .collect()
}
