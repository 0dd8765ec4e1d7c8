//! Entity metadata resolution.
//!
//! [`resolve`] turns an entity's static descriptor into an [`EntityMetadata`]
//! value and caches it process-wide, keyed by type identity. Resolution is
//! pure: repeated calls for the same type return the same cached value.

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock, RwLock};

use crate::entity::Entity;
use crate::error::{Error, Result};
use crate::field::FieldInfo;

/// Resolved table mapping for an entity type.
///
/// Read-only after resolution. `columns` preserves declaration order;
/// `primary_key_columns` preserves the declared key order, which fixes the
/// `pk0, pk1, …` placeholder numbering used in generated WHERE clauses.
#[derive(Debug, Clone)]
pub struct EntityMetadata {
    /// Table name, without schema prefix.
    pub table_name: String,
    /// Declared schema, if any.
    pub schema: Option<&'static str>,
    /// Column descriptors in declaration order.
    pub columns: Vec<FieldInfo>,
    /// Primary-key column names in declared order.
    pub primary_key_columns: Vec<&'static str>,
}

impl EntityMetadata {
    /// The table name as it appears in SQL, schema-qualified when a schema
    /// is declared.
    #[must_use]
    pub fn qualified_name(&self) -> String {
        match self.schema {
            Some(schema) => format!("{schema}.{}", self.table_name),
            None => self.table_name.clone(),
        }
    }

    /// Look up a column descriptor by column name.
    #[must_use]
    pub fn column(&self, column_name: &str) -> Option<&FieldInfo> {
        self.columns.iter().find(|c| c.column_name == column_name)
    }

    /// Whether a column is part of the primary key.
    #[must_use]
    pub fn is_primary_key(&self, column_name: &str) -> bool {
        self.primary_key_columns.contains(&column_name)
    }
}

fn cache() -> &'static RwLock<HashMap<TypeId, Arc<EntityMetadata>>> {
    static CACHE: OnceLock<RwLock<HashMap<TypeId, Arc<EntityMetadata>>>> = OnceLock::new();
    CACHE.get_or_init(|| RwLock::new(HashMap::new()))
}

/// Short type name: last path segment, stripped of generics.
fn short_type_name<E: 'static>() -> &'static str {
    let full = std::any::type_name::<E>();
    full.rsplit("::").next().unwrap_or(full)
}

/// Resolve (and cache) the metadata for an entity type.
///
/// # Errors
///
/// Returns [`Error::Metadata`] when the descriptor declares no primary-key
/// column. A missing table declaration is not an error: the table name
/// defaults to the lower-cased type name, with a logged warning.
pub fn resolve<E: Entity + 'static>() -> Result<Arc<EntityMetadata>> {
    let type_id = TypeId::of::<E>();

    if let Some(meta) = cache().read().expect("metadata cache poisoned").get(&type_id) {
        return Ok(Arc::clone(meta));
    }

    let table_name = match E::TABLE {
        Some(name) => name.to_string(),
        None => {
            let fallback = short_type_name::<E>().to_lowercase();
            tracing::warn!(
                entity = std::any::type_name::<E>(),
                table = %fallback,
                "no table declared; defaulting to lower-cased type name"
            );
            fallback
        }
    };

    let columns: Vec<FieldInfo> = E::fields().to_vec();
    let primary_key_columns: Vec<&'static str> = columns
        .iter()
        .filter(|c| c.primary_key)
        .map(|c| c.column_name)
        .collect();

    if primary_key_columns.is_empty() {
        return Err(Error::Metadata {
            message: format!(
                "entity {} declares no primary-key column",
                std::any::type_name::<E>()
            ),
        });
    }

    let meta = Arc::new(EntityMetadata {
        table_name,
        schema: E::SCHEMA,
        columns,
        primary_key_columns,
    });

    let mut guard = cache().write().expect("metadata cache poisoned");
    let entry = guard.entry(type_id).or_insert_with(|| Arc::clone(&meta));
    Ok(Arc::clone(entry))
}
