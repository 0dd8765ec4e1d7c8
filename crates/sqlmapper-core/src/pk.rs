//! Primary-key predicates.

use crate::entity::Entity;
use crate::error::{Error, Result};
use crate::metadata::EntityMetadata;
use crate::value::Value;

/// An ordered sequence of `(column, value)` equality conditions identifying
/// exactly one row.
///
/// Pair order always matches the metadata's declared primary-key column
/// order, so the `pk0, pk1, …` placeholders generated from this predicate
/// line up with the WHERE clause's AND-chain.
#[derive(Debug, Clone, PartialEq)]
pub struct PkPredicate {
    pairs: Vec<(&'static str, Value)>,
}

impl PkPredicate {
    /// Build a predicate from explicit key values.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Metadata`] when the number of values does not match
    /// the number of declared primary-key columns.
    pub fn new(meta: &EntityMetadata, values: Vec<Value>) -> Result<Self> {
        if values.len() != meta.primary_key_columns.len() {
            return Err(Error::Metadata {
                message: format!(
                    "table {} declares {} primary-key column(s), got {} value(s)",
                    meta.qualified_name(),
                    meta.primary_key_columns.len(),
                    values.len()
                ),
            });
        }
        Ok(Self {
            pairs: meta
                .primary_key_columns
                .iter()
                .copied()
                .zip(values)
                .collect(),
        })
    }

    /// Build a predicate from an entity's current key values.
    pub fn from_entity<E: Entity>(meta: &EntityMetadata, entity: &E) -> Result<Self> {
        Self::new(meta, entity.primary_key_value())
    }

    /// The `(column, value)` pairs in declared key order.
    #[must_use]
    pub fn pairs(&self) -> &[(&'static str, Value)] {
        &self.pairs
    }

    /// Whether every key value is NULL (an unset key).
    #[must_use]
    pub fn is_unset(&self) -> bool {
        self.pairs.iter().all(|(_, v)| v.is_null())
    }

    /// The column names, in order.
    #[must_use]
    pub fn columns(&self) -> Vec<String> {
        self.pairs.iter().map(|(c, _)| (*c).to_string()).collect()
    }
}

/// Conversion into an ordered list of primary-key values.
///
/// Lets callers pass a single scalar for single-column keys and a tuple for
/// composite keys: `find_by_pk::<User>(1)` or
/// `delete_by_pk::<Grant>((tenant_id, id))`.
pub trait IntoPk {
    /// The key values, in declared primary-key column order.
    fn into_values(self) -> Vec<Value>;
}

impl IntoPk for Vec<Value> {
    fn into_values(self) -> Vec<Value> {
        self
    }
}

macro_rules! impl_into_pk_scalar {
    ($($ty:ty),* $(,)?) => {
        $(
            impl IntoPk for $ty {
                fn into_values(self) -> Vec<Value> {
                    vec![self.into()]
                }
            }
        )*
    };
}

impl_into_pk_scalar!(bool, i16, i32, i64, f64, &str, String, Value);

macro_rules! impl_into_pk_tuple {
    ($(($($name:ident : $ty:ident),+)),* $(,)?) => {
        $(
            impl<$($ty: Into<Value>),+> IntoPk for ($($ty,)+) {
                fn into_values(self) -> Vec<Value> {
                    let ($($name,)+) = self;
                    vec![$($name.into()),+]
                }
            }
        )*
    };
}

impl_into_pk_tuple!(
    (a: A, b: B),
    (a: A, b: B, c: C),
    (a: A, b: B, c: C, d: D),
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldInfo;

    fn two_column_meta() -> EntityMetadata {
        EntityMetadata {
            table_name: "grants".to_string(),
            schema: None,
            columns: vec![
                FieldInfo::new("tenant_id").primary_key(true),
                FieldInfo::new("id").primary_key(true),
                FieldInfo::new("role"),
            ],
            primary_key_columns: vec!["tenant_id", "id"],
        }
    }

    #[test]
    fn test_pairs_follow_declared_order() {
        let meta = two_column_meta();
        let pk = PkPredicate::new(&meta, (1_i64, 2_i64).into_values()).unwrap();
        assert_eq!(
            pk.pairs(),
            &[("tenant_id", Value::BigInt(1)), ("id", Value::BigInt(2))]
        );
    }

    #[test]
    fn test_wrong_arity_is_rejected() {
        let meta = two_column_meta();
        let err = PkPredicate::new(&meta, vec![Value::BigInt(1)]).unwrap_err();
        assert!(matches!(err, Error::Metadata { .. }));
    }

    #[test]
    fn test_is_unset() {
        let meta = two_column_meta();
        let unset = PkPredicate::new(&meta, vec![Value::Null, Value::Null]).unwrap();
        assert!(unset.is_unset());
        let partial = PkPredicate::new(&meta, vec![Value::Null, Value::BigInt(2)]).unwrap();
        assert!(!partial.is_unset());
    }

    #[test]
    fn test_into_pk_scalar_and_tuple() {
        assert_eq!(42_i64.into_values(), vec![Value::BigInt(42)]);
        assert_eq!(
            ("acme", 7_i64).into_values(),
            vec![Value::Text("acme".to_string()), Value::BigInt(7)]
        );
    }
}
