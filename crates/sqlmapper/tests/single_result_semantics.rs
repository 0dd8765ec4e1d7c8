//! Exactly-one-row enforcement for `get_single_result`.

mod common;

use common::MemoryDb;
use sqlmapper::prelude::*;

#[derive(Entity, Debug, Clone, PartialEq)]
#[entity(table = "users")]
struct User {
    #[entity(primary_key)]
    id: i64,
    name: String,
}

fn seeded_manager() -> SqlManager<MemoryDb> {
    let manager = SqlManager::new(MemoryDb::new());
    manager
        .insert(&User {
            id: 1,
            name: "Alice".to_string(),
        })
        .unwrap();
    manager
        .insert(&User {
            id: 2,
            name: "Alice".to_string(),
        })
        .unwrap();
    manager
}

#[test]
fn zero_rows_raise_not_found_by_default() {
    let manager = seeded_manager();
    let err = manager
        .select::<User>()
        .filter(Expr::col("name").eq("Nobody"))
        .get_single_result()
        .unwrap_err();
    assert!(matches!(err, Error::NotFound { .. }));
}

#[test]
fn zero_rows_with_suppression_return_none() {
    let manager = seeded_manager();
    let found = manager
        .select::<User>()
        .filter(Expr::col("name").eq("Nobody"))
        .suppress_not_found()
        .get_single_result()
        .unwrap();
    assert_eq!(found, None);
}

#[test]
fn exactly_one_row_returns_it() {
    let manager = seeded_manager();
    let found = manager
        .find_by_pk::<User>(1_i64)
        .get_single_result()
        .unwrap();
    assert_eq!(
        found,
        Some(User {
            id: 1,
            name: "Alice".to_string()
        })
    );
}

#[test]
fn multiple_rows_raise_ambiguous_result() {
    let manager = seeded_manager();
    let err = manager
        .select::<User>()
        .filter(Expr::col("name").eq("Alice"))
        .get_single_result()
        .unwrap_err();
    match err {
        Error::AmbiguousResult { table, found } => {
            assert_eq!(table, "users");
            assert_eq!(found, 2);
        }
        other => panic!("expected AmbiguousResult, got {other:?}"),
    }
}

#[test]
fn suppression_never_hides_ambiguous_results() {
    let manager = seeded_manager();
    let err = manager
        .select::<User>()
        .filter(Expr::col("name").eq("Alice"))
        .suppress_not_found()
        .get_single_result()
        .unwrap_err();
    assert!(matches!(err, Error::AmbiguousResult { .. }));
}
