//! Manager-level units of work: commit/rollback guarantees and
//! REQUIRES_NEW isolation.

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

#[derive(Entity, Debug, Clone, PartialEq)]
#[entity(table = "audit")]
struct AuditEntry {
    #[entity(primary_key)]
    id: i64,
    message: String,
}

fn user(id: i64, name: &str) -> User {
    User {
        id,
        name: name.to_string(),
    }
}

#[test]
fn transaction_commits_every_statement_together() {
    let db = MemoryDb::new();
    let manager = SqlManager::new(db.clone());

    manager
        .transaction(Propagation::Required, |m| {
            m.insert(&user(1, "Alice"))?;
            m.insert(&user(2, "Bob"))?;
            Ok(())
        })
        .unwrap();

    assert_eq!(db.row_count("users"), 2);
    // The whole unit shared one physical session.
    assert_eq!(db.opened_connections(), 1);
}

#[test]
fn transaction_rolls_back_every_statement_on_failure() {
    let db = MemoryDb::new();
    let manager = SqlManager::new(db.clone());

    let err = manager
        .transaction(Propagation::Required, |m| {
            m.insert(&user(1, "Alice"))?;
            Err::<(), _>(Error::execution(CommandKind::Insert, "boom"))
        })
        .unwrap_err();

    assert!(matches!(err, Error::Transaction { .. }));
    assert_eq!(db.row_count("users"), 0);
}

#[test]
fn domain_errors_pass_through_the_transaction_unwrapped() {
    let db = MemoryDb::new();
    let manager = SqlManager::new(db.clone());

    let err = manager
        .transaction(Propagation::Required, |m| {
            m.insert(&user(1, "Alice"))?;
            m.find_by_pk::<User>(999_i64)
                .get_single_result()
                .map(|_| ())
        })
        .unwrap_err();

    assert!(matches!(err, Error::NotFound { .. }));
    // The failed unit rolled its insert back.
    assert_eq!(db.row_count("users"), 0);
}

#[test]
fn requires_new_failure_leaves_the_outer_unit_intact() {
    let db = MemoryDb::new();
    let manager = SqlManager::new(db.clone());
    db.fail_matching("INSERT INTO audit");

    manager
        .transaction(Propagation::Required, |m| {
            m.insert(&user(1, "Alice"))?;

            let inner = m.transaction(Propagation::RequiresNew, |m2| {
                m2.insert(&AuditEntry {
                    id: 1,
                    message: "created".to_string(),
                })
                .map(|_| ())
            });
            assert!(inner.is_err());

            // The outer session was restored and its staged write survived.
            m.insert(&user(2, "Bob")).map(|_| ())
        })
        .unwrap();

    assert_eq!(db.row_count("users"), 2);
    assert_eq!(db.row_count("audit"), 0);
    assert_eq!(db.opened_connections(), 2);
}

#[test]
fn requires_new_commit_survives_an_outer_rollback() {
    let db = MemoryDb::new();
    let manager = SqlManager::new(db.clone());

    let result = manager.transaction(Propagation::Required, |m| {
        m.insert(&user(1, "Alice"))?;

        m.transaction(Propagation::RequiresNew, |m2| {
            m2.insert(&AuditEntry {
                id: 1,
                message: "attempted".to_string(),
            })
            .map(|_| ())
        })?;

        Err::<(), _>(Error::execution(CommandKind::Update, "outer boom"))
    });

    assert!(result.is_err());
    // The isolated unit committed; the outer one did not.
    assert_eq!(db.row_count("users"), 0);
    assert_eq!(db.row_count("audit"), 1);
}

#[test]
fn uncommitted_outer_writes_are_invisible_to_requires_new() {
    let db = MemoryDb::new();
    let manager = SqlManager::new(db.clone());

    manager
        .transaction(Propagation::Required, |m| {
            m.insert(&user(1, "Alice"))?;

            let seen_inside = m.transaction(Propagation::RequiresNew, |m2| {
                m2.find_by_pk::<User>(1_i64)
                    .suppress_not_found()
                    .get_single_result()
            })?;
            assert_eq!(seen_inside, None);
            Ok(())
        })
        .unwrap();

    assert_eq!(db.row_count("users"), 1);
}

#[test]
fn independent_transaction_variants_commit_on_their_own() {
    let db = MemoryDb::new();
    let manager = SqlManager::new(db.clone());

    let result = manager.transaction(Propagation::Required, |m| {
        m.insert_with(&user(1, "Alice"), Propagation::RequiresNew)?;
        Err::<(), _>(Error::execution(CommandKind::Insert, "outer boom"))
    });

    assert!(result.is_err());
    // The independent insert committed before the outer unit failed.
    assert_eq!(db.row_count("users"), 1);
}
