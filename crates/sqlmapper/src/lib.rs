//! Lightweight data mapper and transaction propagation over raw SQL
//! connections.
//!
//! `sqlmapper` gives callers find-by-primary-key, fluent
//! select/update/delete builders and metadata-driven SQL generation without a
//! full ORM, plus nested logical transactions with REQUIRED/REQUIRES_NEW
//! propagation. Statement execution and parameter binding stay behind the
//! [`Connection`]/[`DataSource`] boundary implemented by drivers.
//!
//! # Example
//!
//! ```ignore
//! use sqlmapper::prelude::*;
//!
//! #[derive(Entity, Debug, Clone, PartialEq)]
//! #[entity(table = "users")]
//! struct User {
//!     #[entity(primary_key)]
//!     id: i64,
//!     name: String,
//! }
//!
//! let manager = SqlManager::new(datasource);
//!
//! let created = manager.insert(&User { id: 1, name: "Alice".into() })?;
//! let updated = manager.update(&User { id: 1, name: "Alicia".into() })?;
//!
//! let adults = manager
//!     .select::<User>()
//!     .filter(Expr::col("age").ge(18))
//!     .get_result_list()?;
//!
//! manager.transaction(Propagation::Required, |m| {
//!     m.insert(&user_a)?;
//!     m.insert(&user_b)?;
//!     Ok(())
//! })?;
//! ```

pub mod delete;
pub mod manager;
pub mod select;
pub mod sql_loader;
pub mod update;

pub use delete::DeleteBuilder;
pub use manager::SqlManager;
pub use select::SelectBuilder;
pub use sql_loader::SqlLoader;
pub use update::UpdateBuilder;

pub use sqlmapper_core::{
    CommandKind, Connection, DataSource, Entity, EntityMetadata, Error, FieldInfo, IntoPk,
    ParameterMap, PkPredicate, Result, Row, Value, entity_params, resolve,
};
pub use sqlmapper_macros::Entity;
pub use sqlmapper_query::{Expr, Statement, Where};
pub use sqlmapper_session::{Propagation, SessionHandle, TransactionManager, TransactionStatus};

/// The usual imports, in one place.
pub mod prelude {
    pub use crate::delete::DeleteBuilder;
    pub use crate::manager::SqlManager;
    pub use crate::select::SelectBuilder;
    pub use crate::sql_loader::SqlLoader;
    pub use crate::update::UpdateBuilder;
    pub use sqlmapper_core::{
        CommandKind, Connection, DataSource, Entity, Error, IntoPk, ParameterMap, Result, Row,
        Value,
    };
    pub use sqlmapper_macros::Entity;
    pub use sqlmapper_query::{Expr, Where};
    pub use sqlmapper_session::{Propagation, TransactionStatus};
}
