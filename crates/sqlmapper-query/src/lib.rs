//! Metadata-driven SQL generation for sqlmapper.
//!
//! Two building blocks live here:
//!
//! - [`dml`]: generators that derive parameterized INSERT/UPDATE/DELETE/
//!   SELECT statements from resolved [`sqlmapper_core::EntityMetadata`].
//! - [`criteria`]: a structured [`Expr`]/[`Where`] tree for composing WHERE
//!   clauses, rendered with its own placeholder namespace.
//!
//! Generated SQL uses named `:placeholder` syntax throughout; values travel
//! in the statement's [`sqlmapper_core::ParameterMap`] and binding is the
//! execution boundary's job. Three placeholder namespaces are in play and
//! never collide: column names (INSERT values, UPDATE SET), `pk{i}`
//! (primary-key predicates), and `w{i}` (criteria).

pub mod criteria;
pub mod dml;
pub mod statement;

pub use criteria::{Expr, Where};
pub use statement::Statement;
