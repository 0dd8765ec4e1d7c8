//! The execution boundary.
//!
//! The mapping layer never talks to a database directly: it hands finished
//! SQL text plus a named [`ParameterMap`] to a [`Connection`] and gets back
//! rows or an affected-row count. Parameter binding, wire protocol, pooling
//! and SQL-file caching all live behind these traits.

use crate::command::CommandKind;
use crate::error::Result;
use crate::params::ParameterMap;
use crate::row::Row;

/// A physical database session.
///
/// Not thread-safe: a connection belongs to exactly one logical call chain
/// at a time. Dropping a connection releases it; implementations that need
/// an explicit close should do so in `Drop`.
pub trait Connection {
    /// Execute a data-modification statement, returning the affected-row
    /// count.
    fn execute(&mut self, sql: &str, params: &ParameterMap, kind: CommandKind) -> Result<u64>;

    /// Execute a query, returning its rows.
    fn query(&mut self, sql: &str, params: &ParameterMap) -> Result<Vec<Row>>;

    /// Begin a transaction on this session.
    fn begin(&mut self) -> Result<()>;

    /// Commit the current transaction.
    fn commit(&mut self) -> Result<()>;

    /// Roll back the current transaction.
    fn rollback(&mut self) -> Result<()>;
}

/// A source of physical sessions.
///
/// The transaction manager opens one session per owning transaction scope
/// and a fresh one for every `REQUIRES_NEW` entry.
pub trait DataSource {
    /// The session type this source produces.
    type Conn: Connection;

    /// Open a new physical session.
    fn connection(&self) -> Result<Self::Conn>;
}
