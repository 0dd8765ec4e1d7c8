//! Built statements.

use sqlmapper_core::{CommandKind, ParameterMap};

/// A finished statement: SQL text with named placeholders, the parameters
/// that fill them, and the command kind the execution boundary should run
/// it as.
#[derive(Debug, Clone)]
pub struct Statement {
    /// SQL text with `:name` placeholders.
    pub sql: String,
    /// Named parameter values.
    pub params: ParameterMap,
    /// Statement kind.
    pub kind: CommandKind,
}

impl Statement {
    /// Create a statement.
    #[must_use]
    pub fn new(sql: impl Into<String>, params: ParameterMap, kind: CommandKind) -> Self {
        Self {
            sql: sql.into(),
            params,
            kind,
        }
    }
}
