//! Error taxonomy for the mapping layer.

use crate::command::CommandKind;

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, Error>;

/// All failures the mapping layer surfaces.
///
/// Domain errors ([`Error::NotFound`], [`Error::AmbiguousResult`],
/// [`Error::OptimisticLock`], [`Error::NoPrimaryKey`], [`Error::Metadata`])
/// pass through the transaction manager unwrapped so callers can match on
/// them. Anything else is wrapped exactly once as [`Error::Transaction`]
/// when it escapes an owning transaction scope.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Malformed or incomplete entity descriptor.
    #[error("entity metadata error: {message}")]
    Metadata {
        /// What is wrong with the descriptor.
        message: String,
    },

    /// Update or delete attempted with no primary-key values set.
    #[error("no primary key values set for table {table}")]
    NoPrimaryKey {
        /// Target table.
        table: String,
    },

    /// A single-result query matched zero rows.
    #[error("no row found in {table}")]
    NotFound {
        /// Queried table.
        table: String,
    },

    /// A single-result query matched more than one row.
    ///
    /// Never suppressed: it indicates a predicate defect, not missing data.
    #[error("expected at most one row from {table}, found {found}")]
    AmbiguousResult {
        /// Queried table.
        table: String,
        /// Number of rows actually returned.
        found: usize,
    },

    /// An update matched zero rows: the row vanished or a concurrent writer
    /// already changed it.
    #[error("optimistic lock failure on {table} (checked columns: {})", columns.join(", "))]
    OptimisticLock {
        /// Target table.
        table: String,
        /// Debug rendering of the entity that failed to update.
        entity: String,
        /// Primary-key columns that were checked in the WHERE clause.
        columns: Vec<String>,
    },

    /// A failure reported by the execution boundary.
    #[error("{kind} execution failed: {message}")]
    Execution {
        /// Which statement kind was being executed.
        kind: CommandKind,
        /// Driver-provided description.
        message: String,
    },

    /// A non-domain failure that escaped an owning transaction scope.
    #[error("transaction failed: {context}")]
    Transaction {
        /// What the transaction was doing.
        context: String,
        /// The original failure.
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Construct an execution error for the given statement kind.
    pub fn execution(kind: CommandKind, message: impl Into<String>) -> Self {
        Error::Execution {
            kind,
            message: message.into(),
        }
    }

    /// Whether this error belongs to the domain taxonomy.
    ///
    /// Domain errors propagate through the transaction manager unchanged;
    /// everything else gets wrapped once with transaction context.
    #[must_use]
    pub const fn is_domain(&self) -> bool {
        matches!(
            self,
            Error::Metadata { .. }
                | Error::NoPrimaryKey { .. }
                | Error::NotFound { .. }
                | Error::AmbiguousResult { .. }
                | Error::OptimisticLock { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_classification() {
        assert!(
            Error::NotFound {
                table: "users".to_string()
            }
            .is_domain()
        );
        assert!(
            Error::OptimisticLock {
                table: "users".to_string(),
                entity: String::new(),
                columns: vec!["id".to_string()],
            }
            .is_domain()
        );
        assert!(!Error::execution(CommandKind::Update, "boom").is_domain());
        let wrapped = Error::Transaction {
            context: "insert".to_string(),
            source: Box::new(Error::execution(CommandKind::Insert, "boom")),
        };
        assert!(!wrapped.is_domain());
    }

    #[test]
    fn test_display_mentions_columns() {
        let err = Error::OptimisticLock {
            table: "users".to_string(),
            entity: "User { id: 1 }".to_string(),
            columns: vec!["tenant_id".to_string(), "id".to_string()],
        };
        let text = err.to_string();
        assert!(text.contains("tenant_id, id"));
    }
}
