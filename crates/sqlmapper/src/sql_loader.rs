//! The SQL-file boundary.

use sqlmapper_core::Result;

/// Resolves a SQL-file reference to statement text.
///
/// Loading, caching and path conventions are the implementation's business;
/// the mapping layer only ever asks for the final text. File-based
/// operations fail when no loader is configured on the manager.
pub trait SqlLoader {
    /// Load the SQL text behind a file reference.
    fn load(&self, path: &str) -> Result<String>;
}

impl<F> SqlLoader for F
where
    F: Fn(&str) -> Result<String>,
{
    fn load(&self, path: &str) -> Result<String> {
        self(path)
    }
}
