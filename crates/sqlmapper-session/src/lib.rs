//! Transaction propagation for sqlmapper.
//!
//! The [`TransactionManager`] owns the notion of a "current" physical session
//! for one logical call chain and nests logical transactions onto it:
//!
//! - [`Propagation::Required`] joins the active session when one exists,
//!   otherwise opens a session, becomes its owner, and commits or rolls back
//!   when the owning scope exits.
//! - [`Propagation::RequiresNew`] suspends whatever is active, runs against a
//!   brand-new session, and restores the suspended session afterwards,
//!   whatever the outcome.
//!
//! # Design Philosophy
//!
//! - **Chain-local state**: the manager is a per-chain value (`RefCell`
//!   interior state, not `Sync`), threaded explicitly instead of hiding in a
//!   thread-local.
//! - **Guaranteed release**: sessions close by being dropped; guards roll
//!   back and restore suspended state on every exit path, including panics
//!   in nested callbacks.
//! - **Domain errors pass through**: only non-domain failures get wrapped
//!   with transaction context, and only once, at the owning scope.
//!
//! # Example
//!
//! ```ignore
//! let manager = TransactionManager::new(datasource);
//! let total = manager.execute(Propagation::Required, |session| {
//!     session.run(&insert_stmt)?;
//!     manager.execute(Propagation::RequiresNew, |audit| audit.run(&audit_stmt))?;
//!     session.run(&update_stmt)
//! })?;
//! ```

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use sqlmapper_core::{CommandKind, Connection, DataSource, Error, ParameterMap, Result, Row};
use sqlmapper_query::Statement;

// ============================================================================
// Propagation and status
// ============================================================================

/// Policy governing whether a unit of work joins the active transaction or
/// starts an isolated one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Propagation {
    /// Join the active session, or open one if none is active.
    Required,
    /// Always open a new session, suspending any active one.
    RequiresNew,
}

impl Propagation {
    /// Human-readable name, used in log fields.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Propagation::Required => "REQUIRED",
            Propagation::RequiresNew => "REQUIRES_NEW",
        }
    }
}

impl fmt::Display for Propagation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Observable state of the innermost transaction scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionStatus {
    /// No physical session is active for this chain.
    NoActiveSession,
    /// The innermost scope joined a session owned further out.
    ActiveParticipant,
    /// The innermost scope opened the active session and decides its outcome.
    ActiveOwner,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    Owner,
    Participant,
}

// ============================================================================
// Session handle
// ============================================================================

/// A cheap handle onto the active physical session.
///
/// Handles borrow the session transiently per statement, so nested
/// propagation scopes can share one session without holding long borrows.
/// A handle is only meaningful inside the [`TransactionManager::execute`]
/// callback it was passed to; it must not be stored past that scope.
pub struct SessionHandle<C: Connection> {
    conn: Rc<RefCell<C>>,
}

impl<C: Connection> Clone for SessionHandle<C> {
    fn clone(&self) -> Self {
        Self {
            conn: Rc::clone(&self.conn),
        }
    }
}

impl<C: Connection> SessionHandle<C> {
    fn new(conn: Rc<RefCell<C>>) -> Self {
        Self { conn }
    }

    /// Execute a data-modification statement, returning affected rows.
    pub fn execute(&self, sql: &str, params: &ParameterMap, kind: CommandKind) -> Result<u64> {
        tracing::debug!(%kind, sql, "executing statement");
        self.conn.borrow_mut().execute(sql, params, kind)
    }

    /// Execute a query, returning its rows.
    pub fn query(&self, sql: &str, params: &ParameterMap) -> Result<Vec<Row>> {
        tracing::debug!(sql, "executing query");
        self.conn.borrow_mut().query(sql, params)
    }

    /// Run a built statement through [`SessionHandle::execute`].
    pub fn run(&self, statement: &Statement) -> Result<u64> {
        self.execute(&statement.sql, &statement.params, statement.kind)
    }

    /// Run a built statement through [`SessionHandle::query`].
    pub fn fetch(&self, statement: &Statement) -> Result<Vec<Row>> {
        self.query(&statement.sql, &statement.params)
    }
}

// ============================================================================
// Guards
// ============================================================================

/// Owner-scope cleanup: pops the scope, clears the current session and, when
/// still armed (panic unwind), rolls the session back.
struct OwnerGuard<'a, C: Connection> {
    current: &'a RefCell<Option<Rc<RefCell<C>>>>,
    scopes: &'a RefCell<Vec<Role>>,
    conn: Rc<RefCell<C>>,
    rollback_on_drop: bool,
}

impl<C: Connection> Drop for OwnerGuard<'_, C> {
    fn drop(&mut self) {
        self.scopes.borrow_mut().pop();
        *self.current.borrow_mut() = None;
        if self.rollback_on_drop {
            if let Err(err) = self.conn.borrow_mut().rollback() {
                tracing::error!(error = %err, "rollback during unwind failed");
            }
        }
    }
}

/// Participant-scope cleanup: pops the scope on every exit path.
struct ParticipantGuard<'a> {
    scopes: &'a RefCell<Vec<Role>>,
}

impl Drop for ParticipantGuard<'_> {
    fn drop(&mut self) {
        self.scopes.borrow_mut().pop();
    }
}

/// Restores a suspended session when a `REQUIRES_NEW` scope exits, whatever
/// the outcome.
struct RestoreGuard<'a, C: Connection> {
    current: &'a RefCell<Option<Rc<RefCell<C>>>>,
    suspended: Option<Option<Rc<RefCell<C>>>>,
}

impl<C: Connection> Drop for RestoreGuard<'_, C> {
    fn drop(&mut self) {
        if let Some(suspended) = self.suspended.take() {
            *self.current.borrow_mut() = suspended;
        }
    }
}

// ============================================================================
// Transaction manager
// ============================================================================

/// Nests logical transactions onto physical sessions for one call chain.
///
/// At most one physical session is active at any instant; nesting depth is
/// unbounded; every opened session is closed exactly once (sessions close on
/// drop). Not `Sync`: a manager belongs to a single logical call chain.
pub struct TransactionManager<D: DataSource> {
    datasource: D,
    current: RefCell<Option<Rc<RefCell<D::Conn>>>>,
    scopes: RefCell<Vec<Role>>,
}

impl<D: DataSource> TransactionManager<D> {
    /// Create a manager over a datasource.
    pub fn new(datasource: D) -> Self {
        Self {
            datasource,
            current: RefCell::new(None),
            scopes: RefCell::new(Vec::new()),
        }
    }

    /// The underlying datasource.
    pub fn datasource(&self) -> &D {
        &self.datasource
    }

    /// Whether a physical session is active for this chain.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.current.borrow().is_some()
    }

    /// Current nesting depth (number of entered propagation scopes).
    #[must_use]
    pub fn depth(&self) -> usize {
        self.scopes.borrow().len()
    }

    /// State of the innermost scope.
    #[must_use]
    pub fn status(&self) -> TransactionStatus {
        if !self.is_active() {
            return TransactionStatus::NoActiveSession;
        }
        match self.scopes.borrow().last() {
            Some(Role::Owner) => TransactionStatus::ActiveOwner,
            Some(Role::Participant) => TransactionStatus::ActiveParticipant,
            None => TransactionStatus::NoActiveSession,
        }
    }

    /// Run an operation under the given propagation policy.
    ///
    /// The operation receives a [`SessionHandle`] onto the active session and
    /// may nest further `execute` calls. Owner scopes commit on success and
    /// roll back on failure; participant scopes leave the outcome to the
    /// enclosing owner. Rollback failures are logged and never mask the
    /// original error.
    #[tracing::instrument(level = "debug", skip(self, op), fields(propagation = %propagation, depth = self.depth()))]
    pub fn execute<T>(
        &self,
        propagation: Propagation,
        op: impl FnOnce(&SessionHandle<D::Conn>) -> Result<T>,
    ) -> Result<T> {
        match propagation {
            Propagation::Required => {
                let existing = self.current.borrow().as_ref().map(Rc::clone);
                match existing {
                    Some(conn) => {
                        tracing::debug!("joining active session");
                        self.scopes.borrow_mut().push(Role::Participant);
                        let _scope = ParticipantGuard {
                            scopes: &self.scopes,
                        };
                        op(&SessionHandle::new(conn))
                    }
                    None => self.run_as_owner(op),
                }
            }
            Propagation::RequiresNew => {
                let suspended = self.current.borrow_mut().take();
                if suspended.is_some() {
                    tracing::debug!("suspending active session");
                }
                let _restore = RestoreGuard {
                    current: &self.current,
                    suspended: Some(suspended),
                };
                self.run_as_owner(op)
            }
        }
    }

    /// Open a session, own it for the duration of `op`, and settle it.
    fn run_as_owner<T>(
        &self,
        op: impl FnOnce(&SessionHandle<D::Conn>) -> Result<T>,
    ) -> Result<T> {
        let raw = self
            .datasource
            .connection()
            .map_err(|err| wrap(err, "opening physical session"))?;
        let conn = Rc::new(RefCell::new(raw));

        if let Err(err) = conn.borrow_mut().begin() {
            // Session closes when `conn` drops on return.
            return Err(wrap(err, "beginning transaction"));
        }
        tracing::debug!("opened owning session");

        *self.current.borrow_mut() = Some(Rc::clone(&conn));
        self.scopes.borrow_mut().push(Role::Owner);
        let mut guard = OwnerGuard {
            current: &self.current,
            scopes: &self.scopes,
            conn: Rc::clone(&conn),
            rollback_on_drop: true,
        };

        let result = op(&SessionHandle::new(Rc::clone(&conn)));

        guard.rollback_on_drop = false;
        drop(guard);

        match result {
            Ok(value) => match conn.borrow_mut().commit() {
                Ok(()) => {
                    tracing::debug!("committed");
                    Ok(value)
                }
                Err(commit_err) => {
                    if let Err(rb_err) = conn.borrow_mut().rollback() {
                        tracing::error!(error = %rb_err, "rollback after failed commit failed");
                    }
                    Err(wrap(commit_err, "committing transaction"))
                }
            },
            Err(err) => {
                if let Err(rb_err) = conn.borrow_mut().rollback() {
                    tracing::error!(error = %rb_err, "rollback failed");
                }
                tracing::debug!("rolled back");
                // Domain errors pass unchanged; already-wrapped failures from
                // nested owner scopes are not wrapped a second time.
                if err.is_domain() || matches!(err, Error::Transaction { .. }) {
                    Err(err)
                } else {
                    Err(wrap(err, "executing transactional operation"))
                }
            }
        }
        // `conn` drops here; with every handle gone the session closes.
    }
}

fn wrap(err: Error, context: &str) -> Error {
    Error::Transaction {
        context: context.to_string(),
        source: Box::new(err),
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
