//! Database driver and connection traits.
//!
//! This module defines the seam to the underlying relational driver:
//!
//! - [`Driver`] - creates unopened connections from an opaque connection string
//! - [`DbConnection`] - lifecycle, transactions and metadata of one live connection
//! - [`TransactionHandle`] - token identifying a transaction begun on a connection
//! - [`PreparedStatement`] - a command created by the driver for a SQL text
//!
//! Query execution lives in [`crate::executor`]; a connection that can run SQL
//! implements both traits.

use crate::command::CommandKind;
use crate::error::{IntoOutcome, Result};
use crate::params::Params;
use crate::value::Value;
use asupersync::{Cx, Outcome};
use std::time::Duration;

/// Transaction isolation level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum IsolationLevel {
    /// Dirty reads, non-repeatable reads and phantoms are possible.
    ReadUncommitted,

    /// Only committed changes are visible. The default for most servers.
    #[default]
    ReadCommitted,

    /// A consistent snapshot for the lifetime of the transaction.
    RepeatableRead,

    /// Transactions appear to execute one after another.
    Serializable,
}

impl IsolationLevel {
    /// Get the SQL syntax for this isolation level.
    #[must_use]
    pub const fn as_sql(&self) -> &'static str {
        match self {
            IsolationLevel::ReadUncommitted => "READ UNCOMMITTED",
            IsolationLevel::ReadCommitted => "READ COMMITTED",
            IsolationLevel::RepeatableRead => "REPEATABLE READ",
            IsolationLevel::Serializable => "SERIALIZABLE",
        }
    }
}

/// Identifies a transaction begun on a connection.
///
/// Handles are plain tokens: the connection that issued one owns the
/// transaction state, and passing a handle along with a command enlists the
/// command in that transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransactionHandle {
    id: u64,
    isolation: IsolationLevel,
}

impl TransactionHandle {
    /// Create a handle. Called by drivers from `begin_transaction`.
    #[must_use]
    pub const fn new(id: u64, isolation: IsolationLevel) -> Self {
        Self { id, isolation }
    }

    #[must_use]
    pub const fn id(&self) -> u64 {
        self.id
    }

    #[must_use]
    pub const fn isolation(&self) -> IsolationLevel {
        self.isolation
    }
}

/// Lifecycle state of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// Created or closed; may be opened.
    #[default]
    Closed,
    /// An open is in progress.
    Connecting,
    /// Ready to execute commands.
    Open,
    /// The link to the server was lost.
    Broken,
    /// Resources have been released; the connection cannot be reopened.
    Disposed,
}

impl ConnectionState {
    #[must_use]
    pub const fn is_open(&self) -> bool {
        matches!(self, ConnectionState::Open)
    }
}

/// A command created by a connection for one SQL text.
///
/// Drivers hand these out from [`DbConnection::create_command`]; callers may
/// bind parameters and adjust timeout and kind before executing it through
/// the driver's own API.
#[derive(Debug, Clone)]
pub struct PreparedStatement {
    id: u64,
    sql: String,
    kind: CommandKind,
    timeout: Option<Duration>,
    params: Params,
}

impl PreparedStatement {
    /// Create a statement. This is typically called by the driver.
    #[must_use]
    pub fn new(id: u64, sql: impl Into<String>) -> Self {
        Self {
            id,
            sql: sql.into(),
            kind: CommandKind::Text,
            timeout: None,
            params: Params::new(),
        }
    }

    #[must_use]
    pub fn kind(mut self, kind: CommandKind) -> Self {
        self.kind = kind;
        self
    }

    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Bind a named parameter, replacing an earlier binding of the same name.
    #[must_use]
    pub fn bind(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.set(name, value);
        self
    }

    #[must_use]
    pub const fn id(&self) -> u64 {
        self.id
    }

    #[must_use]
    pub fn sql(&self) -> &str {
        &self.sql
    }

    #[must_use]
    pub const fn command_kind(&self) -> CommandKind {
        self.kind
    }

    #[must_use]
    pub const fn command_timeout(&self) -> Option<Duration> {
        self.timeout
    }

    #[must_use]
    pub fn params(&self) -> &Params {
        &self.params
    }
}

/// A live database connection.
///
/// Implemented by drivers. The lifecycle is
/// `Closed -> open -> Open -> close -> Closed`, and `dispose` moves to
/// `Disposed` from any state. Implementations must tolerate `close` on a
/// closed connection.
pub trait DbConnection: Send + Sync {
    /// The connection string this connection was created from.
    fn connection_string(&self) -> &str;

    /// Current database name (may be empty before open).
    fn database(&self) -> &str;

    /// Server or file the connection points at.
    fn data_source(&self) -> &str;

    /// Server version string reported after open.
    fn server_version(&self) -> &str;

    /// Time to wait while establishing a connection.
    fn connection_timeout(&self) -> Duration {
        Duration::from_secs(15)
    }

    fn state(&self) -> ConnectionState;

    /// Open the connection, blocking the calling thread.
    fn open(&mut self) -> Result<()>;

    /// Open the connection asynchronously.
    ///
    /// The default implementation observes cancellation and then calls
    /// [`open`](DbConnection::open). Drivers with non-blocking I/O override it.
    fn open_async(&mut self, cx: &Cx) -> impl Future<Output = Outcome<(), crate::Error>> + Send {
        async move {
            if let Some(reason) = cx.cancel_reason() {
                return Outcome::Cancelled(reason);
            }
            self.open().into_outcome()
        }
    }

    fn close(&mut self) -> Result<()>;

    /// Release every resource held by the connection.
    fn dispose(&mut self) -> Result<()>;

    fn begin_transaction(&mut self, isolation: IsolationLevel) -> Result<TransactionHandle>;

    fn commit(&mut self, tx: TransactionHandle) -> Result<()>;

    fn rollback(&mut self, tx: TransactionHandle) -> Result<()>;

    /// Create a command for `sql` bound to this connection.
    fn create_command(&self, sql: &str) -> Result<PreparedStatement>;

    /// Switch the current database.
    fn change_database(&mut self, name: &str) -> Result<()>;
}

/// A database driver: a factory of unopened connections.
pub trait Driver: Send + Sync {
    type Connection: DbConnection;

    /// Short driver name used in log output.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Instantiate an unopened connection. The connection string is opaque
    /// to everything but the driver.
    fn create_connection(&self, connection_string: &str) -> Result<Self::Connection>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_isolation_level_default() {
        assert_eq!(IsolationLevel::default(), IsolationLevel::ReadCommitted);
    }

    #[test]
    fn test_isolation_level_as_sql() {
        assert_eq!(IsolationLevel::ReadUncommitted.as_sql(), "READ UNCOMMITTED");
        assert_eq!(IsolationLevel::Serializable.as_sql(), "SERIALIZABLE");
    }

    #[test]
    fn test_transaction_handle_accessors() {
        let tx = TransactionHandle::new(9, IsolationLevel::Serializable);
        assert_eq!(tx.id(), 9);
        assert_eq!(tx.isolation(), IsolationLevel::Serializable);
        assert_eq!(tx, TransactionHandle::new(9, IsolationLevel::Serializable));
    }

    #[test]
    fn test_connection_state() {
        assert_eq!(ConnectionState::default(), ConnectionState::Closed);
        assert!(ConnectionState::Open.is_open());
        assert!(!ConnectionState::Broken.is_open());
    }

    #[test]
    fn test_prepared_statement_builder() {
        let stmt = PreparedStatement::new(3, "exec usp_Fruit")
            .kind(CommandKind::StoredProcedure)
            .timeout(Duration::from_secs(5))
            .bind("Id", 1)
            .bind("id", 2);
        assert_eq!(stmt.id(), 3);
        assert_eq!(stmt.sql(), "exec usp_Fruit");
        assert_eq!(stmt.command_kind(), CommandKind::StoredProcedure);
        assert_eq!(stmt.command_timeout(), Some(Duration::from_secs(5)));
        assert_eq!(stmt.params().len(), 1);
        assert_eq!(stmt.params().get("ID"), Some(&Value::Int(2)));
    }
}
