//! Connections bound to a script registry.

use crate::registry::{ScriptRegistry, ScriptResolver};
use asupersync::{Cx, Outcome};
use sqlscript_core::{
    BlockingExecutor, CommandDefinition, ConnectionError, ConnectionErrorKind, ConnectionState,
    DbConnection, Error, Executor, GridReader, IsolationLevel, Params, PreparedStatement, Result, Row, ToParams,
    TransactionHandle,
};
use std::sync::Arc;
use std::time::Duration;

/// A live database connection paired with a script registry.
///
/// Every connection operation is forwarded to the wrapped connection
/// unchanged. Script keys resolve against the shared registry.
///
/// The wrapped connection is disposed exactly once: by an explicit
/// [`dispose`](DbConnection::dispose), or when the `ScriptConnection` is
/// dropped. A failure during drop is logged instead of propagated.
/// Disposal is terminal: afterwards `open`, transactions and commands fail
/// with a `NotOpen` connection error and `close` does nothing.
pub struct ScriptConnection<C: DbConnection> {
    inner: C,
    scripts: Arc<ScriptRegistry>,
    disposed: bool,
}

impl<C: DbConnection> ScriptConnection<C> {
    pub fn new(scripts: Arc<ScriptRegistry>, connection: C) -> Self {
        Self {
            inner: connection,
            scripts,
            disposed: false,
        }
    }

    /// The registry scripts resolve against.
    pub fn scripts(&self) -> &Arc<ScriptRegistry> {
        &self.scripts
    }

    /// The wrapped connection.
    pub fn inner(&self) -> &C {
        &self.inner
    }

    pub fn inner_mut(&mut self) -> &mut C {
        &mut self.inner
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// SQL text for `key` with tags replaced from `params`.
    pub fn script_sql(&self, key: &str, params: impl ToParams) -> Result<String> {
        self.scripts.get_with(key, params)
    }

    fn ensure_live(&self) -> Result<()> {
        if self.disposed {
            return Err(Error::Connection(ConnectionError {
                kind: ConnectionErrorKind::NotOpen,
                message: "connection has been disposed".to_string(),
                source: None,
            }));
        }
        Ok(())
    }
}

impl<C: DbConnection> std::fmt::Debug for ScriptConnection<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptConnection")
            .field("data_source", &self.inner.data_source())
            .field("database", &self.inner.database())
            .field("state", &self.inner.state())
            .field("scripts", &self.scripts.len())
            .field("disposed", &self.disposed)
            .finish()
    }
}

impl<C: DbConnection> ScriptResolver for ScriptConnection<C> {
    fn script_sql(&self, key: &str, params: &Params) -> Result<String> {
        self.scripts.get_with(key, params)
    }
}

impl<C: DbConnection> DbConnection for ScriptConnection<C> {
    fn connection_string(&self) -> &str {
        self.inner.connection_string()
    }

    fn database(&self) -> &str {
        self.inner.database()
    }

    fn data_source(&self) -> &str {
        self.inner.data_source()
    }

    fn server_version(&self) -> &str {
        self.inner.server_version()
    }

    fn connection_timeout(&self) -> Duration {
        self.inner.connection_timeout()
    }

    fn state(&self) -> ConnectionState {
        if self.disposed {
            ConnectionState::Disposed
        } else {
            self.inner.state()
        }
    }

    fn open(&mut self) -> Result<()> {
        self.ensure_live()?;
        self.inner.open()
    }

    fn open_async(&mut self, cx: &Cx) -> impl Future<Output = Outcome<(), Error>> + Send {
        async move {
            if let Err(e) = self.ensure_live() {
                return Outcome::Err(e);
            }
            self.inner.open_async(cx).await
        }
    }

    fn close(&mut self) -> Result<()> {
        if self.disposed {
            return Ok(());
        }
        self.inner.close()
    }

    fn dispose(&mut self) -> Result<()> {
        if self.disposed {
            return Ok(());
        }
        self.disposed = true;
        tracing::debug!(data_source = self.inner.data_source(), "disposing connection");
        self.inner.dispose()
    }

    fn begin_transaction(&mut self, isolation: IsolationLevel) -> Result<TransactionHandle> {
        self.ensure_live()?;
        self.inner.begin_transaction(isolation)
    }

    fn commit(&mut self, tx: TransactionHandle) -> Result<()> {
        self.ensure_live()?;
        self.inner.commit(tx)
    }

    fn rollback(&mut self, tx: TransactionHandle) -> Result<()> {
        self.ensure_live()?;
        self.inner.rollback(tx)
    }

    fn create_command(&self, sql: &str) -> Result<PreparedStatement> {
        self.ensure_live()?;
        self.inner.create_command(sql)
    }

    fn change_database(&mut self, name: &str) -> Result<()> {
        self.ensure_live()?;
        self.inner.change_database(name)
    }
}

impl<C: DbConnection> Drop for ScriptConnection<C> {
    fn drop(&mut self) {
        if let Err(e) = self.dispose() {
            tracing::warn!(error = %e, "failed to dispose connection on drop");
        }
    }
}

impl<C: DbConnection + Executor> Executor for ScriptConnection<C> {
    fn execute(
        &self,
        cx: &Cx,
        command: &CommandDefinition,
    ) -> impl Future<Output = Outcome<u64, Error>> + Send {
        self.inner.execute(cx, command)
    }

    fn query(
        &self,
        cx: &Cx,
        command: &CommandDefinition,
    ) -> impl Future<Output = Outcome<Vec<Row>, Error>> + Send {
        self.inner.query(cx, command)
    }

    fn query_multiple(
        &self,
        cx: &Cx,
        command: &CommandDefinition,
    ) -> impl Future<Output = Outcome<GridReader, Error>> + Send {
        self.inner.query_multiple(cx, command)
    }
}

impl<C: DbConnection + BlockingExecutor> BlockingExecutor for ScriptConnection<C> {
    fn execute(&self, command: &CommandDefinition) -> Result<u64> {
        self.inner.execute(command)
    }

    fn query(&self, command: &CommandDefinition) -> Result<Vec<Row>> {
        self.inner.query(command)
    }

    fn query_multiple(&self, command: &CommandDefinition) -> Result<GridReader> {
        self.inner.query_multiple(command)
    }
}
