//! Shared fixtures for sqlscript integration tests.

#![allow(dead_code)]

use asupersync::types::CancelKind;
use asupersync::{Cx, Outcome};
use parking_lot::Mutex;
use sqlscript::{
    BlockingExecutor, CommandDefinition, ConnectionState, DbConnection, Driver, Error, Executor,
    GridReader, IsolationLevel, PreparedStatement, Result, Row, ScriptRegistry, TransactionHandle,
    Value,
};
use sqlscript_core::{ConnectionError, ConnectionErrorKind, IntoOutcome};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

pub fn unwrap_outcome<T>(outcome: Outcome<T, Error>) -> T {
    match outcome {
        Outcome::Ok(v) => v,
        Outcome::Err(e) => panic!("unexpected error: {e}"),
        Outcome::Cancelled(r) => panic!("cancelled: {r:?}"),
        Outcome::Panicked(p) => panic!("panicked: {p:?}"),
    }
}

pub fn expect_err<T>(outcome: Outcome<T, Error>) -> Error {
    match outcome {
        Outcome::Err(e) => e,
        Outcome::Ok(_) => panic!("expected an error, got a value"),
        Outcome::Cancelled(r) => panic!("cancelled: {r:?}"),
        Outcome::Panicked(p) => panic!("panicked: {p:?}"),
    }
}

/// Mark `cx` cancelled, as a caller abandoning the operation would.
pub fn cancel(cx: &Cx) {
    cx.cancel_with(CancelKind::User, Some("caller gave up"));
}

/// A test context that is already cancelled.
pub fn cancelled_cx() -> Cx {
    let cx = Cx::for_testing();
    cancel(&cx);
    cx
}

/// Directory holding the `.sql` fixtures.
pub fn scripts_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests").join("scripts")
}

/// Registry loaded from the fixture directory.
pub fn fixture_registry() -> Arc<ScriptRegistry> {
    let scripts = ScriptRegistry::new();
    scripts
        .add()
        .from_directory(scripts_dir())
        .expect("load fixture scripts");
    Arc::new(scripts)
}

/// What the mock driver and its connections have been asked to do.
#[derive(Default)]
pub struct Journal {
    pub created: AtomicUsize,
    pub opened: AtomicUsize,
    pub disposed: AtomicUsize,
    pub statements: Mutex<Vec<CommandDefinition>>,
}

impl Journal {
    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn disposed(&self) -> usize {
        self.disposed.load(Ordering::SeqCst)
    }

    pub fn last_sql(&self) -> Option<String> {
        self.statements.lock().last().map(|c| c.sql.clone())
    }

    pub fn last(&self) -> Option<CommandDefinition> {
        self.statements.lock().last().cloned()
    }
}

/// Driver handing out [`MockConnection`]s that share one journal.
#[derive(Clone, Default)]
pub struct MockDriver {
    pub journal: Arc<Journal>,
    pub fail_open: bool,
    pub fail_create: bool,
}

impl MockDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_open() -> Self {
        Self {
            fail_open: true,
            ..Self::default()
        }
    }

    pub fn journal(&self) -> &Journal {
        &self.journal
    }
}

impl Driver for MockDriver {
    type Connection = MockConnection;

    fn name(&self) -> &str {
        "mock"
    }

    fn create_connection(&self, connection_string: &str) -> Result<MockConnection> {
        if self.fail_create {
            return Err(Error::Connection(ConnectionError {
                kind: ConnectionErrorKind::Connect,
                message: "driver refused to create a connection".to_string(),
                source: None,
            }));
        }
        self.journal().created.fetch_add(1, Ordering::SeqCst);
        Ok(MockConnection {
            journal: Arc::clone(&self.journal),
            connection_string: connection_string.to_string(),
            database: "main".to_string(),
            state: ConnectionState::Closed,
            fail_open: self.fail_open,
            application_name: None,
        })
    }
}

/// In-memory connection answering every query with the same fruit rows.
pub struct MockConnection {
    journal: Arc<Journal>,
    connection_string: String,
    database: String,
    state: ConnectionState,
    fail_open: bool,
    /// Set by connection observers in tests.
    pub application_name: Option<String>,
}

impl MockConnection {
    fn journal(&self) -> &Journal {
        &self.journal
    }

    fn record(&self, command: &CommandDefinition) {
        self.journal().statements.lock().push(command.clone());
    }
}

pub fn fruit_rows() -> Vec<Row> {
    let columns = vec!["Id".to_string(), "Name".to_string()];
    vec![
        Row::new(columns.clone(), vec![Value::BigInt(1), Value::Text("apple".into())]),
        Row::new(columns, vec![Value::BigInt(2), Value::Text("pear".into())]),
    ]
}

impl DbConnection for MockConnection {
    fn connection_string(&self) -> &str {
        &self.connection_string
    }

    fn database(&self) -> &str {
        &self.database
    }

    fn data_source(&self) -> &str {
        "mock"
    }

    fn server_version(&self) -> &str {
        "0.0.1"
    }

    fn state(&self) -> ConnectionState {
        self.state
    }

    fn open(&mut self) -> Result<()> {
        self.journal().opened.fetch_add(1, Ordering::SeqCst);
        if self.fail_open {
            self.state = ConnectionState::Broken;
            return Err(Error::Connection(ConnectionError {
                kind: ConnectionErrorKind::Connect,
                message: "server unreachable".to_string(),
                source: None,
            }));
        }
        self.state = ConnectionState::Open;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.state = ConnectionState::Closed;
        Ok(())
    }

    fn dispose(&mut self) -> Result<()> {
        self.journal().disposed.fetch_add(1, Ordering::SeqCst);
        self.state = ConnectionState::Disposed;
        Ok(())
    }

    fn begin_transaction(&mut self, isolation: IsolationLevel) -> Result<TransactionHandle> {
        Ok(TransactionHandle::new(1, isolation))
    }

    fn commit(&mut self, _tx: TransactionHandle) -> Result<()> {
        Ok(())
    }

    fn rollback(&mut self, _tx: TransactionHandle) -> Result<()> {
        Ok(())
    }

    fn create_command(&self, sql: &str) -> Result<PreparedStatement> {
        Ok(PreparedStatement::new(1, sql))
    }

    fn change_database(&mut self, name: &str) -> Result<()> {
        self.database = name.to_string();
        Ok(())
    }
}

impl BlockingExecutor for MockConnection {
    fn execute(&self, command: &CommandDefinition) -> Result<u64> {
        self.record(command);
        Ok(1)
    }

    fn query(&self, command: &CommandDefinition) -> Result<Vec<Row>> {
        self.record(command);
        Ok(fruit_rows())
    }

    fn query_multiple(&self, command: &CommandDefinition) -> Result<GridReader> {
        self.record(command);
        Ok(GridReader::new(
            command.sql.clone(),
            vec![fruit_rows(), fruit_rows().split_off(1)],
        ))
    }
}

#[allow(clippy::manual_async_fn)] // Mock trait impls must match trait signatures
impl Executor for MockConnection {
    fn execute(
        &self,
        _cx: &Cx,
        command: &CommandDefinition,
    ) -> impl Future<Output = Outcome<u64, Error>> + Send {
        async move { BlockingExecutor::execute(self, command).into_outcome() }
    }

    fn query(
        &self,
        _cx: &Cx,
        command: &CommandDefinition,
    ) -> impl Future<Output = Outcome<Vec<Row>, Error>> + Send {
        async move { BlockingExecutor::query(self, command).into_outcome() }
    }

    fn query_multiple(
        &self,
        _cx: &Cx,
        command: &CommandDefinition,
    ) -> impl Future<Output = Outcome<GridReader, Error>> + Send {
        async move { BlockingExecutor::query_multiple(self, command).into_outcome() }
    }
}
