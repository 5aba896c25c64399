//! Error types for SQLScript operations.

use asupersync::Outcome;
use std::fmt;

/// The primary error type for all SQLScript operations.
///
/// Cancellation is reported through `Outcome::Cancelled`, never as an `Error`.
#[derive(Debug)]
pub enum Error {
    /// Connection-related errors reported by the driver (connect, open, dispose)
    Connection(ConnectionError),
    /// Query execution errors
    Query(QueryError),
    /// Type conversion errors
    Type(TypeError),
    /// Transaction errors
    Transaction(TransactionError),
    /// Script registry lookup errors
    Script(ScriptError),
    /// Resource container errors raised while loading scripts
    Resource(ResourceError),
    /// A required argument was missing or empty
    InvalidArgument(ArgumentError),
    /// I/O errors
    Io(std::io::Error),
    /// Serialization/deserialization errors
    Serde(String),
    /// Custom error with message
    Custom(String),
}

#[derive(Debug)]
pub struct ConnectionError {
    pub kind: ConnectionErrorKind,
    pub message: String,
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionErrorKind {
    /// Failed to establish connection
    Connect,
    /// Authentication failed
    Authentication,
    /// Connection lost during operation
    Disconnected,
    /// Connection refused
    Refused,
    /// Operation requires an open connection
    NotOpen,
    /// Releasing the connection failed
    Dispose,
}

#[derive(Debug)]
pub struct QueryError {
    pub kind: QueryErrorKind,
    pub sql: Option<String>,
    pub sqlstate: Option<String>,
    pub message: String,
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryErrorKind {
    /// Syntax error in SQL
    Syntax,
    /// Constraint violation (unique, foreign key, etc.)
    Constraint,
    /// Table or column not found
    NotFound,
    /// Result set did not have the expected number of rows
    RowCount,
    /// Deadlock detected
    Deadlock,
    /// Statement timeout
    Timeout,
    /// Other database error
    Database,
}

#[derive(Debug)]
pub struct TypeError {
    pub expected: &'static str,
    pub actual: String,
    pub column: Option<String>,
    pub rust_type: Option<&'static str>,
}

#[derive(Debug)]
pub struct TransactionError {
    pub kind: TransactionErrorKind,
    pub message: String,
}

#[derive(Debug, Clone, Copy)]
pub enum TransactionErrorKind {
    /// Already committed
    AlreadyCommitted,
    /// Already rolled back
    AlreadyRolledBack,
    /// Handle does not belong to this connection
    UnknownHandle,
    /// Nested transaction not supported
    NestedNotSupported,
}

/// A script key that is not present in the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptError {
    /// The key exactly as the caller supplied it
    pub key: String,
}

#[derive(Debug)]
pub struct ResourceError {
    pub kind: ResourceErrorKind,
    /// Full resource name inside the container
    pub resource: String,
    /// Name of the container that was being read
    pub container: String,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceErrorKind {
    /// A matched resource name could not be opened
    NotFound,
    /// Resource bytes were not valid text in the requested encoding
    Decode,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgumentError {
    /// Name of the offending parameter (e.g. `path`, `key`)
    pub name: &'static str,
    pub message: String,
}

impl Error {
    /// Build a `ScriptNotFound` error for `key`.
    pub fn script_not_found(key: impl Into<String>) -> Self {
        Error::Script(ScriptError { key: key.into() })
    }

    /// Build a `ResourceNotFound` error.
    pub fn resource_not_found(resource: impl Into<String>, container: impl Into<String>) -> Self {
        Error::Resource(ResourceError {
            kind: ResourceErrorKind::NotFound,
            resource: resource.into(),
            container: container.into(),
            message: None,
        })
    }

    /// Build an `InvalidArgument` error for a null or empty required input.
    pub fn invalid_argument(name: &'static str) -> Self {
        Error::InvalidArgument(ArgumentError {
            name,
            message: "value cannot be empty".to_string(),
        })
    }

    /// Is this a registry miss?
    pub fn is_script_not_found(&self) -> bool {
        matches!(self, Error::Script(_))
    }

    /// The missing script key, if this is a registry miss.
    pub fn script_key(&self) -> Option<&str> {
        match self {
            Error::Script(e) => Some(&e.key),
            _ => None,
        }
    }

    /// Is this a connection error that likely requires reconnection?
    pub fn is_connection_error(&self) -> bool {
        match self {
            Error::Connection(c) => matches!(
                c.kind,
                ConnectionErrorKind::Connect
                    | ConnectionErrorKind::Authentication
                    | ConnectionErrorKind::Disconnected
                    | ConnectionErrorKind::Refused
            ),
            Error::Io(_) => true,
            _ => false,
        }
    }

    /// Get SQLSTATE if available (e.g., "23505" for unique violation)
    pub fn sqlstate(&self) -> Option<&str> {
        match self {
            Error::Query(q) => q.sqlstate.as_deref(),
            _ => None,
        }
    }

    /// Get the SQL that caused this error, if available
    pub fn sql(&self) -> Option<&str> {
        match self {
            Error::Query(q) => q.sql.as_deref(),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Connection(e) => write!(f, "Connection error: {}", e.message),
            Error::Query(e) => {
                if let Some(sqlstate) = &e.sqlstate {
                    write!(f, "Query error (SQLSTATE {}): {}", sqlstate, e.message)
                } else {
                    write!(f, "Query error: {}", e.message)
                }
            }
            Error::Type(e) => {
                if let Some(col) = &e.column {
                    write!(
                        f,
                        "Type error in column '{}': expected {}, found {}",
                        col, e.expected, e.actual
                    )
                } else {
                    write!(f, "Type error: expected {}, found {}", e.expected, e.actual)
                }
            }
            Error::Transaction(e) => write!(f, "Transaction error: {}", e.message),
            Error::Script(e) => write!(f, "{}", e),
            Error::Resource(e) => write!(f, "{}", e),
            Error::InvalidArgument(e) => write!(f, "{}", e),
            Error::Io(e) => write!(f, "I/O error: {}", e),
            Error::Serde(msg) => write!(f, "Serialization error: {}", msg),
            Error::Custom(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Connection(e) => e
                .source
                .as_deref()
                .map(|err| err as &(dyn std::error::Error + 'static)),
            Error::Query(e) => e
                .source
                .as_deref()
                .map(|err| err as &(dyn std::error::Error + 'static)),
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl fmt::Display for ConnectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(sqlstate) = &self.sqlstate {
            write!(f, "{} (SQLSTATE {})", self.message, sqlstate)
        } else {
            write!(f, "{}", self.message)
        }
    }
}

impl fmt::Display for TypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(col) = &self.column {
            write!(
                f,
                "expected {} for column '{}', found {}",
                self.expected, col, self.actual
            )
        } else {
            write!(f, "expected {}, found {}", self.expected, self.actual)
        }
    }
}

impl fmt::Display for TransactionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl fmt::Display for ScriptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SQL script '{}' was not found", self.key)
    }
}

impl fmt::Display for ResourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ResourceErrorKind::NotFound => write!(
                f,
                "Resource '{}' was not found in container '{}'",
                self.resource, self.container
            )?,
            ResourceErrorKind::Decode => write!(
                f,
                "Resource '{}' in container '{}' is not valid text",
                self.resource, self.container
            )?,
        }
        if let Some(message) = &self.message {
            write!(f, ": {}", message)?;
        }
        Ok(())
    }
}

impl fmt::Display for ArgumentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid argument '{}': {}", self.name, self.message)
    }
}

impl std::error::Error for ScriptError {}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<ConnectionError> for Error {
    fn from(err: ConnectionError) -> Self {
        Error::Connection(err)
    }
}

impl From<QueryError> for Error {
    fn from(err: QueryError) -> Self {
        Error::Query(err)
    }
}

impl From<TypeError> for Error {
    fn from(err: TypeError) -> Self {
        Error::Type(err)
    }
}

impl From<TransactionError> for Error {
    fn from(err: TransactionError) -> Self {
        Error::Transaction(err)
    }
}

impl From<ScriptError> for Error {
    fn from(err: ScriptError) -> Self {
        Error::Script(err)
    }
}

impl From<ResourceError> for Error {
    fn from(err: ResourceError) -> Self {
        Error::Resource(err)
    }
}

impl From<ArgumentError> for Error {
    fn from(err: ArgumentError) -> Self {
        Error::InvalidArgument(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serde(err.to_string())
    }
}

/// Result type alias for SQLScript operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Lift a synchronous [`Result`] into an asupersync [`Outcome`].
pub trait IntoOutcome<T> {
    /// Convert `Ok`/`Err` into `Outcome::Ok`/`Outcome::Err`.
    fn into_outcome(self) -> Outcome<T, Error>;
}

impl<T> IntoOutcome<T> for Result<T> {
    fn into_outcome(self) -> Outcome<T, Error> {
        match self {
            Ok(value) => Outcome::Ok(value),
            Err(err) => Outcome::Err(err),
        }
    }
}
