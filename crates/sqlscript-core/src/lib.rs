//! Core types and traits for SQLScript Rust.
//!
//! This crate provides the foundations the script layer is built on:
//!
//! - `Value`, `Row` and `Params` for data crossing the driver boundary
//! - `Driver` and `DbConnection` traits for the underlying database connection
//! - `Executor` and `BlockingExecutor` traits for the SQL execution helper
//! - `CommandDefinition` for fully resolved executable commands
//! - `Outcome` and `Cx` re-exported from asupersync for cancel-correct async

// Re-export asupersync primitives for structured concurrency
pub use asupersync::{Cx, Outcome};

pub mod command;
pub mod connection;
pub mod error;
pub mod executor;
pub mod params;
pub mod row;
pub mod value;

pub use command::{CommandDefinition, CommandFlags, CommandKind};
pub use connection::{
    ConnectionState, DbConnection, Driver, IsolationLevel, PreparedStatement, TransactionHandle,
};
pub use error::{
    ArgumentError, ConnectionError, ConnectionErrorKind, Error, IntoOutcome, QueryError,
    QueryErrorKind, ResourceError, ResourceErrorKind, Result, ScriptError, TransactionError,
    TransactionErrorKind, TypeError,
};
pub use executor::{BlockingExecutor, Executor, GridReader, RowReader};
pub use params::{Params, ToParams, same_name};
pub use row::{ColumnInfo, FromRow, FromValue, Row};
pub use value::Value;
