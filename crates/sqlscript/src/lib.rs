//! SQLScript Rust - keyed SQL scripts bound to database connections.
//!
//! SQL lives in `.sql` files (or embedded resources) instead of string
//! literals scattered through the code. Scripts are loaded once into a
//! [`ScriptRegistry`], looked up by key, optionally templated with
//! `[<TagName>]` placeholders, and executed through connections that carry
//! the registry with them.
//!
//! - [`ScriptRegistry`] and [`ScriptLoader`] for loading and looking up scripts
//! - [`TagTemplate`] for tag substitution in script text
//! - [`ScriptConnectionFactory`] and [`ScriptConnection`] for script-bound connections
//! - [`ScriptExecutor`] (and [`blocking::BlockingScriptExecutor`]) for executing by key
//! - [`SqlBuilder`] for batched statements with generated parameters
//!
//! # Quick Start
//!
//! ```ignore
//! use sqlscript::prelude::*;
//! use std::sync::Arc;
//!
//! static SCRIPTS: EmbeddedResources = sqlscript::embedded_resources!("app";
//!     "app.sql.Users.sql" => "../sql/Users.sql",
//! );
//!
//! async fn list_users(cx: &Cx, driver: MyDriver) -> Outcome<Vec<(i64, String)>, Error> {
//!     let scripts = ScriptRegistry::new();
//!     if let Err(e) = scripts.add().from_container(&SCRIPTS, "app.sql") {
//!         return Outcome::Err(e);
//!     }
//!
//!     let factory = ScriptConnectionFactory::new(driver, Arc::new(scripts))
//!         .with_connection_string("server=localhost;database=app");
//!
//!     factory
//!         .run_async(cx, async |conn| {
//!             conn.query_script(cx, ("Users.sql", params! { "Schema" => "dbo" }))
//!                 .await
//!         })
//!         .await
//! }
//! ```

pub use asupersync::{Cx, Outcome};

pub mod blocking;
pub mod builder;
pub mod command;
pub mod connection;
pub mod execute;
pub mod factory;
pub mod loader;
pub mod registry;
pub mod template;

pub use builder::{SqlBuilder, debug_sql};
pub use command::ScriptCommand;
pub use connection::ScriptConnection;
pub use execute::{ScriptExecutor, Scripted};
pub use factory::{ConnectionCreated, ConnectionObserver, ScriptConnectionFactory};
pub use loader::{EmbeddedResources, KeyStyle, ResourceContainer, ScriptLoader, TextEncoding};
pub use registry::{KeyComparer, ScriptRegistry, ScriptResolver};
pub use template::{MissingTag, TagTemplate, TagValues};

pub use sqlscript_core::{
    BlockingExecutor, ColumnInfo, CommandDefinition, CommandFlags, CommandKind, ConnectionState,
    DbConnection, Driver, Error, Executor, FromRow, FromValue, GridReader, IsolationLevel,
    Params, PreparedStatement, Result, Row, RowReader, ToParams, TransactionHandle, Value,
    params,
};

/// Error types, for matching on specific failures.
pub mod error {
    pub use sqlscript_core::error::*;
}

pub use sqlscript_macros::ToParams;

/// Everything needed to load scripts and execute them asynchronously.
///
/// The blocking execution trait is not included; import
/// [`blocking::BlockingScriptExecutor`] explicitly where it is wanted.
///
/// ```ignore
/// use sqlscript::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        CommandFlags, CommandKind, Cx, DbConnection, Driver, EmbeddedResources, Error, Executor,
        FromRow, FromValue, KeyComparer, MissingTag, Outcome, Params, Result, Row, ScriptCommand,
        ScriptConnection, ScriptConnectionFactory, ScriptExecutor, ScriptRegistry,
        ScriptResolver, SqlBuilder, TagTemplate, ToParams, Value, params,
    };
}
