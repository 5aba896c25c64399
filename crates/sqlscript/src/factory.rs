//! Creating script-bound connections.
//!
//! [`ScriptConnectionFactory`] owns a driver, a connection string and a
//! shared registry. It hands out [`ScriptConnection`]s, either unopened
//! ([`connect`](ScriptConnectionFactory::connect)) or opened
//! ([`open`](ScriptConnectionFactory::open),
//! [`open_async`](ScriptConnectionFactory::open_async)), and runs scoped
//! actions that release their connection on every exit path.

use crate::connection::ScriptConnection;
use crate::registry::ScriptRegistry;
use asupersync::{Cx, Outcome};
use sqlscript_core::{DbConnection, Driver, Error, IntoOutcome, Result};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

/// Passed to observers when the factory creates a connection.
///
/// The connection has been instantiated by the driver but not opened.
pub struct ConnectionCreated<'a, C> {
    pub connection: &'a mut C,
    pub connection_string: &'a str,
}

/// Callback fired for every connection the factory creates.
///
/// Errors and panics raised by observers are logged and discarded; they never
/// prevent the connection from being returned.
pub trait ConnectionObserver<C>: Send + Sync {
    fn on_created(&self, event: &mut ConnectionCreated<'_, C>) -> Result<()>;
}

impl<C, F> ConnectionObserver<C> for F
where
    F: Fn(&mut ConnectionCreated<'_, C>) -> Result<()> + Send + Sync,
{
    fn on_created(&self, event: &mut ConnectionCreated<'_, C>) -> Result<()> {
        self(event)
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}

/// Dispose a connection whose own error is about to be reported.
fn release_quietly<C: DbConnection>(connection: &mut ScriptConnection<C>) {
    if let Err(e) = connection.dispose() {
        tracing::warn!(error = %e, "failed to dispose connection after error");
    }
}

/// Factory of [`ScriptConnection`]s for one driver and connection string.
pub struct ScriptConnectionFactory<D: Driver> {
    driver: D,
    scripts: Arc<ScriptRegistry>,
    connection_string: String,
    observers: Vec<Box<dyn ConnectionObserver<D::Connection>>>,
}

impl<D: Driver> ScriptConnectionFactory<D> {
    pub fn new(driver: D, scripts: Arc<ScriptRegistry>) -> Self {
        Self {
            driver,
            scripts,
            connection_string: String::new(),
            observers: Vec::new(),
        }
    }

    /// Builder form of [`set_connection_string`](Self::set_connection_string).
    pub fn with_connection_string(mut self, connection_string: impl Into<String>) -> Self {
        self.connection_string = connection_string.into();
        self
    }

    /// Connection string passed, unmodified, to the driver.
    pub fn set_connection_string(&mut self, connection_string: impl Into<String>) {
        self.connection_string = connection_string.into();
    }

    pub fn connection_string(&self) -> &str {
        &self.connection_string
    }

    pub fn scripts(&self) -> &Arc<ScriptRegistry> {
        &self.scripts
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Register an observer fired for every created connection, in
    /// registration order.
    pub fn add_observer(
        &mut self,
        observer: impl ConnectionObserver<D::Connection> + 'static,
    ) -> &mut Self {
        self.observers.push(Box::new(observer));
        self
    }

    /// Register a closure as an observer.
    pub fn on_connection_created<F>(&mut self, observer: F) -> &mut Self
    where
        F: Fn(&mut ConnectionCreated<'_, D::Connection>) -> Result<()> + Send + Sync + 'static,
    {
        self.add_observer(observer)
    }

    fn notify(&self, connection: &mut D::Connection) {
        for observer in &self.observers {
            let mut event = ConnectionCreated {
                connection: &mut *connection,
                connection_string: &self.connection_string,
            };
            match catch_unwind(AssertUnwindSafe(|| observer.on_created(&mut event))) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    tracing::warn!(error = %e, "connection observer failed; ignoring");
                }
                Err(payload) => {
                    tracing::warn!(
                        panic = panic_message(payload.as_ref()),
                        "connection observer panicked; ignoring"
                    );
                }
            }
        }
    }

    /// Create an unopened connection.
    pub fn connect(&self) -> Result<ScriptConnection<D::Connection>> {
        let mut connection = self.driver.create_connection(&self.connection_string)?;
        tracing::debug!(driver = self.driver.name(), "created connection");
        self.notify(&mut connection);
        Ok(ScriptConnection::new(Arc::clone(&self.scripts), connection))
    }

    /// Create and open a connection.
    ///
    /// If opening fails the connection is disposed and the open error is
    /// returned.
    #[tracing::instrument(level = "debug", skip(self), fields(driver = self.driver.name()))]
    pub fn open(&self) -> Result<ScriptConnection<D::Connection>> {
        let mut connection = self.connect()?;
        match connection.open() {
            Ok(()) => Ok(connection),
            Err(e) => {
                release_quietly(&mut connection);
                Err(e)
            }
        }
    }

    /// Create and open a connection asynchronously.
    ///
    /// Cancellation and open failures dispose the connection before they are
    /// reported.
    #[tracing::instrument(level = "debug", skip(self, cx), fields(driver = self.driver.name()))]
    pub async fn open_async(&self, cx: &Cx) -> Outcome<ScriptConnection<D::Connection>, Error> {
        if let Some(reason) = cx.cancel_reason() {
            return Outcome::Cancelled(reason);
        }
        let mut connection = match self.connect().into_outcome() {
            Outcome::Ok(connection) => connection,
            other => return other,
        };
        match connection.open_async(cx).await {
            Outcome::Ok(()) => Outcome::Ok(connection),
            Outcome::Err(e) => {
                release_quietly(&mut connection);
                Outcome::Err(e)
            }
            Outcome::Cancelled(r) => {
                release_quietly(&mut connection);
                Outcome::Cancelled(r)
            }
            Outcome::Panicked(p) => {
                release_quietly(&mut connection);
                Outcome::Panicked(p)
            }
        }
    }

    /// Run `action` on a freshly opened connection, then dispose it.
    ///
    /// A dispose failure is returned only when the action succeeded; after a
    /// failed action the action's error wins. A panicking action still
    /// releases the connection while unwinding.
    pub fn run<T>(
        &self,
        action: impl FnOnce(&mut ScriptConnection<D::Connection>) -> Result<T>,
    ) -> Result<T> {
        let mut connection = self.open()?;
        match action(&mut connection) {
            Ok(value) => {
                connection.dispose()?;
                Ok(value)
            }
            Err(e) => {
                release_quietly(&mut connection);
                Err(e)
            }
        }
    }

    /// Asynchronous form of [`run`](Self::run).
    pub async fn run_async<T, F>(&self, cx: &Cx, action: F) -> Outcome<T, Error>
    where
        F: AsyncFnOnce(&mut ScriptConnection<D::Connection>) -> Outcome<T, Error>,
    {
        let mut connection = match self.open_async(cx).await {
            Outcome::Ok(connection) => connection,
            Outcome::Err(e) => return Outcome::Err(e),
            Outcome::Cancelled(r) => return Outcome::Cancelled(r),
            Outcome::Panicked(p) => return Outcome::Panicked(p),
        };
        match action(&mut connection).await {
            Outcome::Ok(value) => match connection.dispose() {
                Ok(()) => Outcome::Ok(value),
                Err(e) => Outcome::Err(e),
            },
            Outcome::Err(e) => {
                release_quietly(&mut connection);
                Outcome::Err(e)
            }
            Outcome::Cancelled(r) => {
                release_quietly(&mut connection);
                Outcome::Cancelled(r)
            }
            Outcome::Panicked(p) => {
                release_quietly(&mut connection);
                Outcome::Panicked(p)
            }
        }
    }
}

impl<D: Driver + std::fmt::Debug> std::fmt::Debug for ScriptConnectionFactory<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptConnectionFactory")
            .field("driver", &self.driver)
            .field("scripts", &self.scripts.len())
            .field("observers", &self.observers.len())
            .finish_non_exhaustive()
    }
}
