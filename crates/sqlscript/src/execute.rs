//! Key-resolving execution, async form.
//!
//! [`ScriptExecutor`] is implemented for everything that can both execute
//! SQL and resolve script keys, most notably [`ScriptConnection`]. Each
//! method resolves its [`ScriptCommand`] and forwards the result to the
//! [`Executor`] method of the same name, without wrapping errors.
//!
//! [`ScriptConnection`]: crate::ScriptConnection

use crate::command::ScriptCommand;
use crate::registry::ScriptResolver;
use asupersync::{Cx, Outcome};
use sqlscript_core::{
    BlockingExecutor, CommandDefinition, Error, Executor, FromRow, FromValue, GridReader, Params,
    Result, Row, RowReader,
};

/// Resolve eagerly so the returned future holds only the definition.
fn resolve<R: ScriptResolver + ?Sized>(
    resolver: &R,
    command: impl Into<ScriptCommand>,
) -> Result<CommandDefinition> {
    command.into().to_definition(resolver)
}

/// Execute script commands by key.
pub trait ScriptExecutor: Executor + ScriptResolver {
    fn execute_script(
        &self,
        cx: &Cx,
        command: impl Into<ScriptCommand>,
    ) -> impl Future<Output = Outcome<u64, Error>> + Send {
        let resolved = resolve(self, command);
        async move {
            match resolved {
                Ok(definition) => self.execute(cx, &definition).await,
                Err(e) => Outcome::Err(e),
            }
        }
    }

    fn execute_reader_script(
        &self,
        cx: &Cx,
        command: impl Into<ScriptCommand>,
    ) -> impl Future<Output = Outcome<RowReader, Error>> + Send {
        let resolved = resolve(self, command);
        async move {
            match resolved {
                Ok(definition) => self.execute_reader(cx, &definition).await,
                Err(e) => Outcome::Err(e),
            }
        }
    }

    fn execute_scalar_script<T: FromValue + Send>(
        &self,
        cx: &Cx,
        command: impl Into<ScriptCommand>,
    ) -> impl Future<Output = Outcome<Option<T>, Error>> + Send {
        let resolved = resolve(self, command);
        async move {
            match resolved {
                Ok(definition) => self.execute_scalar(cx, &definition).await,
                Err(e) => Outcome::Err(e),
            }
        }
    }

    fn query_script<T: FromRow + Send>(
        &self,
        cx: &Cx,
        command: impl Into<ScriptCommand>,
    ) -> impl Future<Output = Outcome<Vec<T>, Error>> + Send {
        let resolved = resolve(self, command);
        async move {
            match resolved {
                Ok(definition) => self.query_as(cx, &definition).await,
                Err(e) => Outcome::Err(e),
            }
        }
    }

    fn query_first_script<T: FromRow + Send>(
        &self,
        cx: &Cx,
        command: impl Into<ScriptCommand>,
    ) -> impl Future<Output = Outcome<T, Error>> + Send {
        let resolved = resolve(self, command);
        async move {
            match resolved {
                Ok(definition) => self.query_first(cx, &definition).await,
                Err(e) => Outcome::Err(e),
            }
        }
    }

    fn query_first_or_default_script<T: FromRow + Send>(
        &self,
        cx: &Cx,
        command: impl Into<ScriptCommand>,
    ) -> impl Future<Output = Outcome<Option<T>, Error>> + Send {
        let resolved = resolve(self, command);
        async move {
            match resolved {
                Ok(definition) => self.query_first_or_default(cx, &definition).await,
                Err(e) => Outcome::Err(e),
            }
        }
    }

    fn query_single_script<T: FromRow + Send>(
        &self,
        cx: &Cx,
        command: impl Into<ScriptCommand>,
    ) -> impl Future<Output = Outcome<T, Error>> + Send {
        let resolved = resolve(self, command);
        async move {
            match resolved {
                Ok(definition) => self.query_single(cx, &definition).await,
                Err(e) => Outcome::Err(e),
            }
        }
    }

    fn query_single_or_default_script<T: FromRow + Send>(
        &self,
        cx: &Cx,
        command: impl Into<ScriptCommand>,
    ) -> impl Future<Output = Outcome<Option<T>, Error>> + Send {
        let resolved = resolve(self, command);
        async move {
            match resolved {
                Ok(definition) => self.query_single_or_default(cx, &definition).await,
                Err(e) => Outcome::Err(e),
            }
        }
    }

    fn query_multiple_script(
        &self,
        cx: &Cx,
        command: impl Into<ScriptCommand>,
    ) -> impl Future<Output = Outcome<GridReader, Error>> + Send {
        let resolved = resolve(self, command);
        async move {
            match resolved {
                Ok(definition) => self.query_multiple(cx, &definition).await,
                Err(e) => Outcome::Err(e),
            }
        }
    }
}

impl<T: Executor + ScriptResolver + ?Sized> ScriptExecutor for T {}

/// An executor paired with an explicit script source.
///
/// Use it when the executor is not itself script-bound, or to resolve
/// against a different registry than the one a connection carries.
#[derive(Debug)]
pub struct Scripted<'a, E: ?Sized, R: ?Sized> {
    executor: &'a E,
    scripts: &'a R,
}

impl<'a, E: ?Sized, R: ?Sized> Scripted<'a, E, R> {
    pub fn new(executor: &'a E, scripts: &'a R) -> Self {
        Self { executor, scripts }
    }

    pub fn executor(&self) -> &'a E {
        self.executor
    }

    pub fn scripts(&self) -> &'a R {
        self.scripts
    }
}

impl<E: ?Sized, R: ?Sized> Clone for Scripted<'_, E, R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E: ?Sized, R: ?Sized> Copy for Scripted<'_, E, R> {}

impl<E: ?Sized, R: ScriptResolver + ?Sized> ScriptResolver for Scripted<'_, E, R> {
    fn script_sql(&self, key: &str, params: &Params) -> Result<String> {
        self.scripts.script_sql(key, params)
    }
}

impl<E, R> Executor for Scripted<'_, E, R>
where
    E: Executor + ?Sized,
    R: Sync + ?Sized,
{
    fn execute(
        &self,
        cx: &Cx,
        command: &CommandDefinition,
    ) -> impl Future<Output = Outcome<u64, Error>> + Send {
        self.executor.execute(cx, command)
    }

    fn query(
        &self,
        cx: &Cx,
        command: &CommandDefinition,
    ) -> impl Future<Output = Outcome<Vec<Row>, Error>> + Send {
        self.executor.query(cx, command)
    }

    fn query_multiple(
        &self,
        cx: &Cx,
        command: &CommandDefinition,
    ) -> impl Future<Output = Outcome<GridReader, Error>> + Send {
        self.executor.query_multiple(cx, command)
    }
}

impl<E: BlockingExecutor + ?Sized, R: ?Sized> BlockingExecutor for Scripted<'_, E, R> {
    fn execute(&self, command: &CommandDefinition) -> Result<u64> {
        self.executor.execute(command)
    }

    fn query(&self, command: &CommandDefinition) -> Result<Vec<Row>> {
        self.executor.query(command)
    }

    fn query_multiple(&self, command: &CommandDefinition) -> Result<GridReader> {
        self.executor.query_multiple(command)
    }
}
