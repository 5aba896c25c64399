//! Key-resolving execution, synchronous form.
//!
//! Kept out of the prelude: a connection implementing both [`Executor`] and
//! [`BlockingExecutor`] would otherwise see two methods of each name.
//!
//! [`Executor`]: sqlscript_core::Executor

use crate::command::ScriptCommand;
use crate::registry::ScriptResolver;
use sqlscript_core::{BlockingExecutor, FromRow, FromValue, GridReader, Result, RowReader};

/// Execute script commands by key without a runtime.
pub trait BlockingScriptExecutor: BlockingExecutor + ScriptResolver {
    fn execute_script(&self, command: impl Into<ScriptCommand>) -> Result<u64> {
        let definition = command.into().to_definition(self)?;
        self.execute(&definition)
    }

    fn execute_reader_script(&self, command: impl Into<ScriptCommand>) -> Result<RowReader> {
        let definition = command.into().to_definition(self)?;
        self.execute_reader(&definition)
    }

    fn execute_scalar_script<T: FromValue>(
        &self,
        command: impl Into<ScriptCommand>,
    ) -> Result<Option<T>> {
        let definition = command.into().to_definition(self)?;
        self.execute_scalar(&definition)
    }

    fn query_script<T: FromRow>(&self, command: impl Into<ScriptCommand>) -> Result<Vec<T>> {
        let definition = command.into().to_definition(self)?;
        self.query_as(&definition)
    }

    fn query_first_script<T: FromRow>(&self, command: impl Into<ScriptCommand>) -> Result<T> {
        let definition = command.into().to_definition(self)?;
        self.query_first(&definition)
    }

    fn query_first_or_default_script<T: FromRow>(
        &self,
        command: impl Into<ScriptCommand>,
    ) -> Result<Option<T>> {
        let definition = command.into().to_definition(self)?;
        self.query_first_or_default(&definition)
    }

    fn query_single_script<T: FromRow>(&self, command: impl Into<ScriptCommand>) -> Result<T> {
        let definition = command.into().to_definition(self)?;
        self.query_single(&definition)
    }

    fn query_single_or_default_script<T: FromRow>(
        &self,
        command: impl Into<ScriptCommand>,
    ) -> Result<Option<T>> {
        let definition = command.into().to_definition(self)?;
        self.query_single_or_default(&definition)
    }

    fn query_multiple_script(&self, command: impl Into<ScriptCommand>) -> Result<GridReader> {
        let definition = command.into().to_definition(self)?;
        self.query_multiple(&definition)
    }
}

impl<T: BlockingExecutor + ScriptResolver + ?Sized> BlockingScriptExecutor for T {}
