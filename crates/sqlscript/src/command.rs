//! Key-based command descriptors.

use crate::registry::ScriptResolver;
use sqlscript_core::{
    CommandDefinition, CommandFlags, CommandKind, Params, Result, ToParams, TransactionHandle,
};
use std::time::Duration;

/// A command identified by script key rather than SQL text.
///
/// [`to_definition`](ScriptCommand::to_definition) resolves the key and
/// produces the [`CommandDefinition`] the execution helper runs. The
/// parameters serve both as tag values during resolution and as statement
/// parameters afterwards.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScriptCommand {
    pub key: String,
    pub params: Params,
    pub transaction: Option<TransactionHandle>,
    pub timeout: Option<Duration>,
    pub kind: CommandKind,
    pub flags: CommandFlags,
}

impl ScriptCommand {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ..Self::default()
        }
    }

    pub fn params(mut self, params: impl ToParams) -> Self {
        self.params = params.to_params();
        self
    }

    pub fn transaction(mut self, tx: TransactionHandle) -> Self {
        self.transaction = Some(tx);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn kind(mut self, kind: CommandKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn flags(mut self, flags: CommandFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Resolve the key and copy every other field into an executable command.
    pub fn to_definition<R: ScriptResolver + ?Sized>(&self, resolver: &R) -> Result<CommandDefinition> {
        let sql = resolver.script_sql(&self.key, &self.params)?;
        Ok(CommandDefinition {
            sql,
            params: self.params.clone(),
            transaction: self.transaction,
            timeout: self.timeout,
            kind: self.kind,
            flags: self.flags,
        })
    }
}

impl From<&str> for ScriptCommand {
    fn from(key: &str) -> Self {
        ScriptCommand::new(key)
    }
}

impl From<String> for ScriptCommand {
    fn from(key: String) -> Self {
        ScriptCommand::new(key)
    }
}

impl From<&ScriptCommand> for ScriptCommand {
    fn from(command: &ScriptCommand) -> Self {
        command.clone()
    }
}

/// `(key, params)` pairs, for call sites that need nothing else.
impl<P: ToParams> From<(&str, P)> for ScriptCommand {
    fn from((key, params): (&str, P)) -> Self {
        ScriptCommand::new(key).params(params)
    }
}
