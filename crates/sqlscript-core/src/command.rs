//! Fully resolved executable commands.

use crate::connection::TransactionHandle;
use crate::params::{Params, ToParams};
use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How the command text is interpreted by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CommandKind {
    /// Plain SQL text.
    #[default]
    Text,
    /// The text names a stored procedure.
    StoredProcedure,
}

bitflags! {
    /// Execution hints forwarded to the execution helper.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct CommandFlags: u32 {
        /// Materialize the whole result before returning.
        const BUFFERED = 1;
        /// The command may be pipelined with others on the same connection.
        const PIPELINED = 1 << 1;
        /// Do not cache the statement plan or mapping.
        const NO_CACHE = 1 << 2;
    }
}

impl Default for CommandFlags {
    fn default() -> Self {
        CommandFlags::BUFFERED
    }
}

/// A command ready for execution: resolved SQL text plus everything the
/// execution helper needs to run it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CommandDefinition {
    pub sql: String,
    pub params: Params,
    pub transaction: Option<TransactionHandle>,
    pub timeout: Option<Duration>,
    pub kind: CommandKind,
    pub flags: CommandFlags,
}

impl CommandDefinition {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
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

    pub fn is_buffered(&self) -> bool {
        self.flags.contains(CommandFlags::BUFFERED)
    }
}

impl From<&str> for CommandDefinition {
    fn from(sql: &str) -> Self {
        CommandDefinition::new(sql)
    }
}

impl From<String> for CommandDefinition {
    fn from(sql: String) -> Self {
        CommandDefinition::new(sql)
    }
}
