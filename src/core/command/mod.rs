pub mod context;
pub mod initialization;
pub mod runner;

use crate::error::Result;
use crate::execution::result::ExecutionResultTree;
use crate::messages::MessageProvider;

use self::context::CommandContext;

/// Well-known context keys shared by the engine and every command.
pub mod keys {
    /// Execution result the running command should enrich and complete.
    pub const EXECUTION_RESULT: &str = "execution-result";
    /// Session to the external resource a command operates on.
    pub const SESSION: &str = "session";
}

/// Smallest unit of work, bound from a [`CommandContext`] and executed
/// by the [`runner::CommandRunner`].
///
/// A command pulls its declared inputs from the context (see
/// [`initialization`]), does its work, and completes the execution
/// result injected under [`keys::EXECUTION_RESULT`]. Errors returned
/// here are caught by the runner and recorded as an `Error`-state
/// result; they never reach the runner's caller.
pub trait Command {
    fn name(&self) -> &'static str;

    fn execute(
        &mut self,
        context: &CommandContext,
        tree: &mut ExecutionResultTree,
        provider: &dyn MessageProvider,
    ) -> Result<()>;
}
