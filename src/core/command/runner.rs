//! Generic command execution with uniform error capture.

use crate::command::context::CommandContext;
use crate::command::{keys, Command};
use crate::error::{Error, Result};
use crate::execution::result::{ExecutionResultTree, ResultHandle};
use crate::messages::MessageProvider;
use crate::utils::validation;

/// Executes commands against a context, attaching one execution result
/// per run.
///
/// The runner owns the command error contract: whatever a command
/// returns, the caller of [`CommandRunner::run`] only ever observes the
/// execution result. Command errors are recorded as `Error`-state
/// results with the rendered error chain and are never propagated.
#[derive(Default)]
pub struct CommandRunner {
    execution_result: Option<ResultHandle>,
    last_succeeded: bool,
}

impl CommandRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a fresh context for one command invocation.
    pub fn create_context(&self) -> CommandContext {
        CommandContext::new()
    }

    /// Register the result new runs create their children under.
    pub fn set_execution_result(&mut self, result: ResultHandle) {
        self.execution_result = Some(result);
    }

    pub fn execution_result(&self) -> Option<ResultHandle> {
        self.execution_result
    }

    /// Whether the most recent run completed with `Success`. False
    /// before the first run.
    pub fn last_execution_succeeded(&self) -> bool {
        self.last_succeeded
    }

    /// Run `command` in a new child result of the registered root (the
    /// tree root when none is registered).
    ///
    /// The child is injected into `context` under
    /// [`keys::EXECUTION_RESULT`] so the command can enrich and
    /// complete it. Fails only when the continuation policy refuses the
    /// child; command errors are captured in the result.
    pub fn run(
        &mut self,
        command: &mut dyn Command,
        tree: &mut ExecutionResultTree,
        description: &str,
        context: &mut CommandContext,
        provider: &dyn MessageProvider,
    ) -> Result<ResultHandle> {
        let description =
            validation::require_non_empty(description, "description", "description is undefined")?;
        let parent = self.execution_result.unwrap_or_else(|| tree.root());
        let result = tree.add_child(parent, description)?;

        self.execute_against(command, tree, result, context, provider);
        Ok(result)
    }

    /// Run `command` against the given result in isolation, never
    /// touching the registered root.
    pub fn run_with_result(
        &mut self,
        command: &mut dyn Command,
        tree: &mut ExecutionResultTree,
        result: ResultHandle,
        context: &mut CommandContext,
        provider: &dyn MessageProvider,
    ) -> ResultHandle {
        self.execute_against(command, tree, result, context, provider);
        result
    }

    fn execute_against(
        &mut self,
        command: &mut dyn Command,
        tree: &mut ExecutionResultTree,
        result: ResultHandle,
        context: &mut CommandContext,
        provider: &dyn MessageProvider,
    ) {
        context.put(keys::EXECUTION_RESULT, result);

        match command.execute(context, tree, provider) {
            Ok(()) => {
                // a command that never completed its result succeeded
                if tree.is_executing(result) {
                    tree.complete_as_successful(result, provider, "cr.completed", &[]);
                }
            }
            Err(error) => self.record_error(command, tree, result, provider, &error),
        }

        self.last_succeeded = tree.is_success(result);
    }

    fn record_error(
        &self,
        command: &mut dyn Command,
        tree: &mut ExecutionResultTree,
        result: ResultHandle,
        provider: &dyn MessageProvider,
        error: &Error,
    ) {
        log_status!(
            "runner",
            "Command [{}] failed with error: {}",
            command.name(),
            error
        );

        if tree.is_executing(result) {
            let rendered = error.to_string();
            tree.complete_as_error(result, provider, "cr.error", &[&rendered], error);
            return;
        }

        // result already terminal: keep the state, attach the trace
        tree.add_message(
            result,
            crate::execution::result::MSG_STACKTRACE,
            &crate::utils::trace::render_chain(error),
        );
    }
}
