//! Operation executing a process model step by step.

use std::any::Any;

use crate::command::context::{CommandContext, ContextValue};
use crate::command::runner::CommandRunner;
use crate::error::{Error, Result};
use crate::execution::result::{ExecutionResultTree, ResultHandle, MSG_MESSAGE};
use crate::messages::MessageProvider;
use crate::operation::{self, Operation};
use crate::process::command::{
    AssertOutputContainsCommand, ProcessExecutionCommand, ARGUMENTS_KEY, EXECUTABLE_KEY,
    EXPECTED_KEY, TIMEOUT_KEY, WORKING_DIRECTORY_KEY,
};
use crate::process::model::{ProcessModel, ProcessStep};
use crate::process::session::ProcessSession;
use crate::session::Session;

/// Default operation of the process-execution backend.
///
/// Translates a [`ProcessModel`] into one command invocation per step,
/// consulting the continuation policy before each. Step failures never
/// abort sibling steps unless the policy says otherwise; the operation
/// result aggregates the step results when the loop ends.
#[derive(Default)]
pub struct DefaultOperation {
    runner: CommandRunner,
}

impl DefaultOperation {
    pub fn new() -> Self {
        Self::default()
    }

    fn process_model(
        &mut self,
        model: &ProcessModel,
        session: &ProcessSession,
        tree: &mut ExecutionResultTree,
        result: ResultHandle,
        provider: &dyn MessageProvider,
    ) -> Result<()> {
        for step in &model.steps {
            if !tree.policy().continue_execution() {
                let message = provider.get("do.continuation_enforced");
                tree.add_message(result, MSG_MESSAGE, &message);
                return Ok(());
            }

            match step {
                ProcessStep::Run {
                    executable,
                    arguments,
                    timeout_ms,
                } => {
                    let description = provider.get_with_args("do.run_info", &[executable]);
                    let mut context = self.step_context(
                        session, executable, arguments, *timeout_ms,
                    );
                    let mut command = ProcessExecutionCommand::default();
                    self.runner
                        .run(&mut command, tree, &description, &mut context, provider)?;
                }
                ProcessStep::AssertStdoutContains {
                    executable,
                    arguments,
                    expected,
                    timeout_ms,
                } => {
                    let description =
                        provider.get_with_args("do.assert_info", &[executable, expected]);
                    let mut context = self.step_context(
                        session, executable, arguments, *timeout_ms,
                    );
                    context.put(EXPECTED_KEY, expected.as_str());
                    let mut command = AssertOutputContainsCommand::default();
                    self.runner
                        .run(&mut command, tree, &description, &mut context, provider)?;
                }
            }
        }

        Ok(())
    }

    fn step_context(
        &self,
        session: &ProcessSession,
        executable: &str,
        arguments: &[String],
        timeout_ms: Option<u64>,
    ) -> CommandContext {
        let mut context = self.runner.create_context();
        context.put(EXECUTABLE_KEY, executable);
        context.put(ARGUMENTS_KEY, arguments.to_vec());
        match timeout_ms {
            Some(ms) => context.put(TIMEOUT_KEY, ms as i64),
            None => context.put(TIMEOUT_KEY, ContextValue::Null),
        }
        match session.working_dir() {
            Some(dir) => context.put(WORKING_DIRECTORY_KEY, dir.to_path_buf()),
            None => context.put(WORKING_DIRECTORY_KEY, ContextValue::Null),
        }
        context
    }
}

impl Operation for DefaultOperation {
    fn name(&self) -> &'static str {
        "process-default-operation"
    }

    fn execute(
        &mut self,
        content: &dyn Any,
        session: &mut dyn Session,
        tree: &mut ExecutionResultTree,
        result: ResultHandle,
        provider: &dyn MessageProvider,
    ) -> Result<()> {
        let model = operation::require_content::<ProcessModel>(content)?;
        let session = operation::require_session::<ProcessSession>(session)?;

        self.runner.set_execution_result(result);

        if let Err(error) = self.process_model(model, session, tree, result, provider) {
            match error {
                // interruption races the per-step policy check; record
                // the skip the same way and aggregate what did run
                Error::InterruptedExecution(_) => {
                    let message = provider.get("do.continuation_enforced");
                    tree.add_message(result, MSG_MESSAGE, &message);
                }
                error => {
                    let rendered = error.to_string();
                    let wrapped = Error::plugin_execution_failed_with_source(
                        "operation aborted while processing steps",
                        error,
                    );
                    tree.complete_as_error(result, provider, "do.error", &[&rendered], &wrapped);
                    return Ok(());
                }
            }
        }

        tree.complete_as_computed(result, provider, "do.completed", &[], "do.failed", &[]);
        Ok(())
    }
}
