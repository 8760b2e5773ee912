//! Commands spawning local processes with captured output and timeout.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command as ProcessCommand, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use crate::command::context::CommandContext;
use crate::command::initialization::{self, bind, Bindable, Binding, ValidationPolicy};
use crate::command::{keys, Command};
use crate::error::{Error, Result};
use crate::execution::result::{ExecutionResultTree, ResultHandle};
use crate::messages::MessageProvider;

/// Context key: name of the executable to run.
pub const EXECUTABLE_KEY: &str = "executable";
/// Context key: arguments passed to the executable.
pub const ARGUMENTS_KEY: &str = "arguments";
/// Context key: timeout in milliseconds before the process is killed.
/// Null or 0 selects [`DEFAULT_TIMEOUT_MS`].
pub const TIMEOUT_KEY: &str = "timeout";
/// Context key: directory the process runs in; null runs in the
/// current directory.
pub const WORKING_DIRECTORY_KEY: &str = "working-directory";
/// Context key: value the process output is asserted to contain.
pub const EXPECTED_KEY: &str = "expected";

/// Message header for captured standard output.
pub const MSG_STANDARD_OUT: &str = "Standard Out";
/// Message header for captured standard error.
pub const MSG_STANDARD_ERROR: &str = "Standard Error";

/// Default timeout for external processes.
pub const DEFAULT_TIMEOUT_MS: u64 = 5000;

const POLL_INTERVAL_MS: u64 = 25;

/// Captured outcome of one process invocation.
pub struct ProcessOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
    pub success: bool,
    pub timed_out: bool,
}

/// Spawn a process with captured output, killing it when `timeout`
/// expires.
///
/// Output is drained on reader threads so a chatty process can not
/// stall on a full pipe while the timeout clock runs.
pub fn run_process(
    executable: &str,
    arguments: &[String],
    working_dir: Option<&Path>,
    timeout: Duration,
) -> Result<ProcessOutput> {
    let mut command = ProcessCommand::new(executable);
    command
        .args(arguments)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    if let Some(dir) = working_dir {
        command.current_dir(dir);
    }

    let mut child = command.spawn()?;
    let stdout_reader = spawn_reader(child.stdout.take());
    let stderr_reader = spawn_reader(child.stderr.take());

    let deadline = Instant::now() + timeout;
    let status = loop {
        if let Some(status) = child.try_wait()? {
            break Some(status);
        }
        if Instant::now() >= deadline {
            let _ = child.kill();
            let _ = child.wait();
            break None;
        }
        thread::sleep(Duration::from_millis(POLL_INTERVAL_MS));
    };

    match status {
        Some(status) => Ok(ProcessOutput {
            stdout: collect_output(stdout_reader),
            stderr: collect_output(stderr_reader),
            exit_code: status.code().unwrap_or(-1),
            success: status.success(),
            timed_out: false,
        }),
        // don't join the readers after a kill: a grandchild sharing the
        // pipes could keep them open indefinitely
        None => Ok(ProcessOutput {
            stdout: String::new(),
            stderr: String::new(),
            exit_code: -1,
            success: false,
            timed_out: true,
        }),
    }
}

fn spawn_reader<R>(source: Option<R>) -> Option<thread::JoinHandle<String>>
where
    R: Read + Send + 'static,
{
    source.map(|mut stream| {
        thread::spawn(move || {
            let mut buffer = String::new();
            let _ = stream.read_to_string(&mut buffer);
            buffer
        })
    })
}

fn collect_output(reader: Option<thread::JoinHandle<String>>) -> String {
    reader
        .and_then(|handle| handle.join().ok())
        .unwrap_or_default()
}

fn effective_timeout(timeout: Option<u64>) -> Duration {
    match timeout {
        Some(0) | None => Duration::from_millis(DEFAULT_TIMEOUT_MS),
        Some(ms) => Duration::from_millis(ms),
    }
}

fn timeout_description(timeout: Option<u64>, provider: &dyn MessageProvider) -> String {
    match timeout {
        Some(0) | None => {
            provider.get_with_args("pe.timeout_info", &[&DEFAULT_TIMEOUT_MS.to_string()])
        }
        Some(ms) => ms.to_string(),
    }
}

fn add_invocation_messages(
    tree: &mut ExecutionResultTree,
    result: ResultHandle,
    executable: &str,
    arguments: &[String],
    timeout: Option<u64>,
    provider: &dyn MessageProvider,
) {
    tree.add_message(result, "Executable", executable);
    tree.add_message(result, "Arguments", &arguments.join(","));
    tree.add_message(result, "Timeout", &timeout_description(timeout, provider));
}

fn add_output_messages(tree: &mut ExecutionResultTree, result: ResultHandle, output: &ProcessOutput) {
    if !output.stdout.trim_end().is_empty() {
        tree.add_message(result, MSG_STANDARD_OUT, output.stdout.trim_end());
    }
    if !output.stderr.trim_end().is_empty() {
        tree.add_message(result, MSG_STANDARD_ERROR, output.stderr.trim_end());
    }
}

/// Runs one external process and completes the bound result from its
/// exit value: `Success` for zero, `Failure` otherwise, `Error` when
/// the timeout kills the process.
#[derive(Default)]
pub struct ProcessExecutionCommand {
    executable: String,
    arguments: Vec<String>,
    timeout: Option<u64>,
    working_dir: Option<PathBuf>,
    execution_result: Option<ResultHandle>,
}

impl Bindable for ProcessExecutionCommand {
    fn bindings(&mut self) -> Vec<Binding<'_>> {
        let Self {
            executable,
            arguments,
            timeout,
            working_dir,
            execution_result,
        } = self;
        vec![
            Binding::required(EXECUTABLE_KEY, ValidationPolicy::NotEmpty, bind::text(executable)),
            Binding::required(ARGUMENTS_KEY, ValidationPolicy::NotNull, bind::list(arguments)),
            Binding::optional(TIMEOUT_KEY, bind::millis(timeout)),
            Binding::optional(WORKING_DIRECTORY_KEY, bind::optional_path(working_dir)),
            Binding::required(
                keys::EXECUTION_RESULT,
                ValidationPolicy::NotNull,
                bind::result(execution_result),
            ),
        ]
    }
}

impl Command for ProcessExecutionCommand {
    fn name(&self) -> &'static str {
        "process-execution-command"
    }

    fn execute(
        &mut self,
        context: &CommandContext,
        tree: &mut ExecutionResultTree,
        provider: &dyn MessageProvider,
    ) -> Result<()> {
        initialization::initialize(context, self)?;
        let result = self.execution_result.ok_or_else(|| {
            Error::CommandInitializationFailed("execution result was not bound".to_string())
        })?;

        add_invocation_messages(
            tree,
            result,
            &self.executable,
            &self.arguments,
            self.timeout,
            provider,
        );

        let output = run_process(
            &self.executable,
            &self.arguments,
            self.working_dir.as_deref(),
            effective_timeout(self.timeout),
        )?;
        add_output_messages(tree, result, &output);

        if output.timed_out {
            let timeout_ms = effective_timeout(self.timeout).as_millis().to_string();
            let error = Error::plugin_execution_failed(format!(
                "process [{}] exceeded the {} ms timeout",
                self.executable, timeout_ms
            ));
            tree.complete_as_error(
                result,
                provider,
                "pe.timeout_error",
                &[&self.executable, &timeout_ms],
                &error,
            );
            return Ok(());
        }

        if !output.success {
            let exit_code = output.exit_code.to_string();
            tree.complete_as_failure(result, provider, "pe.exitvalue_failed", &[&exit_code]);
            return Ok(());
        }

        tree.complete_as_successful(result, provider, "pe.completed", &[]);
        Ok(())
    }
}

/// Runs one external process and completes the bound result from its
/// standard output: `Failure` unless the output contains the expected
/// value and the exit value is zero.
#[derive(Default)]
pub struct AssertOutputContainsCommand {
    executable: String,
    arguments: Vec<String>,
    expected: String,
    timeout: Option<u64>,
    working_dir: Option<PathBuf>,
    execution_result: Option<ResultHandle>,
}

impl Bindable for AssertOutputContainsCommand {
    fn bindings(&mut self) -> Vec<Binding<'_>> {
        let Self {
            executable,
            arguments,
            expected,
            timeout,
            working_dir,
            execution_result,
        } = self;
        vec![
            Binding::required(EXECUTABLE_KEY, ValidationPolicy::NotEmpty, bind::text(executable)),
            Binding::required(ARGUMENTS_KEY, ValidationPolicy::NotNull, bind::list(arguments)),
            Binding::required(EXPECTED_KEY, ValidationPolicy::NotEmpty, bind::text(expected)),
            Binding::optional(TIMEOUT_KEY, bind::millis(timeout)),
            Binding::optional(WORKING_DIRECTORY_KEY, bind::optional_path(working_dir)),
            Binding::required(
                keys::EXECUTION_RESULT,
                ValidationPolicy::NotNull,
                bind::result(execution_result),
            ),
        ]
    }
}

impl Command for AssertOutputContainsCommand {
    fn name(&self) -> &'static str {
        "assert-output-contains-command"
    }

    fn execute(
        &mut self,
        context: &CommandContext,
        tree: &mut ExecutionResultTree,
        provider: &dyn MessageProvider,
    ) -> Result<()> {
        initialization::initialize(context, self)?;
        let result = self.execution_result.ok_or_else(|| {
            Error::CommandInitializationFailed("execution result was not bound".to_string())
        })?;

        add_invocation_messages(
            tree,
            result,
            &self.executable,
            &self.arguments,
            self.timeout,
            provider,
        );

        let output = run_process(
            &self.executable,
            &self.arguments,
            self.working_dir.as_deref(),
            effective_timeout(self.timeout),
        )?;
        add_output_messages(tree, result, &output);

        if output.timed_out {
            let timeout_ms = effective_timeout(self.timeout).as_millis().to_string();
            let error = Error::plugin_execution_failed(format!(
                "process [{}] exceeded the {} ms timeout",
                self.executable, timeout_ms
            ));
            tree.complete_as_error(
                result,
                provider,
                "pe.timeout_error",
                &[&self.executable, &timeout_ms],
                &error,
            );
            return Ok(());
        }

        if !output.success {
            let exit_code = output.exit_code.to_string();
            tree.complete_as_failure(result, provider, "pe.exitvalue_failed", &[&exit_code]);
            return Ok(());
        }

        if !output.stdout.contains(&self.expected) {
            tree.complete_as_failure(result, provider, "pe.assert_failed", &[&self.expected]);
            return Ok(());
        }

        tree.complete_as_successful(result, provider, "pe.completed", &[]);
        Ok(())
    }
}
