//! Hierarchical execution result tree.
//!
//! One tree records the outcome of one operation: a root node for the
//! operation itself and one child per unit of work, recursively. Nodes
//! live in an arena owned by the tree and are addressed by handle, so
//! parent back-references and the shared continuation policy never form
//! ownership cycles.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::execution::continuation::ContinuationPolicy;
use crate::messages::MessageProvider;
use crate::utils::trace;

/// Message header for informational entries.
pub const MSG_MESSAGE: &str = "Message";
/// Message header for error descriptions.
pub const MSG_ERROR_MESSAGE: &str = "Error Message";
/// Message header for rendered error chains.
pub const MSG_STACKTRACE: &str = "Stack Trace";
/// Message header for the computed-state summary entry.
pub const MSG_COMPOSITE: &str = "Composite Execution Result";

/// State of one execution result node.
///
/// `Failure` is an expected, assertable negative outcome; `Error` is an
/// abnormal condition (an error was caught). Aggregation treats them
/// identically, reporting does not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionState {
    Executing,
    Success,
    Failure,
    Error,
}

/// One diagnostic entry on a result node. Order of entries is preserved
/// for reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub header: String,
    pub body: String,
}

/// Index-based handle to a node in an [`ExecutionResultTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResultHandle(usize);

impl ResultHandle {
    pub(crate) fn from_index(index: usize) -> Self {
        Self(index)
    }

    pub fn index(&self) -> usize {
        self.0
    }
}

struct ResultNode {
    correlation_id: Uuid,
    description: String,
    state: ExecutionState,
    messages: Vec<Message>,
    started_at: DateTime<Utc>,
    ended_at: Option<DateTime<Utc>>,
    parent: Option<ResultHandle>,
    children: Vec<ResultHandle>,
}

impl ResultNode {
    fn new(description: &str, parent: Option<ResultHandle>) -> Self {
        Self {
            correlation_id: Uuid::new_v4(),
            description: description.to_string(),
            state: ExecutionState::Executing,
            messages: Vec::new(),
            started_at: Utc::now(),
            ended_at: None,
            parent,
            children: Vec::new(),
        }
    }
}

/// Arena-backed tree of execution results sharing one continuation
/// policy.
///
/// The root is created in `Executing` state together with a fresh
/// policy; children are appended on demand and inherit the policy.
/// A node reaches a terminal state exactly once; completion calls on an
/// already terminal node are no-ops.
pub struct ExecutionResultTree {
    nodes: Vec<ResultNode>,
    policy: Arc<ContinuationPolicy>,
}

impl ExecutionResultTree {
    /// Create a tree with an executing root result and a fresh policy.
    pub fn new(description: &str) -> Self {
        Self {
            nodes: vec![ResultNode::new(description, None)],
            policy: Arc::new(ContinuationPolicy::new()),
        }
    }

    pub fn root(&self) -> ResultHandle {
        ResultHandle(0)
    }

    pub fn policy(&self) -> &Arc<ContinuationPolicy> {
        &self.policy
    }

    /// Request cooperative cancellation of the whole tree.
    pub fn set_cancelled(&self) {
        self.policy.set_cancelled();
    }

    /// Create, append and return a new executing child of `parent`.
    ///
    /// Enforces the continuation policy: once the policy refuses
    /// continuation no further children can be created and
    /// `Error::InterruptedExecution` is returned instead.
    pub fn add_child(&mut self, parent: ResultHandle, description: &str) -> Result<ResultHandle> {
        self.enforce_continuation_policy()?;

        let child = ResultHandle(self.nodes.len());
        self.nodes.push(ResultNode::new(description, Some(parent)));
        self.nodes[parent.0].children.push(child);

        Ok(child)
    }

    fn enforce_continuation_policy(&self) -> Result<()> {
        if self.policy.continue_execution() {
            return Ok(());
        }

        let message = if self.policy.is_cancelled() {
            "Execution is interrupted due to cancellation.".to_string()
        } else {
            match self.policy.failed_result() {
                Some(failed) => format!(
                    "Execution is interrupted due to failure in result [{}].",
                    self.nodes[failed.0].description
                ),
                None => "Execution is interrupted.".to_string(),
            }
        };

        Err(Error::InterruptedExecution(message))
    }

    /// Append one diagnostic entry, preserving message order.
    pub fn add_message(&mut self, handle: ResultHandle, header: &str, body: &str) {
        self.nodes[handle.0].messages.push(Message {
            header: header.to_string(),
            body: body.to_string(),
        });
    }

    /// Replace the first entry with a matching header, or append.
    pub fn add_or_replace_message(&mut self, handle: ResultHandle, header: &str, body: &str) {
        let node = &mut self.nodes[handle.0];
        match node.messages.iter_mut().find(|m| m.header == header) {
            Some(message) => message.body = body.to_string(),
            None => node.messages.push(Message {
                header: header.to_string(),
                body: body.to_string(),
            }),
        }
    }

    /// Complete with `Success` and a formatted message.
    pub fn complete_as_successful(
        &mut self,
        handle: ResultHandle,
        provider: &dyn MessageProvider,
        key: &str,
        args: &[&str],
    ) {
        let message = provider.get_with_args(key, args);
        self.add_message(handle, MSG_MESSAGE, &message);
        self.set_terminal(handle, ExecutionState::Success);
    }

    /// Complete with `Failure` and a formatted message.
    pub fn complete_as_failure(
        &mut self,
        handle: ResultHandle,
        provider: &dyn MessageProvider,
        key: &str,
        args: &[&str],
    ) {
        let message = provider.get_with_args(key, args);
        self.add_message(handle, MSG_ERROR_MESSAGE, &message);
        self.set_terminal(handle, ExecutionState::Failure);
    }

    /// Complete with `Error`, a formatted message and the rendered error
    /// chain.
    pub fn complete_as_error(
        &mut self,
        handle: ResultHandle,
        provider: &dyn MessageProvider,
        key: &str,
        args: &[&str],
        error: &(dyn std::error::Error + 'static),
    ) {
        let message = provider.get_with_args(key, args);
        self.add_message(handle, MSG_ERROR_MESSAGE, &message);
        self.add_message(handle, MSG_STACKTRACE, &trace::render_chain(error));
        self.set_terminal(handle, ExecutionState::Error);
    }

    /// Complete by aggregating the states of all children.
    ///
    /// Any `Error` child makes this node `Error`; otherwise any
    /// `Failure` child makes it `Failure`; otherwise `Success` (a node
    /// without children computes to `Success`). Children still executing
    /// are forced to `Error` first. The success or failure message
    /// template is applied, with the failed and erroneous child counts
    /// prepended to the failure arguments.
    pub fn complete_as_computed(
        &mut self,
        handle: ResultHandle,
        provider: &dyn MessageProvider,
        success_key: &str,
        success_args: &[&str],
        failure_key: &str,
        failure_args: &[&str],
    ) {
        if self.nodes[handle.0].state != ExecutionState::Executing {
            return;
        }

        let children = self.nodes[handle.0].children.clone();
        for child in &children {
            if self.nodes[child.0].state == ExecutionState::Executing {
                self.force_child_error(*child);
            }
        }

        let mut successful = 0;
        let mut failed = 0;
        let mut errors = 0;
        for child in &children {
            match self.nodes[child.0].state {
                ExecutionState::Success => successful += 1,
                ExecutionState::Failure => failed += 1,
                _ => errors += 1,
            }
        }

        let summary = format!(
            "Results: {}, successful: {}, failures: {}, errors: {}.",
            children.len(),
            successful,
            failed,
            errors
        );
        self.add_or_replace_message(handle, MSG_COMPOSITE, &summary);

        let state = if errors > 0 {
            ExecutionState::Error
        } else if failed > 0 {
            ExecutionState::Failure
        } else {
            ExecutionState::Success
        };

        if state == ExecutionState::Success {
            let message = provider.get_with_args(success_key, success_args);
            self.add_message(handle, MSG_MESSAGE, &message);
        } else {
            let failed_count = failed.to_string();
            let error_count = errors.to_string();
            let mut args: Vec<&str> = vec![&failed_count, &error_count];
            args.extend_from_slice(failure_args);
            let message = provider.get_with_args(failure_key, &args);
            self.add_message(handle, MSG_ERROR_MESSAGE, &message);
        }

        self.set_terminal(handle, state);
    }

    /// Force a still-executing child into a terminal error state so the
    /// parent can aggregate.
    fn force_child_error(&mut self, child: ResultHandle) {
        log_status!(
            "result",
            "State forced to error for [{}]: state was never set",
            self.nodes[child.0].description
        );
        self.add_message(
            child,
            MSG_MESSAGE,
            "State is forced to error due to state not being set explicitly.",
        );
        self.set_terminal(child, ExecutionState::Error);
    }

    /// Terminal transition; happens at most once per node. Any terminal
    /// state other than `Success` registers this node as failed with the
    /// continuation policy (first failure wins there).
    fn set_terminal(&mut self, handle: ResultHandle, state: ExecutionState) {
        let node = &mut self.nodes[handle.0];
        if node.state != ExecutionState::Executing {
            return;
        }

        node.state = state;
        node.ended_at = Some(Utc::now());

        if state != ExecutionState::Success {
            self.policy.set_failed(handle);
        }
    }

    pub fn state(&self, handle: ResultHandle) -> ExecutionState {
        self.nodes[handle.0].state
    }

    pub fn is_executing(&self, handle: ResultHandle) -> bool {
        self.state(handle) == ExecutionState::Executing
    }

    pub fn is_success(&self, handle: ResultHandle) -> bool {
        self.state(handle) == ExecutionState::Success
    }

    pub fn is_failure(&self, handle: ResultHandle) -> bool {
        self.state(handle) == ExecutionState::Failure
    }

    pub fn is_error(&self, handle: ResultHandle) -> bool {
        self.state(handle) == ExecutionState::Error
    }

    pub fn is_root(&self, handle: ResultHandle) -> bool {
        self.nodes[handle.0].parent.is_none()
    }

    pub fn correlation_id(&self, handle: ResultHandle) -> Uuid {
        self.nodes[handle.0].correlation_id
    }

    pub fn description(&self, handle: ResultHandle) -> &str {
        &self.nodes[handle.0].description
    }

    pub fn messages(&self, handle: ResultHandle) -> &[Message] {
        &self.nodes[handle.0].messages
    }

    pub fn children(&self, handle: ResultHandle) -> &[ResultHandle] {
        &self.nodes[handle.0].children
    }

    pub fn parent(&self, handle: ResultHandle) -> Option<ResultHandle> {
        self.nodes[handle.0].parent
    }

    pub fn started_at(&self, handle: ResultHandle) -> DateTime<Utc> {
        self.nodes[handle.0].started_at
    }

    pub fn ended_at(&self, handle: ResultHandle) -> Option<DateTime<Utc>> {
        self.nodes[handle.0].ended_at
    }

    /// Wall-clock duration of a completed node in milliseconds.
    pub fn elapsed_ms(&self, handle: ResultHandle) -> Option<i64> {
        let node = &self.nodes[handle.0];
        node.ended_at
            .map(|ended| (ended - node.started_at).num_milliseconds())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::TableMessageProvider;

    fn provider() -> TableMessageProvider {
        TableMessageProvider::with_messages(&[
            ("test.ok", "worked"),
            ("test.ok_args", "worked on {{0}}"),
            ("test.bad", "did not work"),
            ("test.computed_failed", "{{0}} failed, {{1}} errors"),
        ])
    }

    #[test]
    fn root_starts_executing_with_description() {
        let tree = ExecutionResultTree::new("run operation");

        assert!(tree.is_executing(tree.root()));
        assert!(tree.is_root(tree.root()));
        assert_eq!(tree.description(tree.root()), "run operation");
        assert!(tree.ended_at(tree.root()).is_none());
    }

    #[test]
    fn add_child_appends_in_order() {
        let mut tree = ExecutionResultTree::new("root");
        let root = tree.root();
        let first = tree.add_child(root, "first").unwrap();
        let second = tree.add_child(root, "second").unwrap();

        assert_eq!(tree.children(root), &[first, second]);
        assert_eq!(tree.parent(first), Some(root));
        assert!(tree.is_executing(first));
        assert!(!tree.is_root(second));
    }

    #[test]
    fn complete_as_successful_is_terminal_once() {
        let mut tree = ExecutionResultTree::new("root");
        let provider = provider();
        let root = tree.root();

        tree.complete_as_successful(root, &provider, "test.ok", &[]);
        assert!(tree.is_success(root));
        assert!(tree.ended_at(root).is_some());

        // second completion is a no-op
        tree.complete_as_failure(root, &provider, "test.bad", &[]);
        assert!(tree.is_success(root));
    }

    #[test]
    fn completion_message_is_recorded_in_order() {
        let mut tree = ExecutionResultTree::new("root");
        let provider = provider();
        let root = tree.root();

        tree.add_message(root, "Executable", "ls");
        tree.complete_as_successful(root, &provider, "test.ok_args", &["host-1"]);

        let messages = tree.messages(root);
        assert_eq!(messages[0].header, "Executable");
        assert_eq!(messages[1].header, MSG_MESSAGE);
        assert_eq!(messages[1].body, "worked on host-1");
    }

    #[test]
    fn failure_registers_first_failed_result_with_policy() {
        let mut tree = ExecutionResultTree::new("root");
        let provider = provider();
        let root = tree.root();
        let first = tree.add_child(root, "first").unwrap();
        let second = tree.add_child(root, "second").unwrap();

        tree.complete_as_failure(first, &provider, "test.bad", &[]);
        tree.complete_as_failure(second, &provider, "test.bad", &[]);

        assert_eq!(tree.policy().failed_result(), Some(first));
    }

    #[test]
    fn complete_as_error_records_error_chain() {
        let mut tree = ExecutionResultTree::new("root");
        let provider = provider();
        let root = tree.root();

        let error = Error::plugin_execution_failed_with_source(
            "step crashed",
            Error::session_connect("connection refused"),
        );
        tree.complete_as_error(root, &provider, "test.bad", &[], &error);

        assert!(tree.is_error(root));
        let stacktrace = tree
            .messages(root)
            .iter()
            .find(|m| m.header == MSG_STACKTRACE)
            .expect("stack trace message expected");
        assert!(stacktrace.body.contains("connection refused"));
    }

    #[test]
    fn computed_state_is_worst_of_children() {
        let mut tree = ExecutionResultTree::new("root");
        let provider = provider();
        let root = tree.root();

        let a = tree.add_child(root, "a").unwrap();
        let b = tree.add_child(root, "b").unwrap();
        let c = tree.add_child(root, "c").unwrap();
        tree.complete_as_successful(a, &provider, "test.ok", &[]);
        tree.complete_as_failure(b, &provider, "test.bad", &[]);
        tree.complete_as_successful(c, &provider, "test.ok", &[]);

        tree.complete_as_computed(root, &provider, "test.ok", &[], "test.computed_failed", &[]);

        assert!(tree.is_failure(root));
        let summary = tree
            .messages(root)
            .iter()
            .find(|m| m.header == MSG_COMPOSITE)
            .expect("composite message expected");
        assert_eq!(summary.body, "Results: 3, successful: 2, failures: 1, errors: 0.");
    }

    #[test]
    fn computed_error_dominates_failure() {
        let mut tree = ExecutionResultTree::new("root");
        let provider = provider();
        let root = tree.root();

        let a = tree.add_child(root, "a").unwrap();
        let b = tree.add_child(root, "b").unwrap();
        tree.complete_as_failure(a, &provider, "test.bad", &[]);
        tree.complete_as_error(
            b,
            &provider,
            "test.bad",
            &[],
            &Error::session_connect("boom"),
        );

        tree.complete_as_computed(root, &provider, "test.ok", &[], "test.computed_failed", &[]);

        assert!(tree.is_error(root));
    }

    #[test]
    fn computed_without_children_is_success() {
        let mut tree = ExecutionResultTree::new("root");
        let provider = provider();
        let root = tree.root();

        tree.complete_as_computed(root, &provider, "test.ok", &[], "test.computed_failed", &[]);

        assert!(tree.is_success(root));
    }

    #[test]
    fn computed_forces_executing_children_to_error() {
        let mut tree = ExecutionResultTree::new("root");
        let provider = provider();
        let root = tree.root();

        let child = tree.add_child(root, "never completed").unwrap();
        tree.complete_as_computed(root, &provider, "test.ok", &[], "test.computed_failed", &[]);

        assert!(tree.is_error(child));
        assert!(tree.is_error(root));
    }

    #[test]
    fn computed_failure_message_carries_counts() {
        let mut tree = ExecutionResultTree::new("root");
        let provider = provider();
        let root = tree.root();

        let a = tree.add_child(root, "a").unwrap();
        tree.complete_as_failure(a, &provider, "test.bad", &[]);

        tree.complete_as_computed(root, &provider, "test.ok", &[], "test.computed_failed", &[]);

        let message = tree
            .messages(root)
            .iter()
            .find(|m| m.header == MSG_ERROR_MESSAGE)
            .expect("error message expected");
        assert_eq!(message.body, "1 failed, 0 errors");
    }

    #[test]
    fn add_child_after_cancellation_is_interrupted() {
        let mut tree = ExecutionResultTree::new("root");
        let root = tree.root();
        tree.set_cancelled();

        let result = tree.add_child(root, "late");

        match result {
            Err(Error::InterruptedExecution(message)) => {
                assert!(message.contains("cancellation"));
            }
            other => panic!("expected interruption, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn add_child_after_failure_with_disabled_continuation_is_interrupted() {
        let mut tree = ExecutionResultTree::new("root");
        let provider = provider();
        let root = tree.root();
        tree.policy().disable_continue_on_failure();

        let child = tree.add_child(root, "failing step").unwrap();
        tree.complete_as_failure(child, &provider, "test.bad", &[]);

        let result = tree.add_child(root, "next step");

        match result {
            Err(Error::InterruptedExecution(message)) => {
                assert!(message.contains("failing step"));
            }
            other => panic!("expected interruption, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn policy_is_shared_across_nodes() {
        let mut tree = ExecutionResultTree::new("root");
        let root = tree.root();
        let _child = tree.add_child(root, "child").unwrap();

        tree.policy().set_cancelled();

        assert!(tree.policy().is_cancelled());
        assert!(tree.add_child(root, "other").is_err());
    }

    #[test]
    fn elapsed_is_available_after_completion() {
        let mut tree = ExecutionResultTree::new("root");
        let provider = provider();
        let root = tree.root();

        assert!(tree.elapsed_ms(root).is_none());
        tree.complete_as_successful(root, &provider, "test.ok", &[]);
        assert!(tree.elapsed_ms(root).is_some());
    }
}
