//! Serializable snapshot of a finished execution result tree.
//!
//! The engine never renders or persists results itself; the reporting
//! layer takes a snapshot and formats it however it likes.

use serde::Serialize;

use crate::execution::result::{ExecutionResultTree, ExecutionState, Message, ResultHandle};

/// Plain-data view of one result node and its children, ready for
/// serialization.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionReport {
    pub correlation_id: String,
    pub description: String,
    pub state: ExecutionState,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub messages: Vec<Message>,
    pub started_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elapsed_ms: Option<i64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ExecutionReport>,
}

/// Snapshot the subtree rooted at `handle`, children in execution order.
pub fn snapshot(tree: &ExecutionResultTree, handle: ResultHandle) -> ExecutionReport {
    ExecutionReport {
        correlation_id: tree.correlation_id(handle).to_string(),
        description: tree.description(handle).to_string(),
        state: tree.state(handle),
        messages: tree.messages(handle).to_vec(),
        started_at: tree.started_at(handle).to_rfc3339(),
        elapsed_ms: tree.elapsed_ms(handle),
        children: tree
            .children(handle)
            .iter()
            .map(|child| snapshot(tree, *child))
            .collect(),
    }
}
