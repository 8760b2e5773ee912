//! Process-execution backend: runs local processes as operation steps.

pub mod command;
pub mod model;
pub mod operation;
pub mod session;

pub use self::command::{AssertOutputContainsCommand, ProcessExecutionCommand};
pub use self::model::{ProcessModel, ProcessStep};
pub use self::operation::DefaultOperation;
pub use self::session::ProcessSession;

/// Plugin id process-execution resources declare.
pub const PLUGIN_ID: &str = "process-execution";
