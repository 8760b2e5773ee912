// Public modules
pub mod command;
pub mod error;
pub mod execution;
pub mod messages;
pub mod operation;
pub mod process;
pub mod session;

// Re-export common types for convenience
pub use self::command::{
    context::{CommandContext, ContextValue},
    runner::CommandRunner,
    Command,
};
pub use self::error::{Error, Result};
pub use self::execution::{
    continuation::ContinuationPolicy,
    result::{ExecutionResultTree, ExecutionState, Message, ResultHandle},
};
pub use self::messages::{MessageProvider, TableMessageProvider};
pub use self::operation::Operation;
pub use self::session::{
    retry::{RetryConfig, RetrySessionHandler},
    Credential, Resource, Session,
};
