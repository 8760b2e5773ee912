//! Bounded retry for transient session connect failures.

use std::thread;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::execution::result::{ExecutionResultTree, ResultHandle, MSG_MESSAGE};
use crate::messages::MessageProvider;
use crate::operation::Operation;
use crate::session::{Credential, Resource, Session};

/// Retry settings for one handler instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RetryConfig {
    /// Total connect attempts, including the first one.
    pub max_attempts: u32,
    /// Blocking delay between attempts in milliseconds.
    pub delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay_ms: 2000,
        }
    }
}

/// Detect a transient connect failure anywhere in an error's source
/// chain.
///
/// A connect failure stays transient no matter how deeply an
/// intermediate layer has wrapped it; anything else is surfaced
/// without retry.
pub fn contains_connect_failure(error: &(dyn std::error::Error + 'static)) -> bool {
    let mut current: Option<&(dyn std::error::Error + 'static)> = Some(error);

    while let Some(candidate) = current {
        if let Some(engine_error) = candidate.downcast_ref::<Error>() {
            if matches!(engine_error, Error::SessionConnect { .. }) {
                return true;
            }
        }
        current = candidate.source();
    }

    false
}

/// Wraps session connect attempts with a bounded retry loop and drives
/// the connect/execute/disconnect lifecycle around an operation.
pub struct RetrySessionHandler {
    max_attempts: u32,
    delay: Duration,
}

impl RetrySessionHandler {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    pub fn from_config(config: &RetryConfig) -> Self {
        Self::new(config.max_attempts, Duration::from_millis(config.delay_ms))
    }

    /// Connect `session`, retrying transient failures up to the
    /// configured attempt budget.
    ///
    /// Only errors whose source chain contains a connect failure are
    /// retried; any other error is surfaced immediately. When the
    /// budget is exhausted the last failure is surfaced unchanged.
    /// Attempts are recorded on `result` and the inter-attempt delay
    /// blocks the calling thread.
    pub fn connect_with_retry(
        &self,
        session: &mut dyn Session,
        resource: &Resource,
        credential: &Credential,
        tree: &mut ExecutionResultTree,
        result: ResultHandle,
        provider: &dyn MessageProvider,
    ) -> Result<()> {
        let message = provider.get_with_args("sh.connect_info", &[&resource.id]);
        tree.add_message(result, MSG_MESSAGE, &message);

        for attempt in 1..=self.max_attempts {
            match session.connect(resource, credential) {
                Ok(()) => {
                    let message = provider.get("sh.connected_info");
                    tree.add_message(result, MSG_MESSAGE, &message);
                    return Ok(());
                }
                Err(error) => {
                    if attempt == self.max_attempts || !contains_connect_failure(&error) {
                        return Err(error);
                    }

                    let delay_ms = self.delay.as_millis().to_string();
                    let attempt_count = attempt.to_string();
                    let budget = self.max_attempts.to_string();
                    let message = provider.get_with_args(
                        "sh.retry_info",
                        &[&attempt_count, &budget, &delay_ms],
                    );
                    tree.add_message(result, MSG_MESSAGE, &message);
                    log_status!(
                        "session",
                        "Connect to [{}] failed (attempt {}/{}), retrying in {} ms",
                        resource.id,
                        attempt,
                        self.max_attempts,
                        delay_ms
                    );

                    thread::sleep(self.delay);
                }
            }
        }

        // loop either returns success or surfaces the last error
        Err(Error::session_connect(format!(
            "retry budget exhausted for resource [{}]",
            resource.id
        )))
    }

    /// Run an operation inside a connect/disconnect lifecycle.
    ///
    /// Connects with retry, executes the operation, then disconnects.
    /// A disconnect failure after a successful run is recorded on the
    /// result and surfaced; after a failed run it is recorded and the
    /// run error wins.
    #[allow(clippy::too_many_arguments)]
    pub fn run_operation(
        &self,
        operation: &mut dyn Operation,
        content: &dyn std::any::Any,
        session: &mut dyn Session,
        resource: &Resource,
        credential: &Credential,
        tree: &mut ExecutionResultTree,
        result: ResultHandle,
        provider: &dyn MessageProvider,
    ) -> Result<()> {
        self.connect_with_retry(session, resource, credential, tree, result, provider)?;

        let outcome = operation.execute(content, session, tree, result, provider);

        let message = provider.get_with_args("sh.disconnect_info", &[&resource.id]);
        tree.add_message(result, MSG_MESSAGE, &message);

        match session.disconnect() {
            Ok(()) => {
                let message = provider.get("sh.disconnected_info");
                tree.add_message(result, MSG_MESSAGE, &message);
                outcome
            }
            Err(disconnect_error) => {
                let rendered = disconnect_error.to_string();
                let message = provider.get_with_args("sh.disconnect_error", &[&rendered]);
                tree.add_message(result, MSG_MESSAGE, &message);
                // an operation failure outranks the disconnect failure
                outcome.and(Err(disconnect_error))
            }
        }
    }
}
