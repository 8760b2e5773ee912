//! Continuation policy shared by every result in one execution tree.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::OnceLock;

use crate::execution::result::ResultHandle;

/// Directive deciding whether a multi-step operation proceeds after a
/// failure or a cancellation request.
///
/// One policy instance is shared by every node of one execution tree.
/// The policy may be observed from another thread (cooperative
/// cancellation), so all state is atomic. Cancellation is one-way; the
/// continue-on-failure directive and the first failed result are each
/// settable at most once, later writes are ignored.
#[derive(Debug, Default)]
pub struct ContinuationPolicy {
    continue_on_failure: OnceLock<bool>,
    cancelled: AtomicBool,
    failed_result: OnceLock<ResultHandle>,
}

impl ContinuationPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether execution should proceed.
    ///
    /// Returns false once cancelled. Otherwise permissive while the
    /// continue-on-failure directive is unset or enabled; when disabled,
    /// execution continues only until the first failure is registered.
    pub fn continue_execution(&self) -> bool {
        if self.is_cancelled() {
            return false;
        }
        if self.is_continue_on_failure() {
            return true;
        }
        self.failed_result.get().is_none()
    }

    /// Current continue-on-failure directive; unset reads as permissive.
    pub fn is_continue_on_failure(&self) -> bool {
        *self.continue_on_failure.get().unwrap_or(&true)
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Set the directive to continue past failures. No-op once the
    /// directive has been set either way.
    pub fn enable_continue_on_failure(&self) {
        let _ = self.continue_on_failure.set(true);
    }

    /// Set the directive to stop at the first failure. No-op once the
    /// directive has been set either way.
    pub fn disable_continue_on_failure(&self) {
        let _ = self.continue_on_failure.set(false);
    }

    /// Record the first result that reported failure. Later calls keep
    /// the first registration.
    pub fn set_failed(&self, result: ResultHandle) {
        let _ = self.failed_result.set(result);
    }

    pub fn failed_result(&self) -> Option<ResultHandle> {
        self.failed_result.get().copied()
    }

    /// One-way cancellation trigger, observed at the next checkpoint.
    pub fn set_cancelled(&self) {
        self.cancelled.store(true, Ordering::Release);
    }
}
