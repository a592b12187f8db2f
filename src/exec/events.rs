//! Execution observer hooks.
//!
//! Explicit listener registration instead of ambient global callbacks. Each
//! call fires "invoking" at most once before the handler runs, then exactly
//! one of "failed" or "completed"; never both, never out of order.

use std::sync::{Arc, RwLock};

use crate::call::{ToolCall, ToolResult};
use crate::types::Error;

/// Callbacks observing the execution pipeline.
///
/// All methods default to no-ops so implementers subscribe to what they need.
/// Observers run inline on the call path and should return quickly.
pub trait ExecutionObserver: Send + Sync {
    /// The call passed binding and is about to invoke the handler.
    fn on_invoking(&self, _call: &ToolCall) {}

    /// The call failed (lookup, validation, execution, or timeout). The
    /// error is already normalized. Not fired for caller cancellation.
    fn on_failed(&self, _call: &ToolCall, _error: &Error) {}

    /// The call completed successfully.
    fn on_completed(&self, _call: &ToolCall, _result: &ToolResult) {}
}

/// Registered observers, notified in registration order.
#[derive(Default)]
pub struct ObserverSet {
    observers: RwLock<Vec<Arc<dyn ExecutionObserver>>>,
}

impl std::fmt::Debug for ObserverSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.observers.read().map(|o| o.len()).unwrap_or(0);
        f.debug_struct("ObserverSet").field("count", &count).finish()
    }
}

impl ObserverSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, observer: Arc<dyn ExecutionObserver>) {
        self.observers
            .write()
            .expect("observer set poisoned")
            .push(observer);
    }

    fn snapshot(&self) -> Vec<Arc<dyn ExecutionObserver>> {
        self.observers
            .read()
            .map(|observers| observers.clone())
            .unwrap_or_default()
    }

    pub(crate) fn notify_invoking(&self, call: &ToolCall) {
        for observer in self.snapshot() {
            observer.on_invoking(call);
        }
    }

    pub(crate) fn notify_failed(&self, call: &ToolCall, error: &Error) {
        for observer in self.snapshot() {
            observer.on_failed(call, error);
        }
    }

    pub(crate) fn notify_completed(&self, call: &ToolCall, result: &ToolResult) {
        for observer in self.snapshot() {
            observer.on_completed(call, result);
        }
    }
}
