//! Execution pipeline — lookup, bind, invoke, race, normalize.
//!
//! One call flows strictly through bind → invoke → await → normalize. Every
//! failure except caller cancellation is caught here and converted into an
//! error `ToolResult`; cancellation propagates as `Err(Error::Cancelled)`
//! because it is the caller aborting, not the tool failing. The per-call
//! timer races the handler under a biased select so the external signal is
//! never mistaken for a timeout.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{Map, Value};
use tokio_util::sync::CancellationToken;

use crate::call::{ToolCall, ToolResult};
use crate::exec::binder::bind;
use crate::exec::events::{ExecutionObserver, ObserverSet};
use crate::registry::{ToolDef, ToolRegistry};
use crate::types::{Error, ExecutorConfig, Result};

/// Executes tool calls against a registry.
///
/// Holds no per-call state; any number of calls may be in flight
/// concurrently. Ordering between distinct calls is not promised.
#[derive(Debug)]
pub struct ToolExecutor {
    registry: Arc<ToolRegistry>,
    config: ExecutorConfig,
    observers: ObserverSet,
}

impl ToolExecutor {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self::with_config(registry, ExecutorConfig::default())
    }

    pub fn with_config(registry: Arc<ToolRegistry>, config: ExecutorConfig) -> Self {
        Self {
            registry,
            config,
            observers: ObserverSet::new(),
        }
    }

    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    /// Subscribe an observer to this executor's notification points.
    pub fn subscribe(&self, observer: Arc<dyn ExecutionObserver>) {
        self.observers.subscribe(observer);
    }

    /// Execute one tool call to completion.
    ///
    /// Returns `Ok(ToolResult)` for every outcome except caller
    /// cancellation, which propagates as `Err(Error::Cancelled)`.
    pub async fn dispatch(&self, call: ToolCall, cancel: CancellationToken) -> Result<ToolResult> {
        // Fail fast if the caller already gave up; the handler never runs.
        if cancel.is_cancelled() {
            return Err(Error::cancelled(format!(
                "call '{}' cancelled before invocation",
                call.id
            )));
        }

        let Some(def) = self.registry.get(&call.name) else {
            return Ok(self.fail(&call, Error::unknown_tool(call.name.clone())));
        };

        let arguments = match as_object(&call.arguments) {
            Ok(map) => map,
            Err(err) => return Ok(self.fail(&call, err)),
        };

        // Binding failure means the callable is never invoked: no side
        // effects on validation failure.
        let bound = match bind(&def, &arguments, &cancel) {
            Ok(bound) => bound,
            Err(err) => return Ok(self.fail(&call, err)),
        };

        self.observers.notify_invoking(&call);
        tracing::debug!("invoking tool '{}' (call {})", call.name, call.id);

        let outcome = self
            .await_handler(&def, bound, &cancel, def.timeout().or(self.config.default_timeout))
            .await;

        match outcome {
            Ok(value) => {
                let result = ToolResult::success(call.id.clone(), value);
                self.observers.notify_completed(&call, &result);
                tracing::debug!("tool '{}' completed (call {})", call.name, call.id);
                Ok(result)
            }
            Err(err) if err.is_cancellation() => {
                tracing::debug!("call {} cancelled by caller", call.id);
                Err(err)
            }
            Err(err) => Ok(self.fail(&call, err)),
        }
    }

    /// Await the handler under the cancellation/timeout race.
    ///
    /// The select is biased so a fired external signal always wins over a
    /// simultaneously-elapsed timer: "the caller gave up" and "we gave up
    /// waiting" are never confused.
    async fn await_handler(
        &self,
        def: &ToolDef,
        bound: crate::exec::BoundArgs,
        cancel: &CancellationToken,
        timeout: Option<Duration>,
    ) -> Result<Value> {
        let handler = def.handler().clone();
        let fut = handler.call(bound);

        match timeout {
            Some(limit) => {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => Err(Error::cancelled(format!(
                        "tool '{}' cancelled by caller",
                        def.name().as_str()
                    ))),
                    resolved = tokio::time::timeout(limit, fut) => match resolved {
                        Err(_elapsed) => Err(Error::timeout(format!(
                            "tool '{}' did not complete within {:?}",
                            def.name().as_str(),
                            limit
                        ))),
                        Ok(result) => result,
                    },
                }
            }
            None => {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => Err(Error::cancelled(format!(
                        "tool '{}' cancelled by caller",
                        def.name().as_str()
                    ))),
                    result = fut => result,
                }
            }
        }
    }

    /// Normalize a failure into an error result and notify observers.
    fn fail(&self, call: &ToolCall, err: Error) -> ToolResult {
        tracing::warn!("tool call '{}' failed: {}", call.name, err);
        self.observers.notify_failed(call, &err);
        ToolResult::error(call.id.clone(), err.to_string())
    }
}

/// Arguments must be a JSON object (empty object when absent).
fn as_object(arguments: &Value) -> Result<Map<String, Value>> {
    match arguments {
        Value::Object(map) => Ok(map.clone()),
        Value::Null => Ok(Map::new()),
        other => Err(Error::Validation(crate::schema::ValidationReport::new(
            vec![crate::schema::ValidationIssue {
                parameter: String::new(),
                path: String::new(),
                message: format!(
                    "arguments must be an object, got {}",
                    match other {
                        Value::Array(_) => "array",
                        Value::String(_) => "string",
                        Value::Number(_) => "number",
                        Value::Bool(_) => "boolean",
                        Value::Null => "null",
                        Value::Object(_) => "object",
                    }
                ),
                kind: crate::schema::IssueKind::TypeError,
            }],
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::BoundArgs;
    use crate::registry::{ParamSpec, ToolSpec};
    use crate::schema::TypeDesc;
    use serde_json::json;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    fn executor() -> ToolExecutor {
        let registry = Arc::new(ToolRegistry::new());
        registry
            .register(
                ToolSpec::new("add", "Add two integers")
                    .param(ParamSpec::new("a", TypeDesc::Integer))
                    .param(ParamSpec::new("b", TypeDesc::Integer))
                    .handler(|args: BoundArgs| async move {
                        let a = args.json(0)?.as_i64().unwrap_or(0);
                        let b = args.json(1)?.as_i64().unwrap_or(0);
                        Ok(json!(a + b))
                    }),
            )
            .unwrap();
        ToolExecutor::new(registry)
    }

    #[tokio::test]
    async fn test_dispatch_success() {
        let executor = executor();
        let call = ToolCall::new("add", json!({"a": 2, "b": 3}));
        let id = call.id.clone();

        let result = executor
            .dispatch(call, CancellationToken::new())
            .await
            .unwrap();
        assert!(!result.is_error);
        assert_eq!(result.id, id);
        assert_eq!(result.output, json!(5));
    }

    #[tokio::test]
    async fn test_unknown_tool_is_error_result() {
        let executor = executor();
        let result = executor
            .dispatch(
                ToolCall::new("missing", json!({})),
                CancellationToken::new(),
            )
            .await
            .unwrap();
        assert!(result.is_error);
        assert_eq!(result.output_text(), "unknown tool: missing");
    }

    #[tokio::test]
    async fn test_validation_failure_never_invokes_handler() {
        let registry = Arc::new(ToolRegistry::new());
        let invoked = Arc::new(AtomicBool::new(false));
        let flag = invoked.clone();
        registry
            .register(
                ToolSpec::new("strict", "Strict")
                    .param(ParamSpec::new("n", TypeDesc::Integer))
                    .handler(move |_args: BoundArgs| {
                        let flag = flag.clone();
                        async move {
                            flag.store(true, Ordering::SeqCst);
                            Ok(json!(null))
                        }
                    }),
            )
            .unwrap();
        let executor = ToolExecutor::new(registry);

        let result = executor
            .dispatch(
                ToolCall::new("strict", json!({"n": "NaN"})),
                CancellationToken::new(),
            )
            .await
            .unwrap();
        assert!(result.is_error);
        assert!(result.output_text().contains("expected integer"));
        assert!(!invoked.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_handler_error_normalized() {
        let registry = Arc::new(ToolRegistry::new());
        registry
            .register(
                ToolSpec::new("fail", "Always fails").handler(|_args: BoundArgs| async move {
                    Err::<Value, _>(Error::execution("disk on fire"))
                }),
            )
            .unwrap();
        let executor = ToolExecutor::new(registry);

        let result = executor
            .dispatch(ToolCall::new("fail", json!({})), CancellationToken::new())
            .await
            .unwrap();
        assert!(result.is_error);
        assert_eq!(result.output_text(), "tool execution failed: disk on fire");
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_produces_error_result() {
        let registry = Arc::new(ToolRegistry::new());
        registry
            .register(
                ToolSpec::new("stuck", "Never resolves")
                    .timeout(Duration::from_millis(50))
                    .handler(|_args: BoundArgs| async move {
                        std::future::pending::<()>().await;
                        Ok(json!(null))
                    }),
            )
            .unwrap();
        let executor = ToolExecutor::new(registry);

        let result = executor
            .dispatch(ToolCall::new("stuck", json!({})), CancellationToken::new())
            .await
            .unwrap();
        assert!(result.is_error);
        assert!(result.output_text().starts_with("timeout: tool 'stuck'"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_external_cancellation_propagates() {
        let registry = Arc::new(ToolRegistry::new());
        registry
            .register(
                ToolSpec::new("stuck", "Never resolves")
                    .timeout(Duration::from_secs(600))
                    .handler(|_args: BoundArgs| async move {
                        std::future::pending::<()>().await;
                        Ok(json!(null))
                    }),
            )
            .unwrap();
        let executor = Arc::new(ToolExecutor::new(registry));

        let token = CancellationToken::new();
        let child = token.clone();
        let task = tokio::spawn({
            let executor = executor.clone();
            async move {
                executor
                    .dispatch(ToolCall::new("stuck", json!({})), child)
                    .await
            }
        });

        tokio::time::sleep(Duration::from_millis(10)).await;
        token.cancel();
        let outcome = task.await.unwrap();
        assert!(matches!(outcome, Err(Error::Cancelled(_))));
    }

    #[tokio::test]
    async fn test_pre_invoke_cancellation_fails_fast() {
        let registry = Arc::new(ToolRegistry::new());
        let invoked = Arc::new(AtomicBool::new(false));
        let flag = invoked.clone();
        registry
            .register(ToolSpec::new("touchy", "Tracks invocation").handler(
                move |_args: BoundArgs| {
                    let flag = flag.clone();
                    async move {
                        flag.store(true, Ordering::SeqCst);
                        Ok(json!(null))
                    }
                },
            ))
            .unwrap();
        let executor = ToolExecutor::new(registry);

        let token = CancellationToken::new();
        token.cancel();
        let outcome = executor
            .dispatch(ToolCall::new("touchy", json!({})), token)
            .await;
        assert!(matches!(outcome, Err(Error::Cancelled(_))));
        assert!(!invoked.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_non_object_arguments_rejected() {
        let executor = executor();
        let result = executor
            .dispatch(
                ToolCall::new("add", json!([1, 2])),
                CancellationToken::new(),
            )
            .await
            .unwrap();
        assert!(result.is_error);
        assert!(result.output_text().contains("must be an object"));
    }

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<String>>,
    }

    impl ExecutionObserver for Recorder {
        fn on_invoking(&self, call: &ToolCall) {
            self.events.lock().unwrap().push(format!("invoking:{}", call.name));
        }
        fn on_failed(&self, call: &ToolCall, _error: &Error) {
            self.events.lock().unwrap().push(format!("failed:{}", call.name));
        }
        fn on_completed(&self, call: &ToolCall, _result: &ToolResult) {
            self.events.lock().unwrap().push(format!("completed:{}", call.name));
        }
    }

    #[tokio::test]
    async fn test_observer_order_on_success() {
        let executor = executor();
        let recorder = Arc::new(Recorder::default());
        executor.subscribe(recorder.clone());

        executor
            .dispatch(
                ToolCall::new("add", json!({"a": 1, "b": 1})),
                CancellationToken::new(),
            )
            .await
            .unwrap();

        let events = recorder.events.lock().unwrap();
        assert_eq!(*events, vec!["invoking:add", "completed:add"]);
    }

    #[tokio::test]
    async fn test_observer_failed_without_invoking_on_validation() {
        let executor = executor();
        let recorder = Arc::new(Recorder::default());
        executor.subscribe(recorder.clone());

        executor
            .dispatch(ToolCall::new("add", json!({})), CancellationToken::new())
            .await
            .unwrap();

        // Binding failed, so the handler was never about to run: no
        // "invoking", exactly one "failed", no "completed".
        let events = recorder.events.lock().unwrap();
        assert_eq!(*events, vec!["failed:add"]);
    }
}
