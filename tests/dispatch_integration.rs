//! End-to-end integration tests — validates register→dispatch→result flow.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;

use toolcast::exec::ExecutionObserver;
use toolcast::registry::{ParamSpec, ToolSet, ToolSpec};
use toolcast::schema::{FieldDesc, ObjectDesc, TypeDesc};
use toolcast::{BoundArgs, Error, ToolCall, ToolExecutor, ToolRegistry, ToolResult};

/// Helper: registry with a small, representative tool set.
fn build_registry() -> Arc<ToolRegistry> {
    let registry = Arc::new(ToolRegistry::new());

    registry
        .engine()
        .define(
            ObjectDesc::new("Query")
                .with_description("Search query")
                .field(FieldDesc::new("text", TypeDesc::String))
                .field(
                    FieldDesc::new("limit", TypeDesc::Optional(Box::new(TypeDesc::Integer)))
                        .with_description("Maximum results"),
                ),
        )
        .unwrap();

    registry
        .register(
            ToolSpec::new("Add", "Add two integers")
                .param(ParamSpec::new("a", TypeDesc::Integer))
                .param(ParamSpec::new("b", TypeDesc::Integer))
                .handler(|args: BoundArgs| async move {
                    let a = args.json(0)?.as_i64().unwrap_or(0);
                    let b = args.json(1)?.as_i64().unwrap_or(0);
                    Ok(json!(a + b))
                }),
        )
        .unwrap();

    registry
        .register(
            ToolSpec::new("search", "Search an index")
                .param(ParamSpec::new("query", TypeDesc::Object("Query".to_string())))
                .handler(|args: BoundArgs| async move {
                    let query = args.json(0)?;
                    let text = query["text"].as_str().unwrap_or("");
                    Ok(json!({ "hits": [text] }))
                }),
        )
        .unwrap();

    registry
        .register(
            ToolSpec::for_method("WeatherService", "GetForecast", "Forecast for a city")
                .param(ParamSpec::new("city", TypeDesc::String).with_description("City name"))
                .param(ParamSpec::new("days", TypeDesc::Integer).with_default(json!(3)))
                .handler(|args: BoundArgs| async move {
                    let city: String = args.decode(0)?;
                    let days: i64 = args.decode(1)?;
                    Ok(json!({ "city": city, "days": days, "forecast": "sunny" }))
                }),
        )
        .unwrap();

    registry
}

#[tokio::test]
async fn test_register_dispatch_round_trip() {
    let registry = build_registry();
    let executor = ToolExecutor::new(registry);

    let call = ToolCall::new("add", json!({"a": 19, "b": 23}));
    let id = call.id.clone();
    let result = executor
        .dispatch(call, CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(result.id, id);
    assert!(!result.is_error);
    assert_eq!(result.output, json!(42));
}

#[tokio::test]
async fn test_case_insensitive_dispatch_and_lookup() {
    let registry = build_registry();
    assert!(Arc::ptr_eq(
        &registry.get("Add").unwrap(),
        &registry.get("add").unwrap()
    ));

    let executor = ToolExecutor::new(registry);
    let result = executor
        .dispatch(
            ToolCall::new("ADD", json!({"a": 1, "b": 2})),
            CancellationToken::new(),
        )
        .await
        .unwrap();
    assert_eq!(result.output, json!(3));
}

#[tokio::test]
async fn test_derived_method_name_and_default() {
    let registry = build_registry();
    let executor = ToolExecutor::new(registry);

    let result = executor
        .dispatch(
            ToolCall::new("weather_service.get_forecast", json!({"city": "Tokyo"})),
            CancellationToken::new(),
        )
        .await
        .unwrap();
    assert!(!result.is_error);
    assert_eq!(result.output["city"], "Tokyo");
    assert_eq!(result.output["days"], 3);
}

#[tokio::test]
async fn test_single_parameter_wrapping_end_to_end() {
    let registry = build_registry();
    let executor = ToolExecutor::new(registry);

    // The model passed the Query object's fields at the top level.
    let result = executor
        .dispatch(
            ToolCall::new("search", json!({"text": "rust", "limit": 5})),
            CancellationToken::new(),
        )
        .await
        .unwrap();
    assert!(!result.is_error);
    assert_eq!(result.output["hits"], json!(["rust"]));
}

#[tokio::test]
async fn test_validation_errors_aggregate_in_result() {
    let registry = build_registry();
    let executor = ToolExecutor::new(registry);

    let result = executor
        .dispatch(
            ToolCall::new("add", json!({"a": "one"})),
            CancellationToken::new(),
        )
        .await
        .unwrap();
    assert!(result.is_error);
    let message = result.output_text();
    // Both bad parameters are named in one report.
    assert!(message.contains("'a'"), "message was: {message}");
    assert!(message.contains("'b'"), "message was: {message}");
}

#[tokio::test(start_paused = true)]
async fn test_timeout_vs_cancellation_distinction() {
    let registry = Arc::new(ToolRegistry::new());
    registry
        .register(
            ToolSpec::new("stall", "Never resolves")
                .timeout(Duration::from_millis(100))
                .handler(|_args: BoundArgs| async move {
                    std::future::pending::<()>().await;
                    Ok(Value::Null)
                }),
        )
        .unwrap();
    let executor = Arc::new(ToolExecutor::new(registry));

    // Timer elapses: tool-level error result.
    let result = executor
        .dispatch(ToolCall::new("stall", json!({})), CancellationToken::new())
        .await
        .unwrap();
    assert!(result.is_error);
    assert!(result.output_text().starts_with("timeout:"));

    // External signal fires first: cancellation propagates, no ToolResult.
    let token = CancellationToken::new();
    let task = tokio::spawn({
        let executor = executor.clone();
        let token = token.clone();
        async move {
            executor
                .dispatch(ToolCall::new("stall", json!({})), token)
                .await
        }
    });
    tokio::time::sleep(Duration::from_millis(10)).await;
    token.cancel();
    assert!(matches!(task.await.unwrap(), Err(Error::Cancelled(_))));
}

#[tokio::test]
async fn test_concurrent_calls_do_not_interfere() {
    let registry = build_registry();
    let executor = Arc::new(ToolExecutor::new(registry));

    let mut tasks = Vec::new();
    for i in 0..16i64 {
        let executor = executor.clone();
        tasks.push(tokio::spawn(async move {
            executor
                .dispatch(
                    ToolCall::new("add", json!({"a": i, "b": i})),
                    CancellationToken::new(),
                )
                .await
                .unwrap()
        }));
    }

    for (i, task) in tasks.into_iter().enumerate() {
        let result = task.await.unwrap();
        assert!(!result.is_error);
        assert_eq!(result.output, json!(2 * i as i64));
    }
}

#[tokio::test]
async fn test_schema_export_surface() {
    let registry = build_registry();
    let defs = registry.definitions();
    assert_eq!(defs.len(), 3);

    let add = registry.get("add").unwrap();
    let exported = add.descriptor_json();
    assert_eq!(exported["name"], "Add");
    assert_eq!(exported["parameters"]["type"], "object");
    assert_eq!(
        exported["parameters"]["required"],
        json!(["a", "b"])
    );

    let prompt = registry.prompt_lines(None);
    assert!(prompt.contains("Available tools:"));
    assert!(prompt.contains("- Add(a: integer, b: integer): Add two integers"));
}

#[tokio::test]
async fn test_unregister_then_dispatch_fails_lookup() {
    let registry = build_registry();
    assert!(registry.unregister("ADD"));

    let executor = ToolExecutor::new(registry);
    let result = executor
        .dispatch(
            ToolCall::new("add", json!({"a": 1, "b": 2})),
            CancellationToken::new(),
        )
        .await
        .unwrap();
    assert!(result.is_error);
    assert_eq!(result.output_text(), "unknown tool: add");
}

#[derive(Default)]
struct CountingObserver {
    invoking: AtomicUsize,
    failed: AtomicUsize,
    completed: AtomicUsize,
    order: Mutex<Vec<&'static str>>,
}

impl ExecutionObserver for CountingObserver {
    fn on_invoking(&self, _call: &ToolCall) {
        self.invoking.fetch_add(1, Ordering::SeqCst);
        self.order.lock().unwrap().push("invoking");
    }
    fn on_failed(&self, _call: &ToolCall, _error: &Error) {
        self.failed.fetch_add(1, Ordering::SeqCst);
        self.order.lock().unwrap().push("failed");
    }
    fn on_completed(&self, _call: &ToolCall, _result: &ToolResult) {
        self.completed.fetch_add(1, Ordering::SeqCst);
        self.order.lock().unwrap().push("completed");
    }
}

#[tokio::test]
async fn test_observer_exactly_once_and_exclusive() {
    let registry = build_registry();
    let executor = ToolExecutor::new(registry);
    let observer = Arc::new(CountingObserver::default());
    executor.subscribe(observer.clone());

    executor
        .dispatch(
            ToolCall::new("add", json!({"a": 1, "b": 2})),
            CancellationToken::new(),
        )
        .await
        .unwrap();
    executor
        .dispatch(
            ToolCall::new("nope", json!({})),
            CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(observer.invoking.load(Ordering::SeqCst), 1);
    assert_eq!(observer.completed.load(Ordering::SeqCst), 1);
    assert_eq!(observer.failed.load(Ordering::SeqCst), 1);
    assert_eq!(
        *observer.order.lock().unwrap(),
        vec!["invoking", "completed", "failed"]
    );
}

struct MathTools;

impl ToolSet for MathTools {
    fn tools(&self) -> Vec<ToolSpec> {
        vec![
            ToolSpec::new("math.square", "Square an integer")
                .param(ParamSpec::new("n", TypeDesc::Integer))
                .handler(|args: BoundArgs| async move {
                    let n = args.json(0)?.as_i64().unwrap_or(0);
                    Ok(json!(n * n))
                }),
            // Unbridgeable member: skipped, reported, batch continues.
            ToolSpec::new("math.raw", "Raw pointer access")
                .param(ParamSpec::new(
                    "ptr",
                    TypeDesc::Unsupported("pointer-like parameter".to_string()),
                ))
                .handler(|_args: BoundArgs| async move { Ok(Value::Null) }),
        ]
    }
}

#[tokio::test]
async fn test_bulk_registration_reports_skips() {
    let registry = Arc::new(ToolRegistry::new());
    let report = registry.register_set(&MathTools);

    assert_eq!(report.registered, vec!["math.square".to_string()]);
    assert_eq!(report.skipped.len(), 1);
    assert!(registry.contains("math.square"));
    assert!(!registry.contains("math.raw"));

    let executor = ToolExecutor::new(registry);
    let result = executor
        .dispatch(
            ToolCall::new("math.square", json!({"n": 6})),
            CancellationToken::new(),
        )
        .await
        .unwrap();
    assert_eq!(result.output, json!(36));
}

#[test]
fn test_dedup_key_round_trip() {
    let a = ToolCall::new("Add", json!({"b": 1, "a": "x  y"}));
    let b = ToolCall::new("add", json!({"a": "x y", "b": 1}));
    assert_eq!(a.dedup_key(), b.dedup_key());
}
