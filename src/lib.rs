//! # Toolcast - Schema-Checked Tool Invocation Core
//!
//! Exposes arbitrary async callables to a calling agent (an LLM) as
//! invocable tools:
//! - Schema derivation from explicit type descriptors, with caching and a
//!   recursion guard for cyclic record graphs
//! - Aggregated, path-qualified argument validation
//! - A case-insensitive, concurrency-safe tool registry
//! - Positional argument binding with defaulting, single-parameter wrapping,
//!   and cancellation-token injection
//! - A cancellable, timeout-bounded execution pipeline with uniform error
//!   reporting — outcomes are always representable as text/JSON, never raw
//!   runtime panics or internal error types
//!
//! ## Data flow
//!
//! ```text
//!   ToolCall ──► Registry ──► Validator ──► Binder ──► Pipeline ──► ToolResult
//!              (lookup by    (schema       (ordered    (invoke +
//!               name)         check)        args)       cancel/timeout)
//! ```
//!
//! A single call executes once and returns once: no retries, no queuing, no
//! multi-step planning. Provider adapters consume only the registry's
//! schema-export surface and the executor's dispatch surface.

// Enforce strict safety at compile time
#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]
#![warn(rust_2018_idioms)]

// Re-export public API
pub mod call;
pub mod canonical;
pub mod exec;
pub mod registry;
pub mod schema;
pub mod types;

// Internal utilities
pub mod observability;

pub use call::{ToolCall, ToolResult};
pub use exec::{BoundArgs, ExecutionObserver, ToolExecutor};
pub use registry::{ParamSpec, ToolDef, ToolRegistry, ToolSet, ToolSpec};
pub use schema::{SchemaEngine, StructuralSchema, TypeDesc};
pub use types::{CallId, Config, Error, ExecutorConfig, ObservabilityConfig, Result, ToolName};
