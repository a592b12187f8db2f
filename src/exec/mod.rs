//! Execution — argument binding, the call pipeline, observer hooks.
//!
//! `bind` turns a JSON arguments object into an ordered argument list;
//! `ToolExecutor` drives one call through bind → invoke → await → normalize
//! under cooperative cancellation and an optional per-call timeout.

pub mod binder;
pub mod events;
pub mod pipeline;

pub use binder::{bind, Argument, BoundArgs};
pub use events::{ExecutionObserver, ObserverSet};
pub use pipeline::ToolExecutor;
