//! Core types for the toolcast crate.
//!
//! This module provides foundational types used throughout the system:
//! - **IDs**: Strongly-typed identifiers (CallId, ToolName)
//! - **Errors**: Application error types with thiserror derives
//! - **Config**: Executor and observability configuration

pub mod config;
pub mod errors;
pub mod ids;

pub use config::{Config, ExecutorConfig, ObservabilityConfig};
pub use errors::{Error, Result};
pub use ids::{CallId, ToolName};
