//! Tool registry — immutable tool definitions keyed by normalized name.
//!
//! A `ToolSpec` spells out a callable's signature once; registration derives
//! the parameter schemas and the root object schema from it and freezes the
//! result into a `ToolDef`. All type errors surface here, at registration
//! time, never at call time. Names are globally unique under case-insensitive
//! comparison.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::exec::BoundArgs;
use crate::schema::{SchemaEngine, StructuralSchema, TypeDesc};
use crate::types::{Error, Result, ToolName};

// =============================================================================
// Handler trait
// =============================================================================

/// Trait implemented by tool callables.
///
/// Handlers receive the bound argument list in declared parameter order and
/// return the success value or a failure that the pipeline will normalize.
#[async_trait]
pub trait ToolFn: Send + Sync {
    async fn call(&self, args: BoundArgs) -> Result<Value>;
}

#[async_trait]
impl<F, Fut> ToolFn for F
where
    F: Send + Sync + Fn(BoundArgs) -> Fut,
    Fut: Future<Output = Result<Value>> + Send,
{
    async fn call(&self, args: BoundArgs) -> Result<Value> {
        (self)(args).await
    }
}

// =============================================================================
// Parameter specs
// =============================================================================

/// A single declared parameter of a tool callable.
#[derive(Debug, Clone)]
pub struct ParamSpec {
    pub name: String,
    pub ty: TypeDesc,
    pub description: Option<String>,
    /// Default bound when the caller omits the parameter.
    pub default: Option<Value>,
}

impl ParamSpec {
    pub fn new(name: impl Into<String>, ty: TypeDesc) -> Self {
        Self {
            name: name.into(),
            ty,
            description: None,
            default: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    /// Required = no default and not optional-typed.
    pub fn is_required(&self) -> bool {
        self.default.is_none() && !self.ty.is_optional()
    }

    pub fn is_cancellation(&self) -> bool {
        self.ty.is_cancellation()
    }
}

/// Parameter frozen at registration: the spec plus its derived schema.
/// Cancellation slots carry no schema.
#[derive(Debug, Clone)]
pub struct ToolParam {
    spec: ParamSpec,
    schema: Option<StructuralSchema>,
}

impl ToolParam {
    pub fn spec(&self) -> &ParamSpec {
        &self.spec
    }

    pub fn schema(&self) -> Option<&StructuralSchema> {
        self.schema.as_ref()
    }
}

// =============================================================================
// Tool spec (builder)
// =============================================================================

/// Declarative description of a tool before registration.
pub struct ToolSpec {
    name: String,
    description: String,
    params: Vec<ParamSpec>,
    timeout: Option<Duration>,
    handler: Option<Arc<dyn ToolFn>>,
}

impl std::fmt::Debug for ToolSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolSpec")
            .field("name", &self.name)
            .field("params", &self.params)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl ToolSpec {
    /// Spec with an explicit name.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            params: Vec::new(),
            timeout: None,
            handler: None,
        }
    }

    /// Spec named after an owning type and method: `<owner>.<method>` in
    /// snake_case (e.g. `WeatherService`/`GetForecast` →
    /// `weather_service.get_forecast`). An explicit `ToolSpec::new` name
    /// always takes precedence over this derived form.
    pub fn for_method(
        owner: impl AsRef<str>,
        method: impl AsRef<str>,
        description: impl Into<String>,
    ) -> Self {
        let name = format!(
            "{}.{}",
            snake_case(owner.as_ref()),
            snake_case(method.as_ref())
        );
        Self::new(name, description)
    }

    pub fn param(mut self, param: ParamSpec) -> Self {
        self.params.push(param);
        self
    }

    /// Per-tool timeout overriding the executor's configured default.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn handler<H>(mut self, handler: H) -> Self
    where
        H: ToolFn + 'static,
    {
        self.handler = Some(Arc::new(handler));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Convert PascalCase/camelCase to snake_case.
fn snake_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 4);
    let mut prev_lower = false;
    for c in s.chars() {
        if c.is_uppercase() {
            if prev_lower {
                out.push('_');
            }
            out.extend(c.to_lowercase());
            prev_lower = false;
        } else {
            out.push(c);
            prev_lower = c.is_lowercase() || c.is_ascii_digit();
        }
    }
    out
}

// =============================================================================
// Tool definition
// =============================================================================

/// An immutable, registered tool. Owned exclusively by the registry.
pub struct ToolDef {
    name: ToolName,
    description: String,
    timeout: Option<Duration>,
    params: Vec<ToolParam>,
    schema: StructuralSchema,
    handler: Arc<dyn ToolFn>,
}

impl std::fmt::Debug for ToolDef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolDef")
            .field("name", &self.name)
            .field("params", &self.params)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl ToolDef {
    pub fn name(&self) -> &ToolName {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn params(&self) -> &[ToolParam] {
        &self.params
    }

    /// Root parameter schema (object kind).
    pub fn schema(&self) -> &StructuralSchema {
        &self.schema
    }

    pub fn handler(&self) -> &Arc<dyn ToolFn> {
        &self.handler
    }

    /// Generic export shape consumed by provider adapters:
    /// name, description, parameters (JSON Schema).
    pub fn descriptor_json(&self) -> Value {
        json!({
            "name": self.name.as_str(),
            "description": self.description,
            "parameters": self.schema.to_json(),
        })
    }

    /// One-line prompt rendering.
    ///
    /// Format: `- name(param: type, optional?: type): description`
    pub fn prompt_line(&self) -> String {
        let params: Vec<String> = self
            .params
            .iter()
            .filter(|p| !p.spec.is_cancellation())
            .map(|p| {
                let optional = if p.spec.is_required() { "" } else { "?" };
                format!("{}{}: {}", p.spec.name, optional, p.spec.ty.display_name())
            })
            .collect();
        format!(
            "- {}({}): {}",
            self.name.as_str(),
            params.join(", "),
            self.description
        )
    }
}

// =============================================================================
// Bulk registration
// =============================================================================

/// A bundle of tool specs registered together (the members of one service
/// object, typically).
pub trait ToolSet {
    fn tools(&self) -> Vec<ToolSpec>;
}

/// Outcome of a best-effort bulk registration.
///
/// Incompatible members are skipped rather than aborting the batch, but every
/// skip is recorded here instead of disappearing silently.
#[derive(Debug, Default)]
pub struct BulkReport {
    pub registered: Vec<String>,
    pub skipped: Vec<(String, Error)>,
}

impl BulkReport {
    pub fn all_registered(&self) -> bool {
        self.skipped.is_empty()
    }
}

// =============================================================================
// Registry
// =============================================================================

/// Shared, process-wide registry of tool definitions.
///
/// Safe under concurrent register/lookup/unregister; lookups are
/// case-insensitive on the normalized name key.
#[derive(Debug)]
pub struct ToolRegistry {
    engine: Arc<SchemaEngine>,
    tools: RwLock<HashMap<String, Arc<ToolDef>>>,
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::with_engine(Arc::new(SchemaEngine::new()))
    }

    /// Registry sharing an existing schema engine (and its cache).
    pub fn with_engine(engine: Arc<SchemaEngine>) -> Self {
        Self {
            engine,
            tools: RwLock::new(HashMap::new()),
        }
    }

    pub fn engine(&self) -> &Arc<SchemaEngine> {
        &self.engine
    }

    /// Register a tool from its spec.
    ///
    /// # Errors
    ///
    /// Fails on empty/duplicate names (case-insensitive; the error names the
    /// existing registration), missing handlers, duplicate parameter names,
    /// and parameter types that cannot be bridged to JSON. On failure the
    /// registry is unchanged.
    pub fn register(&self, spec: ToolSpec) -> Result<()> {
        let def = self.freeze(spec)?;
        let key = def.name.key();

        let mut tools = self.tools.write().expect("tool registry poisoned");
        if let Some(existing) = tools.get(&key) {
            return Err(Error::registration(format!(
                "tool '{}' conflicts with registered tool '{}'",
                def.name.as_str(),
                existing.name.as_str()
            )));
        }
        tracing::debug!("registered tool '{}'", def.name.as_str());
        tools.insert(key, Arc::new(def));
        Ok(())
    }

    /// Register every spec in a set, best-effort.
    ///
    /// Incompatible specs are skipped (with a warning) and reported; the
    /// batch never aborts.
    pub fn register_set(&self, set: &dyn ToolSet) -> BulkReport {
        let mut report = BulkReport::default();
        for spec in set.tools() {
            let name = spec.name().to_string();
            match self.register(spec) {
                Ok(()) => report.registered.push(name),
                Err(err) => {
                    tracing::warn!("skipping tool '{}': {}", name, err);
                    report.skipped.push((name, err));
                }
            }
        }
        report
    }

    /// Remove a tool by case-insensitive name. Returns whether it existed.
    pub fn unregister(&self, name: &str) -> bool {
        let mut tools = self.tools.write().expect("tool registry poisoned");
        tools.remove(&ToolName::normalize(name)).is_some()
    }

    /// Case-insensitive lookup.
    pub fn get(&self, name: &str) -> Option<Arc<ToolDef>> {
        let tools = self.tools.read().expect("tool registry poisoned");
        tools.get(&ToolName::normalize(name)).cloned()
    }

    /// Whether a name refers to a registered tool. Used by mention parsers
    /// to confirm a prospective tool call is real.
    pub fn contains(&self, name: &str) -> bool {
        self.tools
            .read()
            .map(|tools| tools.contains_key(&ToolName::normalize(name)))
            .unwrap_or(false)
    }

    /// All definitions, sorted by name. The schema-export surface.
    pub fn definitions(&self) -> Vec<Arc<ToolDef>> {
        let tools = self.tools.read().expect("tool registry poisoned");
        let mut defs: Vec<Arc<ToolDef>> = tools.values().cloned().collect();
        defs.sort_by(|a, b| a.name().key().cmp(&b.name().key()));
        defs
    }

    /// Formatted prompt section for LLM consumption.
    ///
    /// If `allowed` is Some, only those tools (case-insensitive) are listed.
    pub fn prompt_lines(&self, allowed: Option<&[String]>) -> String {
        let defs: Vec<Arc<ToolDef>> = match allowed {
            Some(names) => names.iter().filter_map(|n| self.get(n)).collect(),
            None => self.definitions(),
        };
        if defs.is_empty() {
            return String::new();
        }
        let mut lines = Vec::with_capacity(defs.len() + 1);
        lines.push("Available tools:".to_string());
        for def in defs {
            lines.push(def.prompt_line());
        }
        lines.join("\n")
    }

    /// Number of registered tools.
    pub fn len(&self) -> usize {
        self.tools
            .read()
            .map(|tools| tools.len())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Derive schemas and freeze a spec into an immutable definition.
    fn freeze(&self, spec: ToolSpec) -> Result<ToolDef> {
        let ToolSpec {
            name,
            description,
            params,
            timeout,
            handler,
        } = spec;

        let name = ToolName::from_string(name).map_err(Error::registration)?;
        let handler = handler.ok_or_else(|| {
            Error::registration(format!("tool '{}' has no handler", name.as_str()))
        })?;

        let mut seen = HashSet::new();
        for param in &params {
            if !seen.insert(param.name.clone()) {
                return Err(Error::registration(format!(
                    "tool '{}' declares parameter '{}' more than once",
                    name.as_str(),
                    param.name
                )));
            }
        }

        let mut frozen = Vec::with_capacity(params.len());
        let mut root = StructuralSchema::empty_object();
        // Informational for the LLM; the validator stays permissive of
        // unknown keys.
        root.additional = Some(crate::schema::AdditionalProps::Deny);
        for param in params {
            if param.is_cancellation() {
                frozen.push(ToolParam {
                    spec: param,
                    schema: None,
                });
                continue;
            }
            param.ty.check_bridgeable().map_err(|reason| {
                Error::registration(format!(
                    "tool '{}' parameter '{}' cannot be bridged to JSON: {}",
                    name.as_str(),
                    param.name,
                    reason
                ))
            })?;
            let mut schema = self.engine.schema_for(&param.ty)?;
            if let Some(desc) = &param.description {
                schema.description = Some(desc.clone());
            }
            if param.is_required() {
                root.required.push(param.name.clone());
            }
            root.properties.push((param.name.clone(), schema.clone()));
            frozen.push(ToolParam {
                spec: param,
                schema: Some(schema),
            });
        }

        Ok(ToolDef {
            name,
            description,
            timeout,
            params: frozen,
            schema: root,
            handler,
        })
    }
}
