//! Structural schemas — derivation, caching, validation.
//!
//! A `StructuralSchema` is the JSON-Schema-like description of a tool's
//! parameters that gets exported to providers and checked against untrusted
//! arguments. Schemas are derived once from explicit type descriptors at
//! registration time and memoized by the engine.

pub mod descriptor;
pub mod engine;
pub mod validate;

pub use descriptor::{FieldConstraints, FieldDesc, ObjectDesc, TypeDesc};
pub use engine::SchemaEngine;
pub use validate::{validate, IssueKind, ValidationIssue, ValidationReport};

use serde_json::{json, Map, Value};

// =============================================================================
// Schema kinds
// =============================================================================

/// Structural kind of a schema node.
///
/// Enumerations are represented as `String` nodes carrying `enum_values`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaKind {
    String,
    Integer,
    Number,
    Boolean,
    Array,
    Object,
}

impl SchemaKind {
    /// JSON Schema type keyword.
    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaKind::String => "string",
            SchemaKind::Integer => "integer",
            SchemaKind::Number => "number",
            SchemaKind::Boolean => "boolean",
            SchemaKind::Array => "array",
            SchemaKind::Object => "object",
        }
    }
}

// =============================================================================
// Additional properties
// =============================================================================

/// `additionalProperties` annotation for object nodes.
///
/// Informational for the LLM; the validator does not enforce it.
#[derive(Debug, Clone, PartialEq)]
pub enum AdditionalProps {
    /// String-keyed map: values follow the given schema.
    Schema(Box<StructuralSchema>),
    /// Closed object: no extra keys expected.
    Deny,
}

// =============================================================================
// Structural schema node
// =============================================================================

/// Recursive structural schema node.
#[derive(Debug, Clone, PartialEq)]
pub struct StructuralSchema {
    pub kind: SchemaKind,
    pub description: Option<String>,
    pub format: Option<String>,
    /// Ordered property list (object kind). Order is preserved so exported
    /// schemas read in declaration order.
    pub properties: Vec<(String, StructuralSchema)>,
    /// Names of required properties. Always a subset of `properties` keys.
    pub required: Vec<String>,
    /// Element schema (array kind; always present for arrays).
    pub items: Option<Box<StructuralSchema>>,
    pub additional: Option<AdditionalProps>,
    /// Allowed values for enumeration-backed string nodes.
    pub enum_values: Option<Vec<String>>,
    pub min_length: Option<u64>,
    pub max_length: Option<u64>,
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
    pub pattern: Option<String>,
}

impl StructuralSchema {
    /// Bare node of the given kind.
    pub fn of_kind(kind: SchemaKind) -> Self {
        Self {
            kind,
            description: None,
            format: None,
            properties: Vec::new(),
            required: Vec::new(),
            items: None,
            additional: None,
            enum_values: None,
            min_length: None,
            max_length: None,
            minimum: None,
            maximum: None,
            pattern: None,
        }
    }

    pub fn string() -> Self {
        Self::of_kind(SchemaKind::String)
    }

    pub fn integer() -> Self {
        Self::of_kind(SchemaKind::Integer)
    }

    pub fn number() -> Self {
        Self::of_kind(SchemaKind::Number)
    }

    pub fn boolean() -> Self {
        Self::of_kind(SchemaKind::Boolean)
    }

    /// Empty object schema (also the lossy fallback for cyclic records).
    pub fn empty_object() -> Self {
        Self::of_kind(SchemaKind::Object)
    }

    pub fn array_of(items: StructuralSchema) -> Self {
        let mut schema = Self::of_kind(SchemaKind::Array);
        schema.items = Some(Box::new(items));
        schema
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Look up a declared property by name.
    pub fn property(&self, name: &str) -> Option<&StructuralSchema> {
        self.properties
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, s)| s)
    }

    /// Whether a property name is in the required set.
    pub fn is_required(&self, name: &str) -> bool {
        self.required.iter().any(|r| r == name)
    }

    /// Check structural invariants: required ⊆ properties, arrays have items.
    pub fn check_invariants(&self) -> Result<(), String> {
        if self.kind == SchemaKind::Array && self.items.is_none() {
            return Err("array schema missing items".to_string());
        }
        for name in &self.required {
            if self.property(name).is_none() {
                return Err(format!("required name '{}' not in properties", name));
            }
        }
        for (_, child) in &self.properties {
            child.check_invariants()?;
        }
        if let Some(items) = &self.items {
            items.check_invariants()?;
        }
        Ok(())
    }

    /// Export to a JSON Schema value (the shape provider adapters consume).
    pub fn to_json(&self) -> Value {
        let mut node = Map::new();
        node.insert("type".to_string(), json!(self.kind.as_str()));
        if let Some(desc) = &self.description {
            node.insert("description".to_string(), json!(desc));
        }
        if let Some(format) = &self.format {
            node.insert("format".to_string(), json!(format));
        }
        if let Some(values) = &self.enum_values {
            node.insert("enum".to_string(), json!(values));
        }
        if !self.properties.is_empty() {
            let mut props = Map::new();
            for (name, child) in &self.properties {
                props.insert(name.clone(), child.to_json());
            }
            node.insert("properties".to_string(), Value::Object(props));
        }
        if !self.required.is_empty() {
            node.insert("required".to_string(), json!(self.required));
        }
        if let Some(items) = &self.items {
            node.insert("items".to_string(), items.to_json());
        }
        match &self.additional {
            Some(AdditionalProps::Schema(schema)) => {
                node.insert("additionalProperties".to_string(), schema.to_json());
            }
            Some(AdditionalProps::Deny) => {
                node.insert("additionalProperties".to_string(), json!(false));
            }
            None => {}
        }
        if let Some(n) = self.min_length {
            node.insert("minLength".to_string(), json!(n));
        }
        if let Some(n) = self.max_length {
            node.insert("maxLength".to_string(), json!(n));
        }
        if let Some(n) = self.minimum {
            node.insert("minimum".to_string(), json!(n));
        }
        if let Some(n) = self.maximum {
            node.insert("maximum".to_string(), json!(n));
        }
        if let Some(p) = &self.pattern {
            node.insert("pattern".to_string(), json!(p));
        }
        Value::Object(node)
    }
}
