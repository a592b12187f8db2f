//! Explicit type descriptors for tool parameters and record fields.
//!
//! Descriptors replace runtime reflection: a callable's signature is spelled
//! out once at registration time as a `TypeDesc` tree, so every shape the
//! schema engine must bridge to JSON is known before the first call.

use serde::{Deserialize, Serialize};

// =============================================================================
// Type descriptors
// =============================================================================

/// Descriptor for a single parameter or field type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeDesc {
    Bool,
    /// Any integer width.
    Integer,
    /// Floating point.
    Number,
    /// Fixed-point decimal (bridged as a JSON number).
    Decimal,
    String,
    /// Single character (bridged as a one-character string).
    Char,
    Uuid,
    /// Date-time (bridged as a string with `format="date-time"`).
    DateTime,
    /// Closed set of named values.
    Enumeration {
        name: String,
        variants: Vec<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
    /// Homogeneous ordered sequence.
    Array(Box<TypeDesc>),
    /// String-keyed map.
    Map(Box<TypeDesc>),
    /// Nullable/optional wrapper. Optionality is first-class here, not an
    /// annotation probe.
    Optional(Box<TypeDesc>),
    /// Reference to a named record registered with the schema engine.
    Object(String),
    /// Cancellation slot. Bound to the pipeline's cancellation signal,
    /// never filled from caller-supplied arguments.
    Cancellation,
    /// A shape that cannot be bridged to/from JSON (by-ref, pointer-like,
    /// open generic). Registration rejects signatures containing these.
    Unsupported(String),
}

impl TypeDesc {
    /// Whether this is a primitive/simple type (scalar on the wire).
    ///
    /// Simple parameters are excluded from the single-parameter wrapping
    /// heuristic in the binder.
    pub fn is_simple(&self) -> bool {
        match self {
            TypeDesc::Bool
            | TypeDesc::Integer
            | TypeDesc::Number
            | TypeDesc::Decimal
            | TypeDesc::String
            | TypeDesc::Char
            | TypeDesc::Uuid
            | TypeDesc::DateTime
            | TypeDesc::Enumeration { .. } => true,
            TypeDesc::Optional(inner) => inner.is_simple(),
            _ => false,
        }
    }

    /// Whether this descriptor is nullable/optional at the top level.
    pub fn is_optional(&self) -> bool {
        matches!(self, TypeDesc::Optional(_))
    }

    /// Whether this descriptor is the cancellation slot.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, TypeDesc::Cancellation)
    }

    /// Human-readable type name for prompt generation.
    pub fn display_name(&self) -> String {
        match self {
            TypeDesc::Bool => "boolean".to_string(),
            TypeDesc::Integer => "integer".to_string(),
            TypeDesc::Number | TypeDesc::Decimal => "number".to_string(),
            TypeDesc::String | TypeDesc::Char | TypeDesc::Uuid => "string".to_string(),
            TypeDesc::DateTime => "date-time".to_string(),
            TypeDesc::Enumeration { variants, .. } => {
                format!("enum({})", variants.join("|"))
            }
            TypeDesc::Array(inner) => format!("{}[]", inner.display_name()),
            TypeDesc::Map(value) => format!("map<string, {}>", value.display_name()),
            TypeDesc::Optional(inner) => format!("{}?", inner.display_name()),
            TypeDesc::Object(name) => name.clone(),
            TypeDesc::Cancellation => "cancellation".to_string(),
            TypeDesc::Unsupported(_) => "unsupported".to_string(),
        }
    }

    /// Check that the descriptor can be bridged to/from JSON.
    ///
    /// Returns the offending reason for `Unsupported` shapes anywhere in the
    /// tree. Named object references are resolved lazily by the engine and
    /// are always considered bridgeable here.
    pub fn check_bridgeable(&self) -> Result<(), String> {
        match self {
            TypeDesc::Unsupported(reason) => Err(reason.clone()),
            TypeDesc::Enumeration { variants, .. } if variants.is_empty() => {
                Err("enumeration has no variants".to_string())
            }
            TypeDesc::Array(inner) | TypeDesc::Map(inner) | TypeDesc::Optional(inner) => {
                inner.check_bridgeable()
            }
            _ => Ok(()),
        }
    }
}

// =============================================================================
// Field annotations
// =============================================================================

/// Validation-style constraints attached to a record field.
///
/// These are carried onto the field's schema node for the LLM's benefit;
/// the validator enforces kinds and required-ness, not these bounds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldConstraints {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    /// Explicit required-ness override (e.g. a `[Required]`-style marker on
    /// an otherwise optional field).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
}

impl FieldConstraints {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

// =============================================================================
// Record descriptors
// =============================================================================

/// A single field of a named record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDesc {
    pub name: String,
    pub ty: TypeDesc,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Field carries a default value, so it is not required.
    #[serde(default)]
    pub has_default: bool,
    /// Field is explicitly excluded from the schema.
    #[serde(default)]
    pub excluded: bool,
    #[serde(default, skip_serializing_if = "FieldConstraints::is_empty")]
    pub constraints: FieldConstraints,
}

impl FieldDesc {
    pub fn new(name: impl Into<String>, ty: TypeDesc) -> Self {
        Self {
            name: name.into(),
            ty,
            description: None,
            has_default: false,
            excluded: false,
            constraints: FieldConstraints::default(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_default(mut self) -> Self {
        self.has_default = true;
        self
    }

    pub fn excluded(mut self) -> Self {
        self.excluded = true;
        self
    }

    pub fn with_constraints(mut self, constraints: FieldConstraints) -> Self {
        self.constraints = constraints;
        self
    }

    /// Whether the field lands in the containing object's `required` set.
    pub fn is_required(&self) -> bool {
        if let Some(explicit) = self.constraints.required {
            return explicit;
        }
        !self.ty.is_optional() && !self.has_default
    }
}

/// A named record (structured object) descriptor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectDesc {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub fields: Vec<FieldDesc>,
}

impl ObjectDesc {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            fields: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn field(mut self, field: FieldDesc) -> Self {
        self.fields.push(field);
        self
    }
}
