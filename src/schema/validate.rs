//! Schema validation — aggregated, path-qualified error reporting.
//!
//! Validation sweeps the schema tree once, top to bottom, and collects every
//! error it finds instead of stopping at the first. Unknown keys are not
//! inspected; `additionalProperties: false` is informational for the LLM,
//! not enforced here.

use serde_json::Value;
use std::fmt;

use crate::schema::{SchemaKind, StructuralSchema};

// =============================================================================
// Issues
// =============================================================================

/// Classification of a single validation error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueKind {
    /// Value present but of the wrong kind (or outside an enum's values).
    TypeError,
    /// Required value absent (or JSON null).
    Missing,
}

/// One path-qualified validation error.
#[derive(Debug, Clone)]
pub struct ValidationIssue {
    /// Top-level parameter the error belongs to.
    pub parameter: String,
    /// Dotted/bracketed path from the parameter root, e.g. `user.tags[2]`.
    pub path: String,
    pub message: String,
    pub kind: IssueKind,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "parameter '{}': {}", self.parameter, self.message)
        } else {
            write!(f, "'{}': {}", self.path, self.message)
        }
    }
}

/// Aggregate of every issue found while validating one call's arguments.
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn new(issues: Vec<ValidationIssue>) -> Self {
        Self { issues }
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn len(&self) -> usize {
        self.issues.len()
    }

    /// Names of the offending top-level parameters, deduplicated in order.
    pub fn parameters(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for issue in &self.issues {
            if !names.contains(&issue.parameter.as_str()) {
                names.push(&issue.parameter);
            }
        }
        names
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self.issues.iter().map(|i| i.to_string()).collect();
        write!(f, "{}", rendered.join("; "))
    }
}

// =============================================================================
// Validation
// =============================================================================

fn join_path(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", parent, name)
    }
}

fn value_kind_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Validate a JSON value against a schema, aggregating every error found.
///
/// `parameter` is the top-level parameter the value belongs to; `path` is the
/// position of `value` relative to that parameter (empty at the root).
pub fn validate(
    schema: &StructuralSchema,
    value: &Value,
    parameter: &str,
    path: &str,
) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    check(schema, value, parameter, path, &mut issues);
    issues
}

fn check(
    schema: &StructuralSchema,
    value: &Value,
    parameter: &str,
    path: &str,
    issues: &mut Vec<ValidationIssue>,
) {
    match schema.kind {
        SchemaKind::String => {
            let Some(s) = value.as_str() else {
                type_error(schema, value, parameter, path, issues);
                return;
            };
            if let Some(allowed) = &schema.enum_values {
                if !allowed.iter().any(|v| v == s) {
                    issues.push(ValidationIssue {
                        parameter: parameter.to_string(),
                        path: path.to_string(),
                        message: format!(
                            "invalid value '{}', expected one of: {}",
                            s,
                            allowed.join(", ")
                        ),
                        kind: IssueKind::TypeError,
                    });
                }
            }
        }
        SchemaKind::Integer => {
            if !value.is_i64() && !value.is_u64() {
                type_error(schema, value, parameter, path, issues);
            }
        }
        SchemaKind::Number => {
            if !value.is_number() {
                type_error(schema, value, parameter, path, issues);
            }
        }
        SchemaKind::Boolean => {
            if !value.is_boolean() {
                type_error(schema, value, parameter, path, issues);
            }
        }
        SchemaKind::Array => {
            let Some(elements) = value.as_array() else {
                type_error(schema, value, parameter, path, issues);
                return;
            };
            if let Some(items) = &schema.items {
                for (i, element) in elements.iter().enumerate() {
                    let child_path = format!("{}[{}]", path, i);
                    check(items, element, parameter, &child_path, issues);
                }
            }
        }
        SchemaKind::Object => {
            let Some(map) = value.as_object() else {
                type_error(schema, value, parameter, path, issues);
                return;
            };
            for (name, child) in &schema.properties {
                let child_path = join_path(path, name);
                match map.get(name) {
                    // JSON null at a non-required position counts as absent.
                    None | Some(Value::Null) => {
                        if schema.is_required(name) {
                            issues.push(ValidationIssue {
                                parameter: parameter.to_string(),
                                path: child_path,
                                message: format!("missing required property '{}'", name),
                                kind: IssueKind::Missing,
                            });
                        }
                    }
                    Some(present) => check(child, present, parameter, &child_path, issues),
                }
            }
            // Keys not declared in the schema are deliberately not inspected.
        }
    }
}

fn type_error(
    schema: &StructuralSchema,
    value: &Value,
    parameter: &str,
    path: &str,
    issues: &mut Vec<ValidationIssue>,
) {
    issues.push(ValidationIssue {
        parameter: parameter.to_string(),
        path: path.to_string(),
        message: format!(
            "expected {}, got {}",
            schema.kind.as_str(),
            value_kind_name(value)
        ),
        kind: IssueKind::TypeError,
    });
}
